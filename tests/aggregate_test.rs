//! Integration tests for the aggregate operator

use std::sync::Arc;

use heapdb::common::{DbError, TransactionId};
use heapdb::execution::{Aggregate, AggregateOp, Insert, Operator, SeqScan, ValuesScan};
use heapdb::tuple::{DataType, Schema, Tuple, TupleBuilder, Value};
use heapdb::Database;
use tempfile::NamedTempFile;

fn sale_schema() -> Arc<Schema> {
    Schema::builder()
        .column("region", DataType::Text)
        .column("amount", DataType::Integer)
        .build_arc()
}

fn sales(rows: &[(&str, i32)]) -> Box<dyn Operator> {
    let schema = sale_schema();
    let tuples = rows
        .iter()
        .map(|&(region, amount)| {
            TupleBuilder::new(schema.clone())
                .value(region)
                .value(amount)
                .build()
        })
        .collect();
    Box::new(ValuesScan::new(schema, tuples))
}

fn run(mut op: Aggregate) -> Vec<Vec<Value>> {
    op.open().unwrap();
    let mut out = Vec::new();
    while op.has_next().unwrap() {
        out.push(op.next().unwrap().values().to_vec());
    }
    op.close();
    out
}

#[test]
fn test_ungrouped_sum() {
    let agg = Aggregate::new(
        sales(&[("a", 3), ("b", 5), ("c", -2)]),
        1,
        None,
        AggregateOp::Sum,
    )
    .unwrap();
    assert_eq!(run(agg), vec![vec![Value::Integer(6)]]);
}

#[test]
fn test_grouped_avg_truncates() {
    let agg = Aggregate::new(sales(&[("a", 1), ("a", 2)]), 1, Some(0), AggregateOp::Avg).unwrap();
    assert_eq!(run(agg), vec![vec![Value::from("a"), Value::Integer(1)]]);
}

#[test]
fn test_grouped_count_first_seen_order() {
    let agg = Aggregate::new(
        sales(&[("x", 10), ("x", 20), ("y", 30)]),
        1,
        Some(0),
        AggregateOp::Count,
    )
    .unwrap();
    assert_eq!(
        run(agg),
        vec![
            vec![Value::from("x"), Value::Integer(2)],
            vec![Value::from("y"), Value::Integer(1)],
        ]
    );
}

#[test]
fn test_zero_rows_yield_zero_results() {
    for group in [None, Some(0)] {
        let agg = Aggregate::new(sales(&[]), 1, group, AggregateOp::Count).unwrap();
        assert!(run(agg).is_empty());
    }
}

#[test]
fn test_grouped_max_one_row_per_key() {
    let agg = Aggregate::new(
        sales(&[("b", 1), ("a", 1), ("c", 1)]),
        1,
        Some(0),
        AggregateOp::Max,
    )
    .unwrap();
    assert_eq!(
        run(agg),
        vec![
            vec![Value::from("b"), Value::Integer(1)],
            vec![Value::from("a"), Value::Integer(1)],
            vec![Value::from("c"), Value::Integer(1)],
        ]
    );
}

#[test]
fn test_text_min_grouped_by_amount() {
    let agg = Aggregate::new(
        sales(&[("north", 1), ("east", 1), ("south", 2)]),
        0,
        Some(1),
        AggregateOp::Min,
    )
    .unwrap();
    assert_eq!(agg.schema().field_name(0), Some("amount"));
    assert_eq!(agg.schema().field_name(1), Some("MIN(region)"));
    assert_eq!(
        run(agg),
        vec![
            vec![Value::Integer(1), Value::from("east")],
            vec![Value::Integer(2), Value::from("south")],
        ]
    );
}

#[test]
fn test_text_avg_unsupported() {
    assert!(matches!(
        Aggregate::new(sales(&[]), 0, None, AggregateOp::Avg),
        Err(DbError::UnsupportedOperator { .. })
    ));
}

#[test]
fn test_aggregate_over_table_scan() {
    let temp_file = NamedTempFile::new().unwrap();
    let db = Database::new(8);
    let table_id = db
        .create_table(temp_file.path(), sale_schema(), "sales")
        .unwrap();
    let tx = TransactionId::new();

    let rows: Vec<Tuple> = (1..=100)
        .map(|i| {
            let region = if i % 2 == 0 { "even" } else { "odd" };
            TupleBuilder::new(sale_schema()).value(region).value(i).build()
        })
        .collect();
    let child = Box::new(ValuesScan::new(sale_schema(), rows));
    let mut insert = Insert::new(db.buffer_pool().clone(), tx, child, table_id).unwrap();
    insert.open().unwrap();
    insert.close();

    let scan = SeqScan::with_table_name(db.buffer_pool().clone(), tx, table_id).unwrap();
    let agg = Aggregate::new(Box::new(scan), 1, Some(0), AggregateOp::Sum).unwrap();
    assert_eq!(agg.schema().field_name(0), Some("sales.region"));
    assert_eq!(agg.schema().field_name(1), Some("SUM(sales.amount)"));

    // odd: 1 + 3 + ... + 99 = 2500, even: 2 + 4 + ... + 100 = 2550
    assert_eq!(
        run(agg),
        vec![
            vec![Value::from("odd"), Value::Integer(2500)],
            vec![Value::from("even"), Value::Integer(2550)],
        ]
    );
}
