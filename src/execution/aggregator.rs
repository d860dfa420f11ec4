//! Incremental grouped aggregation.
//!
//! An aggregator folds tuples in one at a time and keeps one accumulator per
//! group, in the order groups were first seen. Group lookup is a linear scan;
//! aggregation here is expected to see few groups.

use std::fmt;
use std::sync::Arc;

use crate::common::{DbError, Result};
use crate::tuple::{Column, DataType, Schema, Tuple, Value};

/// Aggregate functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateOp {
    Min,
    Max,
    Sum,
    Avg,
    Count,
}

impl fmt::Display for AggregateOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AggregateOp::Min => "MIN",
            AggregateOp::Max => "MAX",
            AggregateOp::Sum => "SUM",
            AggregateOp::Avg => "AVG",
            AggregateOp::Count => "COUNT",
        };
        f.write_str(s)
    }
}

/// Folds tuples into per-group accumulators.
pub trait Aggregator {
    /// Merges one tuple into its group, creating the group on first sight.
    fn merge_tuple_into_group(&mut self, tuple: &Tuple) -> Result<()>;

    /// Layout of the result rows: `(group, aggregate)` when grouping,
    /// `(aggregate)` otherwise. Columns are unnamed.
    fn schema(&self) -> &Arc<Schema>;

    /// One row per group, in first-seen order. Empty until a tuple is merged.
    fn results(&self) -> Vec<Tuple>;

    /// Forgets every group.
    fn clear(&mut self);
}

/// Accumulator for one group
#[derive(Debug, Clone)]
struct Group {
    /// None when not grouping
    key: Option<Value>,
    count: i32,
    sum: i32,
    output: Value,
}

/// Group list shared by both aggregators
#[derive(Debug)]
struct Groups {
    group_field: Option<usize>,
    agg_field: usize,
    schema: Arc<Schema>,
    groups: Vec<Group>,
}

impl Groups {
    fn new(group_by: Option<(usize, DataType)>, agg_field: usize, result_type: DataType) -> Self {
        let mut columns = Vec::with_capacity(2);
        if let Some((_, group_type)) = group_by {
            columns.push(Column::unnamed(group_type));
        }
        columns.push(Column::unnamed(result_type));

        Self {
            group_field: group_by.map(|(field, _)| field),
            agg_field,
            schema: Arc::new(Schema::new(columns)),
            groups: Vec::new(),
        }
    }

    /// Extracts `(group key, aggregated value)` from `tuple`.
    fn extract<'a>(&self, tuple: &'a Tuple) -> Result<(Option<Value>, &'a Value)> {
        let key = match self.group_field {
            Some(field) => Some(
                tuple
                    .value(field)
                    .cloned()
                    .ok_or_else(|| DbError::FieldNotFound(format!("#{}", field)))?,
            ),
            None => None,
        };
        let value = tuple
            .value(self.agg_field)
            .ok_or_else(|| DbError::FieldNotFound(format!("#{}", self.agg_field)))?;
        Ok((key, value))
    }

    fn find_mut(&mut self, key: &Option<Value>) -> Option<&mut Group> {
        self.groups.iter_mut().find(|g| g.key == *key)
    }

    fn results(&self) -> Vec<Tuple> {
        self.groups
            .iter()
            .map(|g| {
                let mut values = Vec::with_capacity(2);
                values.extend(g.key.clone());
                values.push(g.output.clone());
                Tuple::new(Arc::clone(&self.schema), values)
            })
            .collect()
    }
}

fn expect_int(value: &Value) -> Result<i32> {
    value.as_int().ok_or_else(|| DbError::TypeMismatch {
        expected: DataType::Integer.to_string(),
        found: value.data_type().to_string(),
    })
}

/// Aggregates an Integer column. Supports every [`AggregateOp`].
///
/// Sums wrap on overflow. AVG is recomputed on every merge as
/// `sum / count`, truncating toward zero.
#[derive(Debug)]
pub struct IntegerAggregator {
    op: AggregateOp,
    groups: Groups,
}

impl IntegerAggregator {
    /// `group_by` is the grouping column index and type, or None.
    pub fn new(group_by: Option<(usize, DataType)>, agg_field: usize, op: AggregateOp) -> Self {
        Self {
            op,
            groups: Groups::new(group_by, agg_field, DataType::Integer),
        }
    }

    pub fn op(&self) -> AggregateOp {
        self.op
    }
}

impl Aggregator for IntegerAggregator {
    fn merge_tuple_into_group(&mut self, tuple: &Tuple) -> Result<()> {
        let (key, value) = self.groups.extract(tuple)?;
        let value = expect_int(value)?;
        let op = self.op;

        let Some(group) = self.groups.find_mut(&key) else {
            let output = match op {
                AggregateOp::Count => 1,
                _ => value,
            };
            self.groups.groups.push(Group {
                key,
                count: 1,
                sum: value,
                output: Value::Integer(output),
            });
            return Ok(());
        };

        group.count = group.count.wrapping_add(1);
        group.sum = group.sum.wrapping_add(value);
        let current = expect_int(&group.output)?;

        let output = match op {
            AggregateOp::Min => current.min(value),
            AggregateOp::Max => current.max(value),
            AggregateOp::Sum => current.wrapping_add(value),
            AggregateOp::Avg => group.sum.wrapping_div(group.count),
            AggregateOp::Count => group.count,
        };
        group.output = Value::Integer(output);
        Ok(())
    }

    fn schema(&self) -> &Arc<Schema> {
        &self.groups.schema
    }

    fn results(&self) -> Vec<Tuple> {
        self.groups.results()
    }

    fn clear(&mut self) {
        self.groups.groups.clear();
    }
}

/// Aggregates a Text column. Supports MIN, MAX and COUNT.
///
/// MIN and MAX compare strings lexicographically and produce Text; COUNT
/// produces Integer.
#[derive(Debug)]
pub struct StringAggregator {
    op: AggregateOp,
    groups: Groups,
}

impl StringAggregator {
    /// Fails with `UnsupportedOperator` for SUM and AVG.
    pub fn new(
        group_by: Option<(usize, DataType)>,
        agg_field: usize,
        op: AggregateOp,
    ) -> Result<Self> {
        let result_type = match op {
            AggregateOp::Min | AggregateOp::Max => DataType::Text,
            AggregateOp::Count => DataType::Integer,
            AggregateOp::Sum | AggregateOp::Avg => {
                return Err(DbError::UnsupportedOperator {
                    op: op.to_string(),
                    data_type: DataType::Text.to_string(),
                })
            }
        };

        Ok(Self {
            op,
            groups: Groups::new(group_by, agg_field, result_type),
        })
    }

    pub fn op(&self) -> AggregateOp {
        self.op
    }
}

impl Aggregator for StringAggregator {
    fn merge_tuple_into_group(&mut self, tuple: &Tuple) -> Result<()> {
        let (key, value) = self.groups.extract(tuple)?;
        let text = value.as_text().ok_or_else(|| DbError::TypeMismatch {
            expected: DataType::Text.to_string(),
            found: value.data_type().to_string(),
        })?;
        let op = self.op;

        let Some(group) = self.groups.find_mut(&key) else {
            let output = match op {
                AggregateOp::Count => Value::Integer(1),
                _ => Value::from(text),
            };
            self.groups.groups.push(Group {
                key,
                count: 1,
                sum: 0,
                output,
            });
            return Ok(());
        };

        group.count = group.count.wrapping_add(1);
        match op {
            AggregateOp::Count => group.output = Value::Integer(group.count),
            AggregateOp::Min => {
                if group.output.as_text().is_some_and(|current| text < current) {
                    group.output = Value::from(text);
                }
            }
            AggregateOp::Max => {
                if group.output.as_text().is_some_and(|current| text > current) {
                    group.output = Value::from(text);
                }
            }
            AggregateOp::Sum | AggregateOp::Avg => {}
        }
        Ok(())
    }

    fn schema(&self) -> &Arc<Schema> {
        &self.groups.schema
    }

    fn results(&self) -> Vec<Tuple> {
        self.groups.results()
    }

    fn clear(&mut self) {
        self.groups.groups.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuple::TupleBuilder;

    fn int_rows(rows: &[(&str, i32)]) -> Vec<Tuple> {
        let schema: Arc<Schema> = Schema::from_types(&[DataType::Text, DataType::Integer]).into();
        rows.iter()
            .map(|&(g, v)| TupleBuilder::new(schema.clone()).value(g).value(v).build())
            .collect()
    }

    fn run(agg: &mut dyn Aggregator, rows: &[Tuple]) -> Vec<Vec<Value>> {
        for row in rows {
            agg.merge_tuple_into_group(row).unwrap();
        }
        agg.results().iter().map(|t| t.values().to_vec()).collect()
    }

    #[test]
    fn test_ungrouped_sum() {
        let mut agg = IntegerAggregator::new(None, 1, AggregateOp::Sum);
        let out = run(&mut agg, &int_rows(&[("a", 3), ("b", 5), ("c", -2)]));
        assert_eq!(out, vec![vec![Value::Integer(6)]]);
    }

    #[test]
    fn test_grouped_avg_truncates() {
        let mut agg = IntegerAggregator::new(Some((0, DataType::Text)), 1, AggregateOp::Avg);
        let out = run(&mut agg, &int_rows(&[("a", 1), ("a", 2), ("b", -7), ("b", 2)]));
        assert_eq!(
            out,
            vec![
                vec![Value::from("a"), Value::Integer(1)],
                vec![Value::from("b"), Value::Integer(-2)],
            ]
        );
    }

    #[test]
    fn test_min_max_count() {
        let rows = int_rows(&[("a", 4), ("a", -1), ("a", 9)]);

        let mut min = IntegerAggregator::new(None, 1, AggregateOp::Min);
        assert_eq!(run(&mut min, &rows), vec![vec![Value::Integer(-1)]]);

        let mut max = IntegerAggregator::new(None, 1, AggregateOp::Max);
        assert_eq!(run(&mut max, &rows), vec![vec![Value::Integer(9)]]);

        let mut count = IntegerAggregator::new(None, 1, AggregateOp::Count);
        assert_eq!(run(&mut count, &rows), vec![vec![Value::Integer(3)]]);
    }

    #[test]
    fn test_sum_wraps() {
        let mut agg = IntegerAggregator::new(None, 1, AggregateOp::Sum);
        let out = run(&mut agg, &int_rows(&[("a", i32::MAX), ("a", 1)]));
        assert_eq!(out, vec![vec![Value::Integer(i32::MIN)]]);
    }

    #[test]
    fn test_no_rows_no_results() {
        let agg = IntegerAggregator::new(None, 1, AggregateOp::Count);
        assert!(agg.results().is_empty());
        let agg = IntegerAggregator::new(Some((0, DataType::Text)), 1, AggregateOp::Count);
        assert!(agg.results().is_empty());
    }

    #[test]
    fn test_result_schema() {
        let grouped = IntegerAggregator::new(Some((0, DataType::Text)), 1, AggregateOp::Sum);
        assert_eq!(
            **grouped.schema(),
            Schema::from_types(&[DataType::Text, DataType::Integer])
        );

        let ungrouped = StringAggregator::new(None, 0, AggregateOp::Max).unwrap();
        assert_eq!(**ungrouped.schema(), Schema::from_types(&[DataType::Text]));
    }

    #[test]
    fn test_integer_aggregator_rejects_text() {
        let mut agg = IntegerAggregator::new(None, 0, AggregateOp::Sum);
        let rows = int_rows(&[("a", 1)]);
        assert!(matches!(
            agg.merge_tuple_into_group(&rows[0]),
            Err(DbError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_string_aggregator_unsupported() {
        for op in [AggregateOp::Sum, AggregateOp::Avg] {
            assert!(matches!(
                StringAggregator::new(None, 0, op),
                Err(DbError::UnsupportedOperator { .. })
            ));
        }
    }

    #[test]
    fn test_string_count_grouped() {
        let mut agg =
            StringAggregator::new(Some((0, DataType::Text)), 0, AggregateOp::Count).unwrap();
        let out = run(&mut agg, &int_rows(&[("x", 0), ("x", 0), ("y", 0)]));
        assert_eq!(
            out,
            vec![
                vec![Value::from("x"), Value::Integer(2)],
                vec![Value::from("y"), Value::Integer(1)],
            ]
        );
    }

    #[test]
    fn test_string_min_max() {
        let rows = int_rows(&[("pear", 0), ("apple", 0), ("zucchini", 0)]);

        let mut min = StringAggregator::new(None, 0, AggregateOp::Min).unwrap();
        assert_eq!(run(&mut min, &rows), vec![vec![Value::from("apple")]]);

        let mut max = StringAggregator::new(None, 0, AggregateOp::Max).unwrap();
        assert_eq!(run(&mut max, &rows), vec![vec![Value::from("zucchini")]]);
    }

    #[test]
    fn test_clear() {
        let mut agg = IntegerAggregator::new(None, 1, AggregateOp::Count);
        run(&mut agg, &int_rows(&[("a", 1)]));
        agg.clear();
        assert!(agg.results().is_empty());
    }
}
