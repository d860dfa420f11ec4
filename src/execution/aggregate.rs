use std::sync::Arc;

use tracing::debug;

use crate::common::{DbError, Result};
use crate::tuple::{Column, DataType, Schema, Tuple};

use super::{
    AggregateOp, Aggregator, IntegerAggregator, Operator, OperatorState, StringAggregator,
    ValuesScan,
};

/// Computes one aggregate over one child column, optionally grouped by
/// another column.
///
/// The child is drained into the aggregator during `open`; the operator then
/// replays one row per group. Output columns are named after the group
/// column and `OP(aggregate column)`.
pub struct Aggregate {
    state: OperatorState,
    child: Box<dyn Operator>,
    agg_field: usize,
    group_field: Option<usize>,
    op: AggregateOp,
    aggregator: Box<dyn Aggregator>,
    schema: Arc<Schema>,
    results: ValuesScan,
}

impl Aggregate {
    /// Picks the integer or text aggregator from the type of `agg_field`.
    /// Fails with `FieldNotFound` for an out-of-range column and with
    /// `UnsupportedOperator` for SUM or AVG over Text.
    pub fn new(
        child: Box<dyn Operator>,
        agg_field: usize,
        group_field: Option<usize>,
        op: AggregateOp,
    ) -> Result<Self> {
        let child_schema = Arc::clone(child.schema());
        let field_type = |field: usize| {
            child_schema
                .field_type(field)
                .ok_or_else(|| DbError::FieldNotFound(format!("#{}", field)))
        };

        let agg_type = field_type(agg_field)?;
        let group_by = match group_field {
            Some(field) => Some((field, field_type(field)?)),
            None => None,
        };

        let aggregator: Box<dyn Aggregator> = match agg_type {
            DataType::Integer => Box::new(IntegerAggregator::new(group_by, agg_field, op)),
            DataType::Text => Box::new(StringAggregator::new(group_by, agg_field, op)?),
        };

        let result_schema = aggregator.schema();
        let mut columns = Vec::with_capacity(result_schema.len());
        if let Some(field) = group_field {
            let group_type = field_type(field)?;
            columns.push(match child_schema.field_name(field) {
                Some(name) => Column::new(name, group_type),
                None => Column::unnamed(group_type),
            });
        }
        let agg_name = child_schema.field_name(agg_field).unwrap_or("null");
        let agg_result_type = result_schema
            .field_type(result_schema.len() - 1)
            .unwrap_or(DataType::Integer);
        columns.push(Column::new(format!("{}({})", op, agg_name), agg_result_type));

        let schema = Arc::new(Schema::new(columns));
        Ok(Self {
            state: OperatorState::new(),
            child,
            agg_field,
            group_field,
            op,
            aggregator,
            results: ValuesScan::new(Arc::clone(&schema), Vec::new()),
            schema,
        })
    }

    /// Index of the grouping column, or None.
    pub fn group_field(&self) -> Option<usize> {
        self.group_field
    }

    pub fn group_field_name(&self) -> Option<&str> {
        self.group_field
            .and_then(|field| self.child.schema().field_name(field))
    }

    pub fn aggregate_field(&self) -> usize {
        self.agg_field
    }

    pub fn aggregate_field_name(&self) -> Option<&str> {
        self.child.schema().field_name(self.agg_field)
    }

    pub fn aggregate_op(&self) -> AggregateOp {
        self.op
    }
}

impl Operator for Aggregate {
    fn open(&mut self) -> Result<()> {
        self.child.open()?;

        self.aggregator.clear();
        let mut merged = 0usize;
        while self.child.has_next()? {
            let tuple = self.child.next()?;
            self.aggregator.merge_tuple_into_group(&tuple)?;
            merged += 1;
        }

        let rows: Vec<Tuple> = self
            .aggregator
            .results()
            .into_iter()
            .map(|row| Tuple::new(Arc::clone(&self.schema), row.values().to_vec()))
            .collect();
        debug!(op = %self.op, merged, groups = rows.len(), "aggregate drained child");

        self.results = ValuesScan::new(Arc::clone(&self.schema), rows);
        self.results.open()?;
        self.state.open();
        Ok(())
    }

    fn close(&mut self) {
        self.results.close();
        self.child.close();
        self.state.close();
    }

    fn rewind(&mut self) -> Result<()> {
        self.state.rewind()?;
        self.results.rewind()
    }

    fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    fn fetch_next(&mut self) -> Result<Option<Tuple>> {
        if self.results.has_next()? {
            Ok(Some(self.results.next()?))
        } else {
            Ok(None)
        }
    }

    fn state(&mut self) -> &mut OperatorState {
        &mut self.state
    }
}
