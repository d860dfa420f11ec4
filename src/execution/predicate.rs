use std::fmt;

use crate::common::{DbError, Result};
use crate::tuple::{CompareOp, Tuple, Value};

/// Compares one column of a tuple against a constant.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    field: usize,
    op: CompareOp,
    operand: Value,
}

impl Predicate {
    pub fn new(field: usize, op: CompareOp, operand: impl Into<Value>) -> Self {
        Self {
            field,
            op,
            operand: operand.into(),
        }
    }

    pub fn field(&self) -> usize {
        self.field
    }

    pub fn op(&self) -> CompareOp {
        self.op
    }

    pub fn operand(&self) -> &Value {
        &self.operand
    }

    /// Evaluates `tuple[field] <op> operand`.
    pub fn filter(&self, tuple: &Tuple) -> Result<bool> {
        let value = tuple
            .value(self.field)
            .ok_or_else(|| DbError::FieldNotFound(format!("#{}", self.field)))?;
        value.compare(self.op, &self.operand)
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "f{} {} {}", self.field, self.op, self.operand)
    }
}
