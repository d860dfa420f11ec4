use std::sync::Arc;

use crate::common::Result;
use crate::tuple::{Schema, Tuple};

use super::{Operator, OperatorState};

/// Produces a fixed list of in-memory tuples.
pub struct ValuesScan {
    state: OperatorState,
    schema: Arc<Schema>,
    tuples: Vec<Tuple>,
    cursor: usize,
}

impl ValuesScan {
    pub fn new(schema: Arc<Schema>, tuples: Vec<Tuple>) -> Self {
        Self {
            state: OperatorState::new(),
            schema,
            tuples,
            cursor: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.tuples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tuples.is_empty()
    }
}

impl Operator for ValuesScan {
    fn open(&mut self) -> Result<()> {
        self.cursor = 0;
        self.state.open();
        Ok(())
    }

    fn close(&mut self) {
        self.state.close();
    }

    fn rewind(&mut self) -> Result<()> {
        self.state.rewind()?;
        self.cursor = 0;
        Ok(())
    }

    fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    fn fetch_next(&mut self) -> Result<Option<Tuple>> {
        let tuple = self.tuples.get(self.cursor).cloned();
        if tuple.is_some() {
            self.cursor += 1;
        }
        Ok(tuple)
    }

    fn state(&mut self) -> &mut OperatorState {
        &mut self.state
    }
}
