use std::sync::Arc;

use crate::common::Result;
use crate::tuple::{Schema, Tuple};

use super::{Operator, OperatorState, Predicate};

/// Passes through the child tuples that satisfy a predicate.
pub struct Filter {
    state: OperatorState,
    predicate: Predicate,
    child: Box<dyn Operator>,
}

impl Filter {
    pub fn new(predicate: Predicate, child: Box<dyn Operator>) -> Self {
        Self {
            state: OperatorState::new(),
            predicate,
            child,
        }
    }

    pub fn predicate(&self) -> &Predicate {
        &self.predicate
    }
}

impl Operator for Filter {
    fn open(&mut self) -> Result<()> {
        self.child.open()?;
        self.state.open();
        Ok(())
    }

    fn close(&mut self) {
        self.child.close();
        self.state.close();
    }

    fn rewind(&mut self) -> Result<()> {
        self.state.rewind()?;
        self.child.rewind()
    }

    fn schema(&self) -> &Arc<Schema> {
        self.child.schema()
    }

    fn fetch_next(&mut self) -> Result<Option<Tuple>> {
        while self.child.has_next()? {
            let tuple = self.child.next()?;
            if self.predicate.filter(&tuple)? {
                return Ok(Some(tuple));
            }
        }
        Ok(None)
    }

    fn state(&mut self) -> &mut OperatorState {
        &mut self.state
    }
}
