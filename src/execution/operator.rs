use std::sync::Arc;

use crate::common::{DbError, Result};
use crate::tuple::{Schema, Tuple};

/// Open flag and one-tuple lookahead shared by every operator.
#[derive(Debug, Default)]
pub struct OperatorState {
    open: bool,
    lookahead: Option<Tuple>,
}

impl OperatorState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Marks the operator open and drops any buffered tuple.
    pub fn open(&mut self) {
        self.open = true;
        self.lookahead = None;
    }

    pub fn close(&mut self) {
        self.open = false;
        self.lookahead = None;
    }

    /// Drops the buffered tuple. Fails unless open.
    pub fn rewind(&mut self) -> Result<()> {
        self.check_open()?;
        self.lookahead = None;
        Ok(())
    }

    pub fn check_open(&self) -> Result<()> {
        if self.open {
            Ok(())
        } else {
            Err(DbError::IllegalState("operator is not open"))
        }
    }
}

/// Pull-based query operator.
///
/// An operator starts closed. `open` makes it produce tuples through
/// `has_next`/`next`, `rewind` restarts production without closing, and
/// `close` returns it to the closed state. Calling `has_next`, `next` or
/// `rewind` on a closed operator fails with `IllegalState`; calling `next`
/// when `has_next` is false fails with `NoSuchElement`.
///
/// Implementors provide `fetch_next`, which returns the next tuple or `None`
/// at the end, and keep an [`OperatorState`] that their `open`, `close` and
/// `rewind` update. `has_next` and `next` are provided on top of those.
pub trait Operator {
    fn open(&mut self) -> Result<()>;

    fn close(&mut self);

    fn rewind(&mut self) -> Result<()>;

    /// Layout of the tuples this operator produces.
    fn schema(&self) -> &Arc<Schema>;

    /// Produces the next tuple, or `None` when exhausted.
    fn fetch_next(&mut self) -> Result<Option<Tuple>>;

    fn state(&mut self) -> &mut OperatorState;

    fn has_next(&mut self) -> Result<bool> {
        self.state().check_open()?;
        if self.state().lookahead.is_none() {
            let next = self.fetch_next()?;
            self.state().lookahead = next;
        }
        Ok(self.state().lookahead.is_some())
    }

    fn next(&mut self) -> Result<Tuple> {
        if !self.has_next()? {
            return Err(DbError::NoSuchElement);
        }
        self.state().lookahead.take().ok_or(DbError::NoSuchElement)
    }
}
