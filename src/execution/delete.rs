use std::sync::Arc;

use tracing::debug;

use crate::buffer::BufferPoolManager;
use crate::common::{Result, TransactionId};
use crate::tuple::{Schema, Tuple};

use super::insert::CountRow;
use super::{Operator, OperatorState};

/// Deletes every child tuple through the buffer pool.
///
/// Child tuples must carry record ids, as those from a `SeqScan` do. The
/// child is drained during `open`; the operator then produces a single
/// one-column row holding the number of deleted tuples.
pub struct Delete {
    state: OperatorState,
    pool: Arc<BufferPoolManager>,
    tx: TransactionId,
    child: Box<dyn Operator>,
    result: CountRow,
}

impl Delete {
    pub fn new(pool: Arc<BufferPoolManager>, tx: TransactionId, child: Box<dyn Operator>) -> Self {
        Self {
            state: OperatorState::new(),
            pool,
            tx,
            child,
            result: CountRow::new(),
        }
    }
}

impl Operator for Delete {
    fn open(&mut self) -> Result<()> {
        self.child.open()?;

        let (pool, tx) = (&self.pool, self.tx);
        self.result
            .drain(self.child.as_mut(), |tuple| pool.delete_tuple(tx, &tuple).map(drop))?;
        debug!(%tx, count = self.result.count(), "delete drained child");

        self.state.open();
        Ok(())
    }

    fn close(&mut self) {
        self.child.close();
        self.state.close();
    }

    fn rewind(&mut self) -> Result<()> {
        self.state.rewind()?;
        self.result.rearm();
        Ok(())
    }

    fn schema(&self) -> &Arc<Schema> {
        self.result.schema()
    }

    fn fetch_next(&mut self) -> Result<Option<Tuple>> {
        Ok(self.result.take())
    }

    fn state(&mut self) -> &mut OperatorState {
        &mut self.state
    }
}
