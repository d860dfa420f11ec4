use std::sync::Arc;

use tracing::debug;

use crate::buffer::BufferPoolManager;
use crate::common::{DbError, Result, TableId, TransactionId};
use crate::tuple::{DataType, Schema, Tuple, Value};

use super::{Operator, OperatorState};

/// Affected-row count produced once by `Insert` and `Delete`.
///
/// The count row uses a single unnamed Integer column. `rearm` lets it be
/// produced again without recounting.
#[derive(Debug)]
pub(crate) struct CountRow {
    schema: Arc<Schema>,
    count: i32,
    emitted: bool,
}

impl CountRow {
    pub(crate) fn new() -> Self {
        Self {
            schema: Arc::new(Schema::from_types(&[DataType::Integer])),
            count: 0,
            emitted: false,
        }
    }

    pub(crate) fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub(crate) fn count(&self) -> i32 {
        self.count
    }

    /// Drains `child`, applying `apply` to every tuple, and arms the count
    /// row with the number of tuples applied.
    pub(crate) fn drain(
        &mut self,
        child: &mut dyn Operator,
        mut apply: impl FnMut(Tuple) -> Result<()>,
    ) -> Result<()> {
        self.count = 0;
        self.emitted = false;
        while child.has_next()? {
            apply(child.next()?)?;
            self.count += 1;
        }
        Ok(())
    }

    pub(crate) fn rearm(&mut self) {
        self.emitted = false;
    }

    /// Returns the count row the first time it is called after arming.
    pub(crate) fn take(&mut self) -> Option<Tuple> {
        if self.emitted {
            return None;
        }
        self.emitted = true;
        Some(Tuple::new(
            Arc::clone(&self.schema),
            vec![Value::Integer(self.count)],
        ))
    }
}

/// Inserts every child tuple into a table through the buffer pool.
///
/// The child is drained during `open`. The operator then produces a single
/// one-column row holding the number of inserted tuples.
pub struct Insert {
    state: OperatorState,
    pool: Arc<BufferPoolManager>,
    tx: TransactionId,
    table_id: TableId,
    child: Box<dyn Operator>,
    result: CountRow,
}

impl Insert {
    /// Fails with `SchemaMismatch` if the child's column types differ from
    /// the table's.
    pub fn new(
        pool: Arc<BufferPoolManager>,
        tx: TransactionId,
        child: Box<dyn Operator>,
        table_id: TableId,
    ) -> Result<Self> {
        let table_schema = pool.catalog().get_schema(table_id)?;
        if *table_schema != **child.schema() {
            return Err(DbError::SchemaMismatch {
                expected: table_schema.to_string(),
                found: child.schema().to_string(),
            });
        }

        Ok(Self {
            state: OperatorState::new(),
            pool,
            tx,
            table_id,
            child,
            result: CountRow::new(),
        })
    }
}

impl Operator for Insert {
    fn open(&mut self) -> Result<()> {
        self.child.open()?;

        let (pool, tx, table_id) = (&self.pool, self.tx, self.table_id);
        self.result.drain(self.child.as_mut(), |tuple| {
            pool.insert_tuple(tx, table_id, tuple).map(drop)
        })?;
        debug!(%table_id, %tx, count = self.result.count(), "insert drained child");

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
