use std::sync::Arc;

use crate::buffer::BufferPoolManager;
use crate::common::{Result, TableId, TransactionId};
use crate::storage::disk::HeapFileIterator;
use crate::tuple::{Schema, Tuple};

use super::{Operator, OperatorState};

/// Reads every tuple of one table, in page then slot order.
///
/// Output columns are named `alias.column`. A missing alias and unnamed
/// columns both render as `null`.
pub struct SeqScan {
    state: OperatorState,
    table_id: TableId,
    table_name: String,
    alias: Option<String>,
    schema: Arc<Schema>,
    iter: HeapFileIterator,
}

impl SeqScan {
    pub fn new(
        pool: Arc<BufferPoolManager>,
        tx: TransactionId,
        table_id: TableId,
        alias: Option<&str>,
    ) -> Result<Self> {
        let catalog = Arc::clone(pool.catalog());
        let file = catalog.get_database_file(table_id)?;
        let table_name = catalog.get_table_name(table_id)?;
        let schema = Arc::new(file.schema().with_alias(alias));

        Ok(Self {
            state: OperatorState::new(),
            table_id,
            table_name,
            alias: alias.map(str::to_string),
            schema,
            iter: file.iter(pool, tx),
        })
    }

    /// Scans `table_id` using its catalog name as the alias.
    pub fn with_table_name(
        pool: Arc<BufferPoolManager>,
        tx: TransactionId,
        table_id: TableId,
    ) -> Result<Self> {
        let name = pool.catalog().get_table_name(table_id)?;
        Self::new(pool, tx, table_id, Some(name.as_str()))
    }

    pub fn table_id(&self) -> TableId {
        self.table_id
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }
}

impl Operator for SeqScan {
    fn open(&mut self) -> Result<()> {
        self.iter.open()?;
        self.state.open();
        Ok(())
    }

    fn close(&mut self) {
        self.iter.close();
        self.state.close();
    }

    fn rewind(&mut self) -> Result<()> {
        self.state.rewind()?;
        self.iter.rewind()
    }

    fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    fn fetch_next(&mut self) -> Result<Option<Tuple>> {
        if !self.iter.has_next()? {
            return Ok(None);
        }
        let stored = self.iter.next()?;
        let mut tuple = Tuple::new(Arc::clone(&self.schema), stored.values().to_vec());
        tuple.set_record_id(stored.record_id());
        Ok(Some(tuple))
    }

    fn state(&mut self) -> &mut OperatorState {
        &mut self.state
    }
}
