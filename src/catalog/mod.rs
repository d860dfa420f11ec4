//! In-memory table registry.
//!
//! The catalog maps table ids to the heap files that store them. The buffer
//! pool resolves every page id through it, so a table must be registered
//! before any of its pages are fetched.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::info;

use crate::common::{DbError, Result, TableId};
use crate::storage::disk::HeapFile;
use crate::tuple::Schema;

/// A registered table.
#[derive(Clone)]
pub struct TableInfo {
    pub name: String,
    pub file: Arc<HeapFile>,
}

/// Table registry keyed by table id.
#[derive(Default)]
pub struct Catalog {
    tables: RwLock<HashMap<TableId, TableInfo>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `file` under `name` and returns its table id.
    ///
    /// Registering a name that is already taken replaces the older table, and
    /// registering the same file again renames it.
    pub fn add_table(&self, file: Arc<HeapFile>, name: impl Into<String>) -> TableId {
        let name = name.into();
        let table_id = file.table_id();

        let mut tables = self.tables.write();
        tables.retain(|id, info| *id == table_id || info.name != name);
        info!(%table_id, table = %name, path = %file.path().display(), "registered table");
        tables.insert(table_id, TableInfo { name, file });
        table_id
    }

    /// Returns the heap file backing `table_id`.
    pub fn get_database_file(&self, table_id: TableId) -> Result<Arc<HeapFile>> {
        self.tables
            .read()
            .get(&table_id)
            .map(|info| Arc::clone(&info.file))
            .ok_or(DbError::TableNotFound(table_id))
    }

    pub fn get_schema(&self, table_id: TableId) -> Result<Arc<Schema>> {
        self.get_database_file(table_id)
            .map(|file| Arc::clone(file.schema()))
    }

    pub fn get_table_name(&self, table_id: TableId) -> Result<String> {
        self.tables
            .read()
            .get(&table_id)
            .map(|info| info.name.clone())
            .ok_or(DbError::TableNotFound(table_id))
    }

    /// Looks up a table id by name.
    pub fn table_id(&self, name: &str) -> Option<TableId> {
        self.tables
            .read()
            .iter()
            .find(|(_, info)| info.name == name)
            .map(|(id, _)| *id)
    }

    /// Returns the ids of all registered tables, in ascending order.
    pub fn table_ids(&self) -> Vec<TableId> {
        let mut ids: Vec<_> = self.tables.read().keys().copied().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.tables.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.read().is_empty()
    }
}
