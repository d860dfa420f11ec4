use std::path::Path;
use std::sync::Arc;

use crate::buffer::{BufferPoolManager, EvictionPolicy};
use crate::catalog::Catalog;
use crate::common::{Result, TableId, DEFAULT_BUFFER_POOL_PAGES};
use crate::storage::disk::HeapFile;
use crate::tuple::Schema;

/// An engine instance: one catalog and one buffer pool over it.
///
/// Operators and heap files receive these handles explicitly; there is no
/// global engine state.
pub struct Database {
    catalog: Arc<Catalog>,
    buffer_pool: Arc<BufferPoolManager>,
}

impl Database {
    /// Creates an engine whose buffer pool caches `num_pages` pages and
    /// evicts at random.
    pub fn new(num_pages: usize) -> Self {
        let catalog = Arc::new(Catalog::new());
        let buffer_pool = Arc::new(BufferPoolManager::new(num_pages, Arc::clone(&catalog)));
        Self {
            catalog,
            buffer_pool,
        }
    }

    /// Creates an engine with a custom eviction policy.
    pub fn with_policy(num_pages: usize, policy: Box<dyn EvictionPolicy>) -> Self {
        let catalog = Arc::new(Catalog::new());
        let buffer_pool = Arc::new(BufferPoolManager::with_policy(
            num_pages,
            Arc::clone(&catalog),
            policy,
        ));
        Self {
            catalog,
            buffer_pool,
        }
    }

    /// Opens (or creates) the heap file at `path` and registers it as `name`.
    pub fn create_table<P: AsRef<Path>>(
        &self,
        path: P,
        schema: Arc<Schema>,
        name: &str,
    ) -> Result<TableId> {
        let file = Arc::new(HeapFile::open(path, schema)?);
        Ok(self.catalog.add_table(file, name))
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn buffer_pool(&self) -> &Arc<BufferPoolManager> {
        &self.buffer_pool
    }
}

impl Default for Database {
    fn default() -> Self {
        Self::new(DEFAULT_BUFFER_POOL_PAGES)
    }
}
