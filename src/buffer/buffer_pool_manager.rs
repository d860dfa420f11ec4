use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, trace, warn};

use crate::catalog::Catalog;
use crate::common::{DbError, PageId, Permissions, Result, TableId, TransactionId};
use crate::storage::page::PageRef;
use crate::tuple::Tuple;

use super::{EvictionPolicy, RandomEviction};

/// BufferPoolManager caches heap pages in memory, up to a fixed number of
/// pages. A miss loads the page from the heap file the catalog names for its
/// table, evicting one cached page first when the pool is full.
///
/// Pages are handed out as shared `PageRef`s. Dirty pages are written back
/// when they are evicted or flushed.
///
/// Lock order is page table, then page. Nothing here takes the page table
/// while holding a page lock, and callers must not either.
pub struct BufferPoolManager {
    /// Maximum number of cached pages
    capacity: usize,
    /// Page table: the cached pages
    pages: Mutex<HashMap<PageId, PageRef>>,
    /// Victim selection
    policy: Box<dyn EvictionPolicy>,
    /// Resolves table ids to heap files
    catalog: Arc<Catalog>,
}

impl BufferPoolManager {
    /// Creates a pool of `capacity` pages with random eviction.
    pub fn new(capacity: usize, catalog: Arc<Catalog>) -> Self {
        Self::with_policy(capacity, catalog, Box::new(RandomEviction::new()))
    }

    /// Creates a pool of `capacity` pages with the given eviction policy.
    pub fn with_policy(
        capacity: usize,
        catalog: Arc<Catalog>,
        policy: Box<dyn EvictionPolicy>,
    ) -> Self {
        Self {
            capacity,
            pages: Mutex::new(HashMap::new()),
            policy,
            catalog,
        }
    }

    /// Returns the page `page_id`, loading it from disk on a miss.
    ///
    /// `perm` is accepted for a future lock manager and is not enforced.
    pub fn fetch_page(
        &self,
        _tx: TransactionId,
        page_id: PageId,
        _perm: Permissions,
    ) -> Result<PageRef> {
        let mut pages = self.pages.lock();

        if let Some(page) = pages.get(&page_id) {
            self.policy.record_access(page_id);
            return Ok(Arc::clone(page));
        }

        let file = self.catalog.get_database_file(page_id.table_id)?;
        let page = Arc::new(RwLock::new(file.read_page(page_id)?));
        debug!(%page_id, "loaded page on cache miss");

        if pages.len() >= self.capacity {
            self.evict_locked(&mut pages)?;
        }
        pages.insert(page_id, Arc::clone(&page));
        self.policy.record_access(page_id);

        Ok(page)
    }

    /// Inserts `tuple` into table `table_id` on behalf of `tx`.
    ///
    /// Every page the heap file modified is marked dirty by `tx` and placed
    /// in the cache before this returns. Returns those pages.
    pub fn insert_tuple(
        &self,
        tx: TransactionId,
        table_id: TableId,
        tuple: Tuple,
    ) -> Result<Vec<PageRef>> {
        let file = self.catalog.get_database_file(table_id)?;
        let dirtied = file.insert_tuple(tx, tuple, self)?;
        self.cache_dirtied(tx, &dirtied)?;
        Ok(dirtied)
    }

    /// Deletes `tuple` from the page named by its record id, on behalf of `tx`.
    ///
    /// Same dirty-marking contract as [`insert_tuple`](Self::insert_tuple).
    pub fn delete_tuple(&self, tx: TransactionId, tuple: &Tuple) -> Result<Vec<PageRef>> {
        let record_id = tuple.record_id().ok_or(DbError::MissingRecordId)?;
        let file = self.catalog.get_database_file(record_id.page_id.table_id)?;
        let dirtied = file.delete_tuple(tx, tuple, self)?;
        self.cache_dirtied(tx, &dirtied)?;
        Ok(dirtied)
    }

    /// Marks pages dirty and (re)places them in the cache.
    fn cache_dirtied(&self, tx: TransactionId, dirtied: &[PageRef]) -> Result<()> {
        for page in dirtied {
            let page_id = {
                let mut guard = page.write();
                guard.mark_dirty(Some(tx));
                guard.page_id()
            };

            let mut pages = self.pages.lock();
            if !pages.contains_key(&page_id) && pages.len() >= self.capacity {
                self.evict_locked(&mut pages)?;
            }
            pages.insert(page_id, Arc::clone(page));
            self.policy.record_access(page_id);
        }
        Ok(())
    }

    /// Evicts one page chosen by the eviction policy, writing it back first
    /// if it is dirty. Fails with `OutOfPages` when the pool is empty.
    pub fn evict_page(&self) -> Result<()> {
        let mut pages = self.pages.lock();
        self.evict_locked(&mut pages)
    }

    fn evict_locked(&self, pages: &mut HashMap<PageId, PageRef>) -> Result<()> {
        let cached: Vec<PageId> = pages.keys().copied().collect();
        let victim = self.policy.victim(&cached).ok_or(DbError::OutOfPages)?;
        debug!(page_id = %victim, cached = cached.len(), "evicting page");

        if let Some(page) = pages.get(&victim) {
            // The page is dropped even if the write-back fails
            if let Err(err) = self.write_back(page) {
                warn!(page_id = %victim, error = %err, "failed to write back evicted page");
            }
        }

        pages.remove(&victim);
        self.policy.remove(victim);
        Ok(())
    }

    /// Writes `page` to its heap file if it is dirty, then marks it clean.
    fn write_back(&self, page: &PageRef) -> Result<()> {
        let mut guard = page.write();
        if !guard.is_dirty() {
            return Ok(());
        }

        let page_id = guard.page_id();
        let file = self.catalog.get_database_file(page_id.table_id)?;
        file.write_page(&guard)?;
        guard.mark_dirty(None);
        trace!(%page_id, "flushed page");
        Ok(())
    }

    /// Writes page `page_id` back if it is cached and dirty.
    /// Returns whether the page was cached.
    pub fn flush_page(&self, page_id: PageId) -> Result<bool> {
        let pages = self.pages.lock();
        match pages.get(&page_id) {
            Some(page) => {
                self.write_back(page)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Writes back every dirty cached page.
    pub fn flush_all_pages(&self) -> Result<()> {
        let pages = self.pages.lock();
        for page in pages.values() {
            self.write_back(page)?;
        }
        Ok(())
    }

    /// Writes back every cached page dirtied by `tx`.
    pub fn flush_pages(&self, tx: TransactionId) -> Result<()> {
        let pages = self.pages.lock();
        for page in pages.values() {
            if page.read().dirtied_by() == Some(tx) {
                self.write_back(page)?;
            }
        }
        Ok(())
    }

    /// Drops page `page_id` from the cache without writing it back.
    pub fn discard_page(&self, page_id: PageId) {
        if self.pages.lock().remove(&page_id).is_some() {
            self.policy.remove(page_id);
            debug!(%page_id, "discarded page");
        }
    }

    /// Lock manager hook. No locks are taken, so there is nothing to release.
    pub fn release_page(&self, tx: TransactionId, page_id: PageId) {
        trace!(%tx, %page_id, "release_page is a no-op");
    }

    /// Lock manager hook. Always false.
    pub fn holds_lock(&self, tx: TransactionId, page_id: PageId) -> bool {
        trace!(%tx, %page_id, "holds_lock is a no-op");
        false
    }

    /// Lock manager hook. Performs no rollback and releases nothing.
    pub fn transaction_complete(&self, tx: TransactionId, commit: bool) {
        trace!(%tx, commit, "transaction_complete is a no-op");
    }

    /// Returns the maximum number of cached pages.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of cached pages.
    pub fn len(&self) -> usize {
        self.pages.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.lock().is_empty()
    }

    /// Returns whether page `page_id` is cached.
    pub fn contains(&self, page_id: PageId) -> bool {
        self.pages.lock().contains_key(&page_id)
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }
}
