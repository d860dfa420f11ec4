use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::trace;

use crate::buffer::BufferPoolManager;
use crate::common::{
    page_size, DbError, PageId, Permissions, Result, TableId, TransactionId,
};
use crate::storage::page::{HeapPage, PageRef};
use crate::tuple::{Schema, Tuple};

/// HeapFile stores the pages of one table back to back in a single file:
/// page `k` occupies bytes `[k * page_size, (k + 1) * page_size)`.
///
/// Reads and writes go straight to disk. Tuple-level access (insert, delete,
/// scan) goes through the buffer pool so that every caller sees the cached
/// copy of a page.
pub struct HeapFile {
    /// The backing file
    file: Mutex<File>,
    /// Canonical path of the backing file
    path: PathBuf,
    /// Derived from the canonical path
    table_id: TableId,
    /// Layout of every tuple in the file
    schema: Arc<Schema>,
    /// Page size captured when the file was opened
    page_size: usize,
    /// Number of page reads performed
    num_reads: AtomicU32,
    /// Number of page writes performed
    num_writes: AtomicU32,
}

impl HeapFile {
    /// Opens the heap file at `path`, creating an empty one if it doesn't
    /// exist. The table id is a hash of the canonical path, so opening the
    /// same file twice yields the same id.
    pub fn open<P: AsRef<Path>>(path: P, schema: Arc<Schema>) -> Result<Self> {
        Self::open_with_page_size(path, schema, page_size())
    }

    /// Opens the heap file at `path` with an explicit page size.
    pub(crate) fn open_with_page_size<P: AsRef<Path>>(
        path: P,
        schema: Arc<Schema>,
        page_size: usize,
    ) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;

        let path = path.as_ref().canonicalize()?;
        let table_id = TableId::new(crc32fast::hash(path.to_string_lossy().as_bytes()));

        Ok(Self {
            file: Mutex::new(file),
            path,
            table_id,
            schema,
            page_size,
            num_reads: AtomicU32::new(0),
            num_writes: AtomicU32::new(0),
        })
    }

    pub fn table_id(&self) -> TableId {
        self.table_id
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Reads page `page_id` from disk. A page past the end of the file fails
    /// with an `UnexpectedEof` I/O error.
    pub fn read_page(&self, page_id: PageId) -> Result<HeapPage> {
        if page_id.table_id != self.table_id {
            return Err(DbError::TableNotFound(page_id.table_id));
        }

        let mut data = vec![0u8; self.page_size];
        {
            let mut file = self.file.lock();
            file.seek(SeekFrom::Start(page_id.offset(self.page_size)))?;
            file.read_exact(&mut data)?;
        }
        self.num_reads.fetch_add(1, Ordering::Relaxed);

        HeapPage::new(page_id, self.schema.clone(), &data)
    }

    /// Writes `page` back to its slot in the file, overwriting in place.
    pub fn write_page(&self, page: &HeapPage) -> Result<()> {
        let data = page.to_bytes();
        if data.len() != self.page_size {
            return Err(DbError::InvalidPageSize {
                expected: self.page_size,
                actual: data.len(),
            });
        }

        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(page.page_id().offset(self.page_size)))?;
        file.write_all(&data)?;
        file.flush()?;

        self.num_writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Returns the number of pages, counting a trailing partial page.
    pub fn num_pages(&self) -> Result<u32> {
        let len = self.file.lock().metadata()?.len();
        Ok(len.div_ceil(self.page_size as u64) as u32)
    }

    /// Appends an empty page image and returns its page number.
    fn append_empty_page(&self) -> Result<u32> {
        let mut file = self.file.lock();
        let len = file.metadata()?.len();
        let page_no = len.div_ceil(self.page_size as u64) as u32;

        file.seek(SeekFrom::Start(page_no as u64 * self.page_size as u64))?;
        file.write_all(&HeapPage::empty_page_data(self.page_size))?;
        file.flush()?;

        self.num_writes.fetch_add(1, Ordering::Relaxed);
        trace!(table_id = %self.table_id, page_no, "appended empty page");
        Ok(page_no)
    }

    /// Stores `tuple` in the first page with a free slot, appending a new
    /// page when every page is full. Returns the pages that were modified.
    pub fn insert_tuple(
        &self,
        tx: TransactionId,
        tuple: Tuple,
        pool: &BufferPoolManager,
    ) -> Result<Vec<PageRef>> {
        if **tuple.schema() != *self.schema {
            return Err(DbError::SchemaMismatch {
                expected: self.schema.to_string(),
                found: tuple.schema().to_string(),
            });
        }
        tuple.check_types()?;

        let num_pages = self.num_pages()?;
        if HeapPage::slots_per_page(self.page_size, self.schema.byte_size()) == 0 {
            return Err(DbError::PageFull(PageId::new(self.table_id, num_pages)));
        }

        for page_no in 0..num_pages {
            let page_id = PageId::new(self.table_id, page_no);
            let page = pool.fetch_page(tx, page_id, Permissions::ReadWrite)?;

            let mut guard = page.write();
            if guard.num_empty_slots() == 0 {
                continue;
            }
            guard.insert_tuple(tuple)?;
            drop(guard);
            return Ok(vec![page]);
        }

        let page_no = self.append_empty_page()?;
        let page = pool.fetch_page(
            tx,
            PageId::new(self.table_id, page_no),
            Permissions::ReadWrite,
        )?;
        page.write().insert_tuple(tuple)?;
        Ok(vec![page])
    }

    /// Removes `tuple` from the page named by its record id. Returns the
    /// modified page.
    pub fn delete_tuple(
        &self,
        tx: TransactionId,
        tuple: &Tuple,
        pool: &BufferPoolManager,
    ) -> Result<Vec<PageRef>> {
        let record_id = tuple.record_id().ok_or(DbError::MissingRecordId)?;
        if record_id.page_id.table_id != self.table_id {
            return Err(DbError::TupleNotOnPage(record_id));
        }

        let page = pool.fetch_page(tx, record_id.page_id, Permissions::ReadWrite)?;
        page.write().delete_tuple(tuple)?;
        Ok(vec![page])
    }

    /// Returns a cursor over every tuple in the file, in page then slot order.
    pub fn iter(self: &Arc<Self>, pool: Arc<BufferPoolManager>, tx: TransactionId) -> HeapFileIterator {
        HeapFileIterator::new(Arc::clone(self), pool, tx)
    }

    /// Returns the number of page reads performed.
    pub fn num_reads(&self) -> u32 {
        self.num_reads.load(Ordering::Relaxed)
    }

    /// Returns the number of page writes performed.
    pub fn num_writes(&self) -> u32 {
        self.num_writes.load(Ordering::Relaxed)
    }
}

/// Cursor over the tuples of a heap file.
///
/// Pages are fetched through the buffer pool one at a time, read-only.
/// The cursor holds only a page number and a slot number between calls, so
/// tuples deleted through the pool ahead of the cursor are not returned.
pub struct HeapFileIterator {
    file: Arc<HeapFile>,
    pool: Arc<BufferPoolManager>,
    tx: TransactionId,
    page_no: u32,
    slot: usize,
    /// Tuple found by `has_next` but not yet returned
    pending: Option<Tuple>,
    open: bool,
}

impl HeapFileIterator {
    fn new(file: Arc<HeapFile>, pool: Arc<BufferPoolManager>, tx: TransactionId) -> Self {
        Self {
            file,
            pool,
            tx,
            page_no: 0,
            slot: 0,
            pending: None,
            open: false,
        }
    }

    pub fn open(&mut self) -> Result<()> {
        self.page_no = 0;
        self.slot = 0;
        self.pending = None;
        self.open = true;
        Ok(())
    }

    pub fn has_next(&mut self) -> Result<bool> {
        if !self.open {
            return Err(DbError::IllegalState("heap file iterator is not open"));
        }
        if self.pending.is_none() {
            self.pending = self.advance()?;
        }
        Ok(self.pending.is_some())
    }

    pub fn next(&mut self) -> Result<Tuple> {
        if !self.has_next()? {
            return Err(DbError::NoSuchElement);
        }
        self.pending.take().ok_or(DbError::NoSuchElement)
    }

    /// Restarts from page 0.
    pub fn rewind(&mut self) -> Result<()> {
        if !self.open {
            return Err(DbError::IllegalState("heap file iterator is not open"));
        }
        self.close();
        self.open()
    }

    pub fn close(&mut self) {
        self.pending = None;
        self.open = false;
    }

    fn advance(&mut self) -> Result<Option<Tuple>> {
        loop {
            if self.page_no >= self.file.num_pages()? {
                return Ok(None);
            }

            let page_id = PageId::new(self.file.table_id(), self.page_no);
            let page = self.pool.fetch_page(self.tx, page_id, Permissions::ReadOnly)?;
            let guard = page.read();

            while self.slot < guard.num_slots() {
                let slot = self.slot;
                self.slot += 1;
                if let Some(tuple) = guard.tuple(slot) {
                    return Ok(Some(tuple.clone()));
                }
            }

            self.page_no += 1;
            self.slot = 0;
        }
    }
}
