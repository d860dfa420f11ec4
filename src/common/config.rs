use std::sync::atomic::{AtomicUsize, Ordering};

/// Default size of a page in bytes (4 KB)
pub const DEFAULT_PAGE_SIZE: usize = 4096;

/// Default buffer pool size (number of cached pages)
pub const DEFAULT_BUFFER_POOL_PAGES: usize = 50;

/// Maximum number of payload bytes stored for a Text value
pub const STRING_LEN: usize = 128;

/// Default K value for LRU-K replacement policy
pub const DEFAULT_LRUK_K: usize = 2;

static PAGE_SIZE: AtomicUsize = AtomicUsize::new(DEFAULT_PAGE_SIZE);

/// Returns the process-wide page size in bytes.
pub fn page_size() -> usize {
    PAGE_SIZE.load(Ordering::Acquire)
}

/// Overrides the page size. Only for test harnesses; files opened before the
/// call keep the size they were opened with.
#[doc(hidden)]
pub fn set_page_size(size: usize) {
    PAGE_SIZE.store(size, Ordering::Release);
}

/// Restores the default page size. Only for test harnesses.
#[doc(hidden)]
pub fn reset_page_size() {
    PAGE_SIZE.store(DEFAULT_PAGE_SIZE, Ordering::Release);
}
