//! Integration tests for the LRU-K replacer

use std::sync::Arc;

use heapdb::buffer::{EvictionPolicy, LruKReplacer};
use heapdb::common::{PageId, Permissions, TableId, TransactionId, DEFAULT_LRUK_K};
use heapdb::storage::page::HeapPage;
use heapdb::tuple::{DataType, Schema};
use heapdb::Database;
use tempfile::NamedTempFile;

fn pid(n: u32) -> PageId {
    PageId::new(TableId::new(1), n)
}

#[test]
fn test_lru_k_eviction_order() {
    let replacer = LruKReplacer::new(2);
    let cached: Vec<_> = (0..5).map(pid).collect();

    for &page_id in &cached {
        replacer.record_access(page_id);
    }

    // Every page has one access (< k), so they leave in first-access order
    let mut remaining = cached.clone();
    for i in 0..5 {
        let victim = replacer.victim(&remaining).unwrap();
        assert_eq!(victim, pid(i));
        replacer.remove(victim);
        remaining.retain(|&p| p != victim);
    }
    assert_eq!(replacer.victim(&remaining), None);
}

#[test]
fn test_lru_k_respects_k_distance() {
    let replacer = LruKReplacer::new(2);

    // Page 0: two old accesses, page 1: two recent accesses
    replacer.record_access(pid(0));
    replacer.record_access(pid(0));
    replacer.record_access(pid(1));
    replacer.record_access(pid(1));

    assert_eq!(replacer.victim(&[pid(0), pid(1)]), Some(pid(0)));

    // Touch page 0 again: its 2nd most recent access is now newer than page 1's
    replacer.record_access(pid(0));
    replacer.record_access(pid(0));
    assert_eq!(replacer.victim(&[pid(0), pid(1)]), Some(pid(1)));
}

#[test]
fn test_lru_k_as_buffer_pool_policy() {
    let temp_file = NamedTempFile::new().unwrap();
    let db = Database::with_policy(2, Box::new(LruKReplacer::new(DEFAULT_LRUK_K)));
    let schema = Schema::from_types(&[DataType::Integer]).into();
    let table_id = db.create_table(temp_file.path(), schema, "t").unwrap();

    let file = db.catalog().get_database_file(table_id).unwrap();
    for page_no in 0..3 {
        let page_id = PageId::new(table_id, page_no);
        file.write_page(&HeapPage::empty(page_id, Arc::clone(file.schema()), file.page_size()))
            .unwrap();
    }

    let pool = db.buffer_pool();
    let tx = TransactionId::new();
    let fetch = |n: u32| {
        pool.fetch_page(tx, PageId::new(table_id, n), Permissions::ReadOnly)
            .unwrap();
    };

    // Page 0 reaches k accesses, page 1 does not
    fetch(0);
    fetch(0);
    fetch(1);

    fetch(2);
    assert!(pool.contains(PageId::new(table_id, 0)));
    assert!(!pool.contains(PageId::new(table_id, 1)));
    assert!(pool.contains(PageId::new(table_id, 2)));
}
