//! Integration tests for the buffer pool manager

use std::sync::Arc;
use std::thread;

use heapdb::buffer::RandomEviction;
use heapdb::common::{DbError, PageId, Permissions, TableId, TransactionId};
use heapdb::execution::{Operator, SeqScan};
use heapdb::storage::disk::HeapFile;
use heapdb::storage::page::HeapPage;
use heapdb::tuple::{DataType, Schema, Tuple, TupleBuilder, Value};
use heapdb::Database;
use tempfile::NamedTempFile;

fn int_schema() -> Arc<Schema> {
    Schema::builder().column("v", DataType::Integer).build_arc()
}

fn create_db(capacity: usize) -> (Database, TableId, NamedTempFile) {
    let temp_file = NamedTempFile::new().unwrap();
    let db = Database::with_policy(capacity, Box::new(RandomEviction::with_seed(3)));
    let table_id = db.create_table(temp_file.path(), int_schema(), "t").unwrap();
    (db, table_id, temp_file)
}

fn file(db: &Database, table_id: TableId) -> Arc<HeapFile> {
    db.catalog().get_database_file(table_id).unwrap()
}

fn row(v: i32) -> Tuple {
    TupleBuilder::new(int_schema()).value(v).build()
}

/// Writes `n` empty pages straight to the file.
fn preallocate(file: &HeapFile, n: u32) {
    for page_no in 0..n {
        let page = HeapPage::empty(
            PageId::new(file.table_id(), page_no),
            file.schema().clone(),
            file.page_size(),
        );
        file.write_page(&page).unwrap();
    }
}

fn scan_values(db: &Database, table_id: TableId) -> Vec<i32> {
    let mut scan =
        SeqScan::new(db.buffer_pool().clone(), TransactionId::new(), table_id, None).unwrap();
    scan.open().unwrap();
    let mut out = Vec::new();
    while scan.has_next().unwrap() {
        out.push(scan.next().unwrap().value(0).and_then(Value::as_int).unwrap());
    }
    out
}

#[test]
fn test_buffer_pool_eviction_at_capacity_one() {
    let (db, table_id, _temp) = create_db(1);
    let file = file(&db, table_id);
    preallocate(&file, 2);

    let pool = db.buffer_pool();
    let tx = TransactionId::new();
    let page_a = PageId::new(table_id, 0);
    let page_b = PageId::new(table_id, 1);

    // Dirty page A
    let dirtied = pool.insert_tuple(tx, table_id, row(42)).unwrap();
    assert_eq!(dirtied[0].read().page_id(), page_a);
    assert!(pool.contains(page_a));

    // Fetching B must flush and drop A
    let writes_before = file.num_writes();
    pool.fetch_page(tx, page_b, Permissions::ReadOnly).unwrap();

    assert_eq!(pool.len(), 1);
    assert!(pool.contains(page_b));
    assert!(!pool.contains(page_a));
    assert_eq!(file.num_writes(), writes_before + 1);

    let on_disk = file.read_page(page_a).unwrap();
    let values: Vec<_> = on_disk.tuples().map(|t| t.value(0).cloned()).collect();
    assert_eq!(values, vec![Some(Value::Integer(42))]);
}

#[test]
fn test_buffer_pool_clean_eviction_does_not_write() {
    let (db, table_id, _temp) = create_db(1);
    let file = file(&db, table_id);
    preallocate(&file, 2);

    let pool = db.buffer_pool();
    let tx = TransactionId::new();
    pool.fetch_page(tx, PageId::new(table_id, 0), Permissions::ReadOnly)
        .unwrap();
    let writes_before = file.num_writes();

    pool.fetch_page(tx, PageId::new(table_id, 1), Permissions::ReadOnly)
        .unwrap();
    assert_eq!(file.num_writes(), writes_before);
}

#[test]
fn test_buffer_pool_flush_all_is_idempotent() {
    let (db, table_id, _temp) = create_db(10);
    let file = file(&db, table_id);
    let tx = TransactionId::new();

    for v in 0..10 {
        db.buffer_pool().insert_tuple(tx, table_id, row(v)).unwrap();
    }

    db.buffer_pool().flush_all_pages().unwrap();
    let writes = file.num_writes();
    let bytes = std::fs::read(file.path()).unwrap();

    db.buffer_pool().flush_all_pages().unwrap();
    assert_eq!(file.num_writes(), writes);
    assert_eq!(std::fs::read(file.path()).unwrap(), bytes);
}

#[test]
fn test_buffer_pool_persistence() {
    let temp_file = NamedTempFile::new().unwrap();
    {
        let db = Database::new(10);
        let table_id = db.create_table(temp_file.path(), int_schema(), "t").unwrap();
        let tx = TransactionId::new();
        for v in [7, 8, 9] {
            db.buffer_pool().insert_tuple(tx, table_id, row(v)).unwrap();
        }
        db.buffer_pool().flush_all_pages().unwrap();
    }

    let db = Database::new(10);
    let table_id = db.create_table(temp_file.path(), int_schema(), "t").unwrap();
    assert_eq!(scan_values(&db, table_id), vec![7, 8, 9]);
}

#[test]
fn test_buffer_pool_unflushed_changes_are_lost() {
    let temp_file = NamedTempFile::new().unwrap();
    {
        let db = Database::new(10);
        let table_id = db.create_table(temp_file.path(), int_schema(), "t").unwrap();
        db.buffer_pool()
            .insert_tuple(TransactionId::new(), table_id, row(1))
            .unwrap();
    }

    // The appended page reached disk empty
    let db = Database::new(10);
    let table_id = db.create_table(temp_file.path(), int_schema(), "t").unwrap();
    assert_eq!(file(&db, table_id).num_pages().unwrap(), 1);
    assert!(scan_values(&db, table_id).is_empty());
}

#[test]
fn test_buffer_pool_small_pool_large_workload() {
    let (db, table_id, _temp) = create_db(2);
    let tx = TransactionId::new();

    // 992 rows per page, so this spans three pages through a two-page pool
    for v in 0..2000 {
        db.buffer_pool().insert_tuple(tx, table_id, row(v)).unwrap();
        assert!(db.buffer_pool().len() <= 2);
    }
    assert_eq!(file(&db, table_id).num_pages().unwrap(), 3);

    let values = scan_values(&db, table_id);
    assert_eq!(values, (0..2000).collect::<Vec<_>>());
}

#[test]
fn test_buffer_pool_delete_through_pool() {
    let (db, table_id, _temp) = create_db(10);
    let tx = TransactionId::new();
    let pool = db.buffer_pool();

    for v in 0..3 {
        pool.insert_tuple(tx, table_id, row(v)).unwrap();
    }
    let page = pool
        .fetch_page(tx, PageId::new(table_id, 0), Permissions::ReadOnly)
        .unwrap();
    let middle = page.read().tuple(1).cloned().unwrap();

    let dirtied = pool.delete_tuple(tx, &middle).unwrap();
    assert_eq!(dirtied.len(), 1);
    assert_eq!(scan_values(&db, table_id), vec![0, 2]);

    assert!(matches!(
        pool.delete_tuple(tx, &middle),
        Err(DbError::TupleNotOnPage(_))
    ));
    assert!(matches!(
        pool.delete_tuple(tx, &row(0)),
        Err(DbError::MissingRecordId)
    ));
}

#[test]
fn test_buffer_pool_concurrent_inserts() {
    let (db, table_id, _temp) = create_db(10);
    let pool = db.buffer_pool().clone();

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let pool = Arc::clone(&pool);
            thread::spawn(move || {
                let tx = TransactionId::new();
                for i in 0..50 {
                    pool.insert_tuple(tx, table_id, row(t * 100 + i)).unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let mut values = scan_values(&db, table_id);
    values.sort();
    let mut expected: Vec<i32> = (0..4).flat_map(|t| (0..50).map(move |i| t * 100 + i)).collect();
    expected.sort();
    assert_eq!(values, expected);
}

#[test]
fn test_buffer_pool_concurrent_reads() {
    let (db, table_id, _temp) = create_db(10);
    let tx = TransactionId::new();
    db.buffer_pool().insert_tuple(tx, table_id, row(5)).unwrap();
    let pool = db.buffer_pool().clone();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let pool = Arc::clone(&pool);
            thread::spawn(move || {
                for _ in 0..100 {
                    let page_id = PageId::new(table_id, 0);
                    let page = pool
                        .fetch_page(TransactionId::new(), page_id, Permissions::ReadOnly)
                        .unwrap();
                    assert_eq!(page.read().tuples().count(), 1);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
}
