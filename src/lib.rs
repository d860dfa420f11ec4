//! Heapdb - page-cached heap storage and iterator-based query execution
//!
//! This crate provides the storage and execution core of a single-node
//! relational engine. Tables live in heap files on disk; a bounded buffer pool
//! caches their pages in memory; query operators pull tuples through the pool.
//!
//! # Architecture
//!
//! The system is organized into several layers:
//!
//! - **Tuple Model** (`tuple`): Typed values, schemas and rows
//!   - `Value`: Integer or bounded Text, compared with `CompareOp`
//!   - `Schema`: Ordered typed columns, equal when their types match
//!   - `Tuple`: One row, tagged with its `RecordId` once stored
//!
//! - **Storage Layer** (`storage`): Page layout and file I/O
//!   - `HeapPage`: Slot bitmap plus fixed-width tuple slots
//!   - `HeapFile`: One table's pages laid out back to back in a file
//!
//! - **Catalog** (`catalog`): Table id to heap file registry
//!
//! - **Buffer Pool** (`buffer`): Memory management for heap pages
//!   - `BufferPoolManager`: Fetch-or-load cache with dirty tracking
//!   - `EvictionPolicy`: Pluggable victim selection (`RandomEviction`,
//!     `LruKReplacer`)
//!
//! - **Execution** (`execution`): Pull-based operators
//!   - `SeqScan`, `Filter`, `Insert`, `Delete`, `Aggregate`, `ValuesScan`
//!   - `IntegerAggregator` / `StringAggregator`: Grouped aggregation
//!
//! # Example
//!
//! ```rust,no_run
//! use heapdb::common::TransactionId;
//! use heapdb::execution::{Aggregate, AggregateOp, Insert, Operator, SeqScan, ValuesScan};
//! use heapdb::tuple::{DataType, Schema, TupleBuilder};
//! use heapdb::Database;
//!
//! let db = Database::default();
//! let schema = Schema::builder()
//!     .column("id", DataType::Integer)
//!     .column("name", DataType::Text)
//!     .build_arc();
//! let table_id = db.create_table("users.dat", schema.clone(), "users").unwrap();
//!
//! // Insert two rows
//! let tx = TransactionId::new();
//! let rows = vec![
//!     TupleBuilder::new(schema.clone()).value(1).value("alice").build(),
//!     TupleBuilder::new(schema.clone()).value(2).value("bob").build(),
//! ];
//! let child = Box::new(ValuesScan::new(schema, rows));
//! let mut insert = Insert::new(db.buffer_pool().clone(), tx, child, table_id).unwrap();
//! insert.open().unwrap();
//! assert_eq!(insert.next().unwrap().to_string(), "2");
//!
//! // Count them back
//! let scan = SeqScan::new(db.buffer_pool().clone(), tx, table_id, Some("u")).unwrap();
//! let mut count = Aggregate::new(Box::new(scan), 0, None, AggregateOp::Count).unwrap();
//! count.open().unwrap();
//! assert_eq!(count.next().unwrap().to_string(), "2");
//!
//! db.buffer_pool().flush_all_pages().unwrap();
//! ```

pub mod buffer;
pub mod catalog;
pub mod common;
mod database;
pub mod execution;
pub mod storage;
pub mod tuple;

// Re-export commonly used types at the crate root
pub use common::{DbError, PageId, RecordId, Result, TableId, TransactionId};
pub use database::Database;
