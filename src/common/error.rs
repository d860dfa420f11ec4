use thiserror::Error;

use super::types::{PageId, RecordId, TableId};

/// Database error types
#[derive(Error, Debug)]
pub enum DbError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    #[error("Field '{0}' not found")]
    FieldNotFound(String),

    #[error("Illegal state: {0}")]
    IllegalState(&'static str),

    #[error("No more tuples")]
    NoSuchElement,

    #[error("Buffer pool has no pages to evict")]
    OutOfPages,

    #[error("Aggregate {op} is not supported over {data_type}")]
    UnsupportedOperator { op: String, data_type: String },

    #[error("Schema mismatch: expected [{expected}], found [{found}]")]
    SchemaMismatch { expected: String, found: String },

    #[error("Table {0} not found")]
    TableNotFound(TableId),

    #[error("Page {0} is full")]
    PageFull(PageId),

    #[error("Tuple has no record id")]
    MissingRecordId,

    #[error("Tuple {0} is not stored on its page")]
    TupleNotOnPage(RecordId),

    #[error("Corrupted page {page_id}: {reason}")]
    CorruptedPage { page_id: PageId, reason: String },

    #[error("Invalid page size: expected {expected} bytes, got {actual} bytes")]
    InvalidPageSize { expected: usize, actual: usize },
}

pub type Result<T> = std::result::Result<T, DbError>;
