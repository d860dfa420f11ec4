use std::fmt;

use crate::common::STRING_LEN;

/// Represents the data types supported by the database.
/// Every type has a fixed on-page width so tuples of a schema are fixed size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    /// 32-bit signed integer: 4 bytes, little-endian
    Integer,

    /// Bounded string: 4-byte length prefix + STRING_LEN bytes, zero-padded
    Text,
}

impl DataType {
    /// Returns the size in bytes a value of this type occupies on a page.
    pub fn width(&self) -> usize {
        match self {
            DataType::Integer => 4,
            DataType::Text => 4 + STRING_LEN,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Integer => write!(f, "INTEGER"),
            DataType::Text => write!(f, "TEXT"),
        }
    }
}
