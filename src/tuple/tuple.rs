use std::fmt;
use std::sync::Arc;

use crate::common::{DbError, RecordId, Result};

use super::{Schema, Value};

/// Represents a single row/tuple.
///
/// A tuple holds one value per column of its schema. Values can be replaced
/// in place without a type check; pages refuse to store a tuple whose values
/// don't match their column types (see [`Tuple::check_types`]). A tuple read
/// from a page carries the record id of the slot it came from, which is what
/// deletion uses to find it again.
///
/// ## Tuple Binary Format
///
/// Columns are serialized back to back in schema order, each at its type's
/// fixed width, so every tuple of a schema is exactly `schema.byte_size()`
/// bytes:
///
/// ```text
/// +-----------+-----------+-----+-----------+
/// | column 0  | column 1  | ... | column n  |
/// +-----------+-----------+-----+-----------+
/// ```
#[derive(Debug, Clone)]
pub struct Tuple {
    /// The schema defining the structure of this tuple
    schema: Arc<Schema>,

    /// The values for each column (in schema order)
    values: Vec<Value>,

    /// Where the tuple is stored, if it was read from or written to a page
    record_id: Option<RecordId>,
}

impl Tuple {
    /// Creates a new tuple with the given schema and values.
    ///
    /// # Panics
    /// Panics if the number of values doesn't match the schema column count.
    pub fn new(schema: Arc<Schema>, values: Vec<Value>) -> Self {
        assert_eq!(
            values.len(),
            schema.len(),
            "Value count must match schema column count"
        );
        Self {
            schema,
            values,
            record_id: None,
        }
    }

    /// Creates a tuple from raw bytes using the given schema.
    pub fn from_bytes(schema: Arc<Schema>, data: &[u8]) -> Option<Self> {
        let mut values = Vec::with_capacity(schema.len());
        let mut offset = 0;
        for col in schema.columns() {
            let (value, size) = Value::deserialize(data.get(offset..)?, col.data_type())?;
            values.push(value);
            offset += size;
        }
        Some(Self {
            schema,
            values,
            record_id: None,
        })
    }

    /// Returns the schema of this tuple.
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Returns the value at the given column index.
    pub fn value(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Returns all values in this tuple.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Sets the value at the given column index. No type check is performed.
    pub fn set_value(&mut self, index: usize, value: Value) -> bool {
        if index < self.values.len() {
            self.values[index] = value;
            true
        } else {
            false
        }
    }

    /// Fails with `TypeMismatch` if any value's type differs from its
    /// column's.
    pub fn check_types(&self) -> Result<()> {
        for (value, column) in self.values.iter().zip(self.schema.columns()) {
            if value.data_type() != column.data_type() {
                return Err(DbError::TypeMismatch {
                    expected: column.data_type().to_string(),
                    found: value.data_type().to_string(),
                });
            }
        }
        Ok(())
    }

    /// Returns the record id of the slot this tuple is stored in.
    pub fn record_id(&self) -> Option<RecordId> {
        self.record_id
    }

    pub fn set_record_id(&mut self, record_id: Option<RecordId>) {
        self.record_id = record_id;
    }

    /// Returns the number of columns/values in this tuple.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if this tuple has no columns.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Serializes the tuple to its fixed-width byte image.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.schema.byte_size());
        for value in &self.values {
            value.serialize_into(&mut bytes);
        }
        bytes
    }
}

impl PartialEq for Tuple {
    fn eq(&self, other: &Self) -> bool {
        self.schema == other.schema && self.values == other.values
    }
}

impl Eq for Tuple {}

impl fmt::Display for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, value) in self.values.iter().enumerate() {
            if i > 0 {
                write!(f, "\t")?;
            }
            write!(f, "{}", value)?;
        }
        Ok(())
    }
}

/// Builder for constructing tuples fluently.
pub struct TupleBuilder {
    schema: Arc<Schema>,
    values: Vec<Value>,
}

impl TupleBuilder {
    /// Creates a new tuple builder for the given schema.
    pub fn new(schema: Arc<Schema>) -> Self {
        let count = schema.len();
        Self {
            schema,
            values: Vec::with_capacity(count),
        }
    }

    /// Appends the next value.
    pub fn value(mut self, value: impl Into<Value>) -> Self {
        self.values.push(value.into());
        self
    }

    /// Builds the tuple.
    ///
    /// # Panics
    /// Panics if fewer or more values were supplied than the schema has columns.
    pub fn build(self) -> Tuple {
        Tuple::new(self.schema, self.values)
    }
}
