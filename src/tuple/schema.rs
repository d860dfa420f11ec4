use std::fmt;
use std::sync::Arc;

use crate::common::{DbError, Result};

use super::DataType;

/// Represents a single column in a schema. Columns produced by aggregation
/// or built from bare types may be unnamed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    /// Column name
    name: Option<String>,

    /// Column data type
    data_type: DataType,
}

impl Column {
    /// Creates a new named column definition.
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: Some(name.into()),
            data_type,
        }
    }

    /// Creates a column without a name.
    pub fn unnamed(data_type: DataType) -> Self {
        Self {
            name: None,
            data_type,
        }
    }

    /// Returns the column name.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the column data type.
    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    /// Returns the on-page width of this column.
    pub fn width(&self) -> usize {
        self.data_type.width()
    }
}

/// Ordered, non-empty list of typed columns describing a row layout.
///
/// Equality is structural on types only: two schemas are equal when they
/// have the same number of columns with the same types in the same order,
/// whatever the column names.
#[derive(Debug, Clone)]
pub struct Schema {
    /// Ordered list of columns
    columns: Vec<Column>,

    /// Sum of column widths
    byte_size: usize,
}

impl Schema {
    /// Creates a new schema from a list of columns.
    ///
    /// # Panics
    /// Panics if `columns` is empty.
    pub fn new(columns: Vec<Column>) -> Self {
        assert!(!columns.is_empty(), "Schema must have at least one column");
        let byte_size = columns.iter().map(Column::width).sum();
        Self { columns, byte_size }
    }

    /// Creates a schema of unnamed columns.
    pub fn from_types(types: &[DataType]) -> Self {
        Self::new(types.iter().copied().map(Column::unnamed).collect())
    }

    /// Creates a schema builder for fluent construction.
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::new()
    }

    /// Returns the number of columns in the schema.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Always false; a schema has at least one column.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Returns the column at the given index.
    pub fn column(&self, index: usize) -> Option<&Column> {
        self.columns.get(index)
    }

    /// Returns the name of the column at `index`, if it has one.
    pub fn field_name(&self, index: usize) -> Option<&str> {
        self.columns.get(index).and_then(Column::name)
    }

    /// Returns the type of the column at `index`.
    pub fn field_type(&self, index: usize) -> Option<DataType> {
        self.columns.get(index).map(Column::data_type)
    }

    /// Returns the index of the first column named exactly `name`.
    pub fn field_index(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c.name() == Some(name))
            .ok_or_else(|| DbError::FieldNotFound(name.to_string()))
    }

    /// Returns an iterator over all columns.
    pub fn columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter()
    }

    /// Returns the size in bytes of one tuple of this schema.
    pub fn byte_size(&self) -> usize {
        self.byte_size
    }

    /// Concatenates two schemas, `a`'s columns first.
    pub fn merge(a: &Schema, b: &Schema) -> Schema {
        let mut columns = Vec::with_capacity(a.len() + b.len());
        columns.extend(a.columns.iter().cloned());
        columns.extend(b.columns.iter().cloned());
        Schema::new(columns)
    }

    /// Returns a copy whose column names are prefixed with `alias.`.
    /// A missing alias or column name is rendered as `null`.
    pub fn with_alias(&self, alias: Option<&str>) -> Schema {
        let prefix = alias.unwrap_or("null");
        let columns = self
            .columns
            .iter()
            .map(|c| {
                Column::new(
                    format!("{}.{}", prefix, c.name().unwrap_or("null")),
                    c.data_type(),
                )
            })
            .collect();
        Schema::new(columns)
    }
}

impl PartialEq for Schema {
    fn eq(&self, other: &Self) -> bool {
        self.columns.len() == other.columns.len()
            && self
                .columns
                .iter()
                .zip(other.columns.iter())
                .all(|(a, b)| a.data_type() == b.data_type())
    }
}

impl Eq for Schema {}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, col) in self.columns.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}({})", col.name().unwrap_or("null"), col.data_type())?;
        }
        Ok(())
    }
}

/// Builder for constructing schemas fluently.
pub struct SchemaBuilder {
    columns: Vec<Column>,
}

impl SchemaBuilder {
    /// Creates a new schema builder.
    pub fn new() -> Self {
        Self {
            columns: Vec::new(),
        }
    }

    /// Adds a named column.
    pub fn column(mut self, name: impl Into<String>, data_type: DataType) -> Self {
        self.columns.push(Column::new(name, data_type));
        self
    }

    /// Adds an unnamed column.
    pub fn unnamed(mut self, data_type: DataType) -> Self {
        self.columns.push(Column::unnamed(data_type));
        self
    }

    /// Builds the schema.
    pub fn build(self) -> Schema {
        Schema::new(self.columns)
    }

    /// Builds the schema wrapped in an Arc for shared ownership.
    pub fn build_arc(self) -> Arc<Schema> {
        Arc::new(self.build())
    }
}

impl Default for SchemaBuilder {
    fn default() -> Self {
        Self::new()
    }
}
