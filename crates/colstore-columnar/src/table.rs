#![forbid(unsafe_code)]

use crate::error::{ColumnarError, ColumnarResult};
use crate::infer::{self, DEFAULT_SAMPLE_ROWS};
use crate::types::{ColumnType, Value};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Clone, Debug, PartialEq)]
pub struct ColumnSchema {
    pub name: String,
    pub column_type: ColumnType,
}

/// Field names become column file names, so they must be non-empty and free of path
/// separators.
pub fn validate_field_name(name: &str) -> ColumnarResult<()> {
    if name.trim().is_empty() || name.contains(['/', '\\', '\0']) {
        return Err(ColumnarError::InvalidFieldName(name.to_string()));
    }
    Ok(())
}

/// Options used when turning raw column text into typed columns.
#[derive(Debug, Clone, Copy)]
pub struct LoadOptions {
    /// Number of non-empty values sampled for type inference.
    pub sample_rows: usize,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            sample_rows: DEFAULT_SAMPLE_ROWS,
        }
    }
}

/// An ordered, fixed-length sequence of homogeneously typed values.
#[derive(Clone, Debug)]
pub struct Column {
    schema: ColumnSchema,
    values: Arc<[Value]>,
}

impl Column {
    pub fn new(name: impl Into<String>, column_type: ColumnType, values: Vec<Value>) -> Self {
        Self {
            schema: ColumnSchema {
                name: name.into(),
                column_type,
            },
            values: values.into(),
        }
    }

    /// Build a column from raw text, inferring its type from a sample.
    pub fn from_raw<S: AsRef<str>>(name: impl Into<String>, raw: &[S], options: LoadOptions) -> Self {
        let name = name.into();
        let (column_type, values, fallbacks) = infer::coerce_column(raw, options.sample_rows);
        if fallbacks > 0 {
            log::warn!(
                "column {name}: {fallbacks} value(s) did not coerce to {column_type} and are kept as text"
            );
        }
        Self::new(name, column_type, values)
    }

    pub fn name(&self) -> &str {
        &self.schema.name
    }

    pub fn column_type(&self) -> ColumnType {
        self.schema.column_type
    }

    pub fn schema(&self) -> &ColumnSchema {
        &self.schema
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, row: usize) -> Option<&Value> {
        self.values.get(row)
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Full materialization of the column. Shares the backing buffer.
    pub fn scan(&self) -> Arc<[Value]> {
        self.values.clone()
    }
}

/// A named set of equal-length columns.
///
/// Length agreement is checked once in [`Table::new`]; nothing downstream re-validates it.
#[derive(Clone, Debug)]
pub struct Table {
    name: String,
    columns: Vec<Column>,
    column_index: HashMap<String, usize>,
    rows: usize,
}

impl Table {
    pub fn new(name: impl Into<String>, columns: Vec<Column>) -> ColumnarResult<Self> {
        let name = name.into();
        let rows = columns.first().map(Column::len).unwrap_or(0);
        let mut column_index = HashMap::with_capacity(columns.len());

        for (idx, column) in columns.iter().enumerate() {
            validate_field_name(column.name())?;
            if column.len() != rows {
                return Err(ColumnarError::ColumnLengthMismatch {
                    table: name,
                    column: column.name().to_string(),
                    expected: rows,
                    actual: column.len(),
                });
            }
            if column_index.insert(column.name().to_string(), idx).is_some() {
                return Err(ColumnarError::DuplicateColumn {
                    table: name,
                    column: column.name().to_string(),
                });
            }
        }

        Ok(Self {
            name,
            columns,
            column_index,
            rows,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of rows; 0 for a table without columns.
    pub fn row_count(&self) -> usize {
        self.rows
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(Column::name).collect()
    }

    pub fn get(&self, field: &str) -> ColumnarResult<&Column> {
        self.column_index
            .get(field)
            .map(|&idx| &self.columns[idx])
            .ok_or_else(|| ColumnarError::FieldNotFound(field.to_string()))
    }

    /// Value at `row` of `field`, if both exist.
    pub fn value(&self, row: usize, field: &str) -> Option<&Value> {
        self.get(field).ok()?.get(row)
    }
}
