use std::path::PathBuf;

pub type ColumnarResult<T> = Result<T, ColumnarError>;

#[derive(Debug, thiserror::Error)]
pub enum ColumnarError {
    #[error("unknown field: {0}")]
    FieldNotFound(String),

    #[error("invalid field name: {0:?}")]
    InvalidFieldName(String),

    #[error("duplicate column {table}[{column}]")]
    DuplicateColumn { table: String, column: String },

    #[error("column length mismatch for {table}[{column}]: expected {expected} values, got {actual}")]
    ColumnLengthMismatch {
        table: String,
        column: String,
        expected: usize,
        actual: usize,
    },

    #[error("value at {column}[{row}] contains a line break and cannot be stored")]
    UnrepresentableValue { column: String, row: usize },

    #[error("missing column file: {}", .0.display())]
    MissingColumnFile(PathBuf),

    #[error("database metadata missing: {}", .0.display())]
    MissingMetadata(PathBuf),

    #[error("invalid database name: {0:?}")]
    InvalidDatabaseName(String),

    #[error("source file not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    #[error("csv input was empty")]
    EmptyInput,

    #[error("csv error at record {record}: {reason}")]
    Csv { record: u64, reason: String },

    #[error("metadata error: {0}")]
    Metadata(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
