use colstore_columnar::ColumnarError;

pub type QueryResult<T> = Result<T, QueryError>;

#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("unknown field: {0}")]
    FieldNotFound(String),

    #[error("cannot compute {func} of {field}: no rows selected")]
    EmptySelection { func: String, field: String },

    #[error("invalid denominator {field}[{row}]: {value}")]
    InvalidDenominator {
        field: String,
        row: usize,
        value: f64,
    },

    #[error("value {field}[{row}] is not numeric")]
    MalformedValue { field: String, row: usize },

    #[error("unknown aggregation: {0}")]
    UnknownAggregation(String),

    #[error("row {row} out of bounds for table with {rows} rows")]
    RowOutOfBounds { row: usize, rows: usize },

    #[error("mask length mismatch: expected {expected} bits, got {actual}")]
    MaskLengthMismatch { expected: usize, actual: usize },

    #[error(transparent)]
    Columnar(ColumnarError),
}

impl From<ColumnarError> for QueryError {
    fn from(err: ColumnarError) -> Self {
        match err {
            ColumnarError::FieldNotFound(field) => QueryError::FieldNotFound(field),
            other => QueryError::Columnar(other),
        }
    }
}
