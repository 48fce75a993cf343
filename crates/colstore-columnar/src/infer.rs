#![forbid(unsafe_code)]

//! Sampled type inference for raw text columns.
//!
//! Only the first `sample_rows` non-empty values decide the column type. A column
//! whose sample is uniformly numeric but which later contains non-numeric text
//! keeps the numeric type; those later values are stored as [`Value::Text`] for
//! their row only (see [`coerce`]).

use crate::types::{ColumnType, Value};
use std::sync::Arc;

pub const DEFAULT_SAMPLE_ROWS: usize = 100;

fn parses_as_integer(raw: &str) -> bool {
    raw.trim().parse::<i64>().is_ok()
}

fn parses_as_real(raw: &str) -> bool {
    raw.trim().parse::<f64>().is_ok()
}

/// Guess a column type from the first `sample_rows` non-empty values.
pub fn infer_column_type<S: AsRef<str>>(raw: &[S], sample_rows: usize) -> ColumnType {
    let sample: Vec<&str> = raw
        .iter()
        .map(|v| v.as_ref())
        .filter(|v| !v.is_empty())
        .take(sample_rows)
        .collect();

    if sample.is_empty() {
        return ColumnType::Text;
    }
    if sample.iter().all(|v| parses_as_integer(v)) {
        return ColumnType::Integer;
    }
    if sample.iter().all(|v| parses_as_real(v)) {
        return ColumnType::Real;
    }
    ColumnType::Text
}

/// Convert one raw value to `column_type`, falling back to the raw text.
pub fn coerce(raw: &str, column_type: ColumnType) -> Value {
    let parsed = match column_type {
        ColumnType::Integer => raw.trim().parse::<i64>().ok().map(Value::Integer),
        ColumnType::Real => raw.trim().parse::<f64>().ok().map(Value::Real),
        ColumnType::Text => None,
    };
    parsed.unwrap_or_else(|| Value::Text(Arc::from(raw)))
}

/// Infer a type for `raw` and coerce every value to it.
///
/// Returns the number of values that fell back to text alongside the coerced values.
pub fn coerce_column<S: AsRef<str>>(
    raw: &[S],
    sample_rows: usize,
) -> (ColumnType, Vec<Value>, usize) {
    let column_type = infer_column_type(raw, sample_rows);
    let mut fallbacks = 0usize;
    let values = raw
        .iter()
        .map(|v| {
            let value = coerce(v.as_ref(), column_type);
            if column_type.is_numeric() && value.is_text() {
                fallbacks += 1;
            }
            value
        })
        .collect();
    (column_type, values, fallbacks)
}
