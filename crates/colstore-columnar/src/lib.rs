//! Column-oriented storage for colstore.
//!
//! This crate focuses on:
//! - Typed in-memory columns and tables with a single, validated row count.
//! - Sampled type inference when raw text is turned into columns.
//! - One newline-delimited file per column on disk, plus a small JSON metadata record.
//! - CSV ingestion into a new database directory.

#![forbid(unsafe_code)]

mod bitmap;
mod database;
mod error;
mod import;
mod infer;
mod storage;
mod table;
mod types;

pub use crate::bitmap::{BitVec, IterOnes};
pub use crate::database::{
    validate_new_name, Database, DatabaseMeta, DEFAULT_BASE_DIR, META_FILE,
};
pub use crate::error::{ColumnarError, ColumnarResult};
pub use crate::import::{import_csv, read_csv_columns, CsvOptions, RawColumns};
pub use crate::infer::{coerce, coerce_column, infer_column_type, DEFAULT_SAMPLE_ROWS};
pub use crate::storage::{
    column_path, read_raw_column, write_column, StorageFormat, COLUMN_FILE_EXTENSION,
};
pub use crate::table::{validate_field_name, Column, ColumnSchema, LoadOptions, Table};
pub use crate::types::{ColumnType, Value};
