#![forbid(unsafe_code)]

//! On-disk column files.
//!
//! Each field lives in its own `<field>.col` file: one value per line, no header, no
//! escaping. A value containing a line break therefore cannot be stored and is
//! rejected before the file is touched.

use crate::error::{ColumnarError, ColumnarResult};
use crate::table::{validate_field_name, Column, LoadOptions, Table};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub const COLUMN_FILE_EXTENSION: &str = "col";

/// Storage encodings a database can be written with.
///
/// The tag is persisted in the database metadata and selects the reader on reload.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageFormat {
    /// One newline-delimited file per column.
    #[default]
    Column,
}

impl StorageFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            StorageFormat::Column => "column",
        }
    }

    pub fn parse(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "column" => Some(StorageFormat::Column),
            _ => None,
        }
    }

    /// Write every column of `table` under `dir`.
    pub fn write_table(self, table: &Table, dir: &Path) -> ColumnarResult<()> {
        match self {
            StorageFormat::Column => {
                fs::create_dir_all(dir)?;
                for column in table.columns() {
                    write_column(dir, column)?;
                }
                log::info!(
                    "wrote {} rows x {} columns to {}",
                    table.row_count(),
                    table.column_count(),
                    dir.display()
                );
                Ok(())
            }
        }
    }

    /// Read the listed fields from `dir` into a validated [`Table`].
    pub fn read_table<S: AsRef<str>>(
        self,
        dir: &Path,
        name: &str,
        fields: &[S],
        options: LoadOptions,
    ) -> ColumnarResult<Table> {
        match self {
            StorageFormat::Column => {
                let mut columns = Vec::with_capacity(fields.len());
                for field in fields {
                    let field = field.as_ref();
                    let raw = read_raw_column(dir, field)?;
                    columns.push(Column::from_raw(field, &raw, options));
                }
                let table = Table::new(name, columns)?;
                log::info!(
                    "loaded table {name} with {} rows and columns {:?}",
                    table.row_count(),
                    table.column_names()
                );
                Ok(table)
            }
        }
    }
}

pub fn column_path(dir: &Path, field: &str) -> PathBuf {
    dir.join(format!("{field}.{COLUMN_FILE_EXTENSION}"))
}

/// Read one column file as raw text lines (`\n` and `\r\n` terminators removed).
pub fn read_raw_column(dir: &Path, field: &str) -> ColumnarResult<Vec<String>> {
    validate_field_name(field)?;
    let path = column_path(dir, field);
    let file = match File::open(&path) {
        Ok(file) => file,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Err(ColumnarError::MissingColumnFile(path));
        }
        Err(err) => return Err(err.into()),
    };

    let lines = BufReader::new(file).lines().collect::<io::Result<Vec<_>>>()?;
    Ok(lines)
}

/// Write one column file atomically.
pub fn write_column(dir: &Path, column: &Column) -> ColumnarResult<()> {
    let mut rendered = Vec::with_capacity(column.len());
    for (row, value) in column.values().iter().enumerate() {
        let text = value.to_string();
        if text.contains(['\n', '\r']) {
            return Err(ColumnarError::UnrepresentableValue {
                column: column.name().to_string(),
                row,
            });
        }
        rendered.push(text);
    }

    atomic_write(&column_path(dir, column.name()), |out| {
        for line in &rendered {
            out.write_all(line.as_bytes())?;
            out.write_all(b"\n")?;
        }
        Ok(())
    })
}

/// Write to a temp file in the destination directory, sync, then rename into place.
///
/// If `write_fn` fails the destination is left untouched.
pub(crate) fn atomic_write(
    dest: &Path,
    write_fn: impl FnOnce(&mut BufWriter<&mut File>) -> io::Result<()>,
) -> ColumnarResult<()> {
    let dir = dest
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    {
        let mut out = BufWriter::new(tmp.as_file_mut());
        write_fn(&mut out)?;
        out.flush()?;
    }
    tmp.as_file().sync_all()?;
    tmp.persist(dest).map_err(|err| ColumnarError::Io(err.error))?;
    Ok(())
}
