#![forbid(unsafe_code)]

use crate::error::{ColumnarError, ColumnarResult};
use crate::infer::DEFAULT_SAMPLE_ROWS;
use crate::table::{validate_field_name, Column, LoadOptions, Table};
use csv::StringRecord;
use std::io::Read;

#[derive(Clone, Debug)]
pub struct CsvOptions {
    pub delimiter: u8,
    pub has_header: bool,
    /// Number of non-empty values per column sampled for type inference.
    pub sample_rows: usize,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            has_header: true,
            sample_rows: DEFAULT_SAMPLE_ROWS,
        }
    }
}

/// Raw CSV contents split into per-column text.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawColumns {
    pub names: Vec<String>,
    pub values: Vec<Vec<String>>,
}

impl RawColumns {
    pub fn row_count(&self) -> usize {
        self.values.first().map(Vec::len).unwrap_or(0)
    }
}

fn map_csv_error(err: csv::Error, record: u64) -> ColumnarError {
    let record = err
        .position()
        .map(|pos| pos.record() + 1)
        .unwrap_or(record);
    ColumnarError::Csv {
        record,
        reason: err.to_string(),
    }
}

/// Split a CSV stream into one text vector per column.
///
/// Every record must have as many fields as the first one.
pub fn read_csv_columns<R: Read>(reader: R, options: &CsvOptions) -> ColumnarResult<RawColumns> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(options.delimiter)
        // Headers are handled manually so record numbers stay consistent.
        .has_headers(false)
        .flexible(false)
        .from_reader(reader);

    let mut record = StringRecord::new();
    let mut record_index: u64 = 0;

    let has_first = csv_reader
        .read_record(&mut record)
        .map_err(|e| map_csv_error(e, record_index + 1))?;
    if !has_first {
        return Err(ColumnarError::EmptyInput);
    }
    record_index += 1;

    let column_count = record.len().max(1);
    let mut values: Vec<Vec<String>> = vec![Vec::new(); column_count];
    let names: Vec<String> = if options.has_header {
        record
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                let name = name.trim();
                if name.is_empty() {
                    format!("Column{}", idx + 1)
                } else {
                    name.to_string()
                }
            })
            .collect()
    } else {
        for (idx, field) in record.iter().enumerate() {
            values[idx].push(field.to_string());
        }
        (0..column_count).map(|i| format!("Column{}", i + 1)).collect()
    };
    for name in &names {
        validate_field_name(name)?;
    }

    loop {
        record.clear();
        match csv_reader.read_record(&mut record) {
            Ok(false) => break,
            Ok(true) => {
                record_index += 1;
                for (idx, field) in record.iter().enumerate() {
                    values[idx].push(field.to_string());
                }
            }
            Err(e) => return Err(map_csv_error(e, record_index + 1)),
        }
    }

    Ok(RawColumns { names, values })
}

/// Import a CSV stream into a typed [`Table`].
pub fn import_csv<R: Read>(reader: R, name: &str, options: &CsvOptions) -> ColumnarResult<Table> {
    let raw = read_csv_columns(reader, options)?;
    let load = LoadOptions {
        sample_rows: options.sample_rows,
    };
    let columns = raw
        .names
        .iter()
        .zip(raw.values.iter())
        .map(|(name, values)| Column::from_raw(name.clone(), values, load))
        .collect();
    Table::new(name, columns)
}
