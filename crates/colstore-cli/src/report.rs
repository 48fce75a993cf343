//! CSV report for grid scan results.

use std::io::Write;

use anyhow::{Context, Result};
use colstore_columnar::Table;
use colstore_query::{GridCell, YearMonth};

pub const HEADER: [&str; 9] = [
    "(x, y)",
    "Year",
    "Month",
    "Town",
    "Block",
    "Floor_Area",
    "Flat_Model",
    "Lease_Commence_Date",
    "Price_Per_Square_Meter",
];

const NO_RESULT: &str = "No result";

/// Table fields copied into each matched report row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReportFields {
    pub month: String,
    pub town: String,
    pub block: String,
    pub area: String,
    pub flat_model: String,
    pub lease_commence_date: String,
}

impl Default for ReportFields {
    fn default() -> Self {
        Self {
            month: "month".to_string(),
            town: "town".to_string(),
            block: "block".to_string(),
            area: "floor_area_sqm".to_string(),
            flat_model: "flat_model".to_string(),
            lease_commence_date: "lease_commence_date".to_string(),
        }
    }
}

fn cell_label(cell: &GridCell) -> String {
    format!("({}, {})", cell.x, cell.y)
}

/// Raw text of `field` at `row`; empty when the table lacks the field.
fn raw(table: &Table, row: usize, field: &str) -> String {
    table
        .value(row, field)
        .map(|v| v.to_string())
        .unwrap_or_default()
}

/// Render one report record. Ratios are rounded half to even.
pub fn format_row(table: &Table, fields: &ReportFields, cell: &GridCell) -> Result<Vec<String>> {
    let (Some(row), Some(ratio)) = (cell.row, cell.ratio) else {
        let mut record = vec![cell_label(cell), NO_RESULT.to_string()];
        record.resize(HEADER.len(), String::new());
        return Ok(record);
    };

    let month_text = raw(table, row, &fields.month);
    let month = YearMonth::parse(&month_text)
        .with_context(|| format!("row {row}: month {month_text:?} is not Mon-YY"))?;

    Ok(vec![
        cell_label(cell),
        month.year.to_string(),
        format!("{:02}", month.month),
        raw(table, row, &fields.town),
        raw(table, row, &fields.block),
        raw(table, row, &fields.area),
        raw(table, row, &fields.flat_model),
        raw(table, row, &fields.lease_commence_date),
        format!("{}", ratio.round_ties_even()),
    ])
}

/// Write the header plus one record per cell, in cell order. Records end in CRLF.
pub fn write_report<W: Write>(
    out: W,
    table: &Table,
    fields: &ReportFields,
    cells: &[GridCell],
) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::CRLF)
        .from_writer(out);
    writer.write_record(HEADER).context("write report header")?;
    for cell in cells {
        writer
            .write_record(format_row(table, fields, cell)?)
            .with_context(|| format!("write report row {}", cell_label(cell)))?;
    }
    writer.flush().context("flush report")?;
    Ok(())
}
