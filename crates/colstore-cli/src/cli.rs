use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colstore_columnar::{
    CsvOptions, Database, DatabaseMeta, LoadOptions, StorageFormat, DEFAULT_BASE_DIR,
};
use colstore_query::{
    AggFunc, GridScan, QuerySession, SearchConditions, DEFAULT_MAX_RATIO, DEFAULT_X_RANGE,
    DEFAULT_Y_RANGE,
};
use serde::Serialize;

use crate::report::{write_report, ReportFields};

#[derive(Parser, Debug)]
#[command(name = "colstore")]
#[command(about = "Column-store database builder and resale price grid scanner")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Import a CSV file into a new database directory.
    Create {
        /// Source CSV file (first row is the header).
        #[arg(long)]
        csv: PathBuf,

        /// Database name; becomes the directory name under `--base-dir`.
        #[arg(long)]
        name: String,

        #[arg(long, default_value = DEFAULT_BASE_DIR)]
        base_dir: PathBuf,

        /// Storage format tag.
        #[arg(long, default_value = "column")]
        format: String,

        /// Field delimiter (a single ASCII character).
        #[arg(long, default_value_t = ',')]
        delimiter: char,

        /// Number of non-empty values sampled per column for type inference.
        #[arg(long, default_value_t = colstore_columnar::DEFAULT_SAMPLE_ROWS)]
        sample_rows: usize,
    },

    /// List databases under a base directory as JSON.
    Info {
        #[arg(long, default_value = DEFAULT_BASE_DIR)]
        base_dir: PathBuf,
    },

    /// Aggregate one field, optionally restricted to some towns.
    Aggregate {
        /// Database directory (the one holding `db.meta.json`).
        #[arg(long)]
        db: PathBuf,

        /// One of sum, avg, min, max, count.
        #[arg(long)]
        func: String,

        #[arg(long)]
        field: String,

        /// Restrict to these towns (repeatable).
        #[arg(long = "town")]
        towns: Vec<String>,
    },

    /// Run the parameter-grid scan for an identifier and write the CSV report.
    Scan {
        /// Identifier whose digits select towns, target year and start month.
        identifier: String,

        /// Database directory (the one holding `db.meta.json`).
        #[arg(long, default_value = DEFAULT_BASE_DIR)]
        db: PathBuf,

        /// Output CSV path (default: ScanResult_<identifier>.csv).
        #[arg(long)]
        out: Option<PathBuf>,

        /// Cells whose best ratio exceeds this are reported as no result.
        #[arg(long, default_value_t = DEFAULT_MAX_RATIO)]
        max_ratio: f64,

        #[arg(long, default_value_t = *DEFAULT_X_RANGE.start())]
        x_min: u32,

        #[arg(long, default_value_t = *DEFAULT_X_RANGE.end())]
        x_max: u32,

        #[arg(long, default_value_t = *DEFAULT_Y_RANGE.start())]
        y_min: u32,

        #[arg(long, default_value_t = *DEFAULT_Y_RANGE.end())]
        y_max: u32,

        /// Scan on the current thread only.
        #[arg(long)]
        sequential: bool,
    },
}

#[derive(Debug, Serialize)]
struct DatabaseInfo {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    meta: Option<DatabaseMeta>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct AggregateOutput {
    func: String,
    field: String,
    rows: usize,
    value: serde_json::Value,
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    run_with_args(args)
}

pub fn run_with_args(args: Args) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match args.command {
        Command::Create {
            csv,
            name,
            base_dir,
            format,
            delimiter,
            sample_rows,
        } => {
            let Some(format) = StorageFormat::parse(&format) else {
                bail!("unknown storage format {format:?}");
            };
            if !delimiter.is_ascii() {
                bail!("delimiter must be a single ASCII character, got {delimiter:?}");
            }
            let options = CsvOptions {
                delimiter: delimiter as u8,
                sample_rows,
                ..CsvOptions::default()
            };
            let db = Database::create(&base_dir, &name, &csv, format, &options)
                .with_context(|| format!("create database {name:?} from {}", csv.display()))?;
            writeln!(
                out,
                "created {} ({} rows, {} columns) at {}",
                db.name(),
                db.meta().rows,
                db.meta().columns.len(),
                db.path().display()
            )?;
        }
        Command::Info { base_dir } => {
            let infos = list_databases(&base_dir)?;
            serde_json::to_writer_pretty(&mut out, &infos)?;
            writeln!(out)?;
        }
        Command::Aggregate {
            db,
            func,
            field,
            towns,
        } => {
            let func: AggFunc = func.parse()?;
            let database = open_database(&db)?;
            let mut fields = vec![field.clone()];
            if !towns.is_empty() {
                fields.push("town".to_string());
            }
            let table = database
                .load_fields(&fields, LoadOptions::default())
                .with_context(|| format!("load {fields:?} from {}", db.display()))?;

            let mut session = QuerySession::new(&table);
            if !towns.is_empty() {
                session.filter_in("town", &towns)?;
            }
            let value = session
                .aggregate(func, &field)
                .with_context(|| format!("{func}({field})"))?;

            let output = AggregateOutput {
                func: func.to_string(),
                field,
                rows: session.count(),
                value: match value {
                    colstore_columnar::Value::Integer(v) => v.into(),
                    colstore_columnar::Value::Real(v) => v.into(),
                    colstore_columnar::Value::Text(s) => s.to_string().into(),
                },
            };
            serde_json::to_writer_pretty(&mut out, &output)?;
            writeln!(out)?;
        }
        Command::Scan {
            identifier,
            db,
            out: out_path,
            max_ratio,
            x_min,
            x_max,
            y_min,
            y_max,
            sequential,
        } => {
            if x_min > x_max || y_min > y_max {
                bail!("empty grid: x {x_min}..={x_max}, y {y_min}..={y_max}");
            }
            let conditions = SearchConditions::from_identifier(&identifier)
                .with_context(|| format!("derive search conditions from {identifier:?}"))?;
            log::info!(
                "towns {:?}, window starts {}-{:02}",
                conditions.towns,
                conditions.target_year,
                conditions.start_month
            );

            let database = open_database(&db)?;
            let table = database
                .load_table(LoadOptions::default())
                .with_context(|| format!("load table from {}", db.display()))?;

            let scan = GridScan::from_conditions(&conditions)?
                .with_x_range(x_min..=x_max)
                .with_y_range(y_min..=y_max)
                .with_max_ratio(max_ratio);
            let cells = if sequential {
                QuerySession::new(&table).scan_grid(&scan)?
            } else {
                scan_default(&scan, &table)?
            };

            let out_path =
                out_path.unwrap_or_else(|| PathBuf::from(format!("ScanResult_{identifier}.csv")));
            let file = File::create(&out_path)
                .with_context(|| format!("create {}", out_path.display()))?;
            write_report(BufWriter::new(file), &table, &ReportFields::default(), &cells)
                .with_context(|| format!("write {}", out_path.display()))?;

            let matched = cells.iter().filter(|c| c.is_match()).count();
            writeln!(
                out,
                "wrote {} cells ({matched} matched) to {}",
                cells.len(),
                out_path.display()
            )?;
        }
    }
    Ok(())
}

#[cfg(feature = "parallel")]
fn scan_default(
    scan: &GridScan,
    table: &colstore_columnar::Table,
) -> colstore_query::QueryResult<Vec<colstore_query::GridCell>> {
    scan.scan_parallel(table)
}

#[cfg(not(feature = "parallel"))]
fn scan_default(
    scan: &GridScan,
    table: &colstore_columnar::Table,
) -> colstore_query::QueryResult<Vec<colstore_query::GridCell>> {
    QuerySession::new(table).scan_grid(scan)
}

fn open_database(path: &Path) -> Result<Database> {
    Database::open(path).with_context(|| format!("open database at {}", path.display()))
}

fn list_databases(base_dir: &Path) -> Result<Vec<DatabaseInfo>> {
    let names = Database::list(base_dir)
        .with_context(|| format!("list databases under {}", base_dir.display()))?;
    Ok(names
        .into_iter()
        .map(|name| match DatabaseMeta::load(&base_dir.join(&name)) {
            Ok(meta) => DatabaseInfo {
                name,
                meta: Some(meta),
                error: None,
            },
            Err(err) => DatabaseInfo {
                name,
                meta: None,
                error: Some(err.to_string()),
            },
        })
        .collect())
}
