#![forbid(unsafe_code)]

use crate::error::{ColumnarError, ColumnarResult};
use crate::import::{import_csv, CsvOptions};
use crate::storage::{atomic_write, StorageFormat};
use crate::table::{LoadOptions, Table};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

pub const META_FILE: &str = "db.meta.json";
pub const DEFAULT_BASE_DIR: &str = "Database";

/// Persisted description of a database directory.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseMeta {
    pub name: String,
    pub path: PathBuf,
    pub engine: StorageFormat,
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub rows: usize,
}

impl DatabaseMeta {
    pub fn load(db_path: &Path) -> ColumnarResult<Self> {
        let meta_path = db_path.join(META_FILE);
        let file = match File::open(&meta_path) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(ColumnarError::MissingMetadata(meta_path));
            }
            Err(err) => return Err(err.into()),
        };
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }

    pub fn save(&self, db_path: &Path) -> ColumnarResult<()> {
        let json = serde_json::to_vec_pretty(self)?;
        atomic_write(&db_path.join(META_FILE), |out| {
            use std::io::Write;
            out.write_all(&json)?;
            out.write_all(b"\n")
        })
    }
}

/// A database directory: column files plus [`META_FILE`].
#[derive(Clone, Debug)]
pub struct Database {
    meta: DatabaseMeta,
}

impl Database {
    /// Import `csv_path` and persist it as `<base_dir>/<name>`.
    pub fn create(
        base_dir: &Path,
        name: &str,
        csv_path: &Path,
        format: StorageFormat,
        options: &CsvOptions,
    ) -> ColumnarResult<Self> {
        validate_new_name(name)?;
        if !csv_path.is_file() {
            return Err(ColumnarError::SourceNotFound(csv_path.to_path_buf()));
        }

        let name = name.trim();
        let file = File::open(csv_path)?;
        let table = import_csv(BufReader::new(file), name, options)?;
        Self::create_from_table(base_dir, &table, format)
    }

    /// Persist an already-built table as `<base_dir>/<table name>`.
    pub fn create_from_table(
        base_dir: &Path,
        table: &Table,
        format: StorageFormat,
    ) -> ColumnarResult<Self> {
        validate_new_name(table.name())?;
        let path = base_dir.join(table.name());
        format.write_table(table, &path)?;

        let meta = DatabaseMeta {
            name: table.name().to_string(),
            path: path.clone(),
            engine: format,
            columns: table.column_names().into_iter().map(str::to_string).collect(),
            rows: table.row_count(),
        };
        meta.save(&path)?;
        log::info!("created database {} at {}", meta.name, path.display());
        Ok(Self { meta })
    }

    /// Open an existing database directory by reading its metadata.
    ///
    /// The metadata `path` is replaced by `path` so a moved directory still loads.
    pub fn open(path: &Path) -> ColumnarResult<Self> {
        let mut meta = DatabaseMeta::load(path)?;
        meta.path = path.to_path_buf();
        Ok(Self { meta })
    }

    pub fn meta(&self) -> &DatabaseMeta {
        &self.meta
    }

    pub fn name(&self) -> &str {
        &self.meta.name
    }

    pub fn path(&self) -> &Path {
        &self.meta.path
    }

    pub fn format(&self) -> StorageFormat {
        self.meta.engine
    }

    /// Load every column recorded in the metadata.
    pub fn load_table(&self, options: LoadOptions) -> ColumnarResult<Table> {
        self.meta
            .engine
            .read_table(&self.meta.path, &self.meta.name, &self.meta.columns, options)
    }

    /// Load only `fields`, e.g. the columns a single query needs.
    pub fn load_fields<S: AsRef<str>>(
        &self,
        fields: &[S],
        options: LoadOptions,
    ) -> ColumnarResult<Table> {
        self.meta
            .engine
            .read_table(&self.meta.path, &self.meta.name, fields, options)
    }

    /// Names of database directories under `base_dir`, sorted.
    pub fn list(base_dir: &Path) -> ColumnarResult<Vec<String>> {
        if !base_dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut names = Vec::new();
        for entry in fs::read_dir(base_dir)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }
}

pub fn validate_new_name(name: &str) -> ColumnarResult<()> {
    let trimmed = name.trim();
    if trimmed.is_empty() || trimmed.contains(['/', '\\']) || trimmed == "." || trimmed == ".." {
        return Err(ColumnarError::InvalidDatabaseName(name.to_string()));
    }
    Ok(())
}
