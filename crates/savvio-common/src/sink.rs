//! Record sink: persisting records to local files and loading them back
//!
//! Two on-disk layouts are supported:
//!
//! - **CSV** with a header row built from the union of record keys. Nested
//!   values are written as compact JSON, nulls as empty cells.
//! - **JSON** as a pretty-printed array of objects.
//!
//! Records without any fields cannot be written as CSV.
//!
//! Reading CSV infers integers, floats, booleans and empty cells (null); all
//! other cells stay strings.

use crate::error::{CommonError, Result};
use crate::table::{json_kind, union_columns, Record, Table};
use serde_json::{Number, Value};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Serialization format of a local file or remote object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileFormat {
    Csv,
    Json,
}

impl FileFormat {
    /// MIME type used when uploading
    pub fn content_type(self) -> &'static str {
        match self {
            FileFormat::Csv => "text/csv",
            FileFormat::Json => "application/json",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            FileFormat::Csv => "csv",
            FileFormat::Json => "json",
        }
    }
}

impl std::str::FromStr for FileFormat {
    type Err = CommonError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(FileFormat::Csv),
            "json" => Ok(FileFormat::Json),
            _ => Err(CommonError::UnsupportedFormat(s.to_string())),
        }
    }
}

impl std::fmt::Display for FileFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.extension())
    }
}

/// Write records to `path`, creating parent directories as needed
pub fn write_records(records: &[Record], path: impl AsRef<Path>, format: FileFormat) -> Result<PathBuf> {
    let columns = union_columns(records);
    write_rows(&columns, records, path.as_ref(), format)
}

/// Write a table to `path`, keeping its column order
pub fn write_table(table: &Table, path: impl AsRef<Path>, format: FileFormat) -> Result<PathBuf> {
    write_rows(table.columns(), table.rows(), path.as_ref(), format)
}

fn write_rows(columns: &[String], rows: &[Record], path: &Path, format: FileFormat) -> Result<PathBuf> {
    // A CSV row without cells has no representation a reader can count
    if format == FileFormat::Csv && columns.is_empty() && !rows.is_empty() {
        return Err(CommonError::invalid_shape(format!(
            "cannot write {} records without fields as CSV",
            rows.len()
        )));
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    info!(records = rows.len(), path = %path.display(), format = %format, "Saving records");

    match format {
        FileFormat::Json => {
            let mut writer = BufWriter::new(File::create(path)?);
            serde_json::to_writer_pretty(&mut writer, rows)?;
            writer.flush()?;
        },
        FileFormat::Csv => {
            let mut writer = csv::Writer::from_path(path)?;
            if !columns.is_empty() {
                writer.write_record(columns)?;
            }
            for record in rows {
                let cells = columns
                    .iter()
                    .map(|column| cell_to_string(record.get(column)))
                    .collect::<Result<Vec<_>>>()?;
                writer.write_record(&cells)?;
            }
            writer.flush()?;
        },
    }

    let size = fs::metadata(path)?.len();
    info!(bytes = size, path = %path.display(), "Saved file");

    Ok(path.to_path_buf())
}

fn cell_to_string(value: Option<&Value>) -> Result<String> {
    Ok(match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(nested) => serde_json::to_string(nested)?,
    })
}

/// Read a local file into a table
///
/// JSON files must hold an array of objects; see [`read_json`] for arbitrary
/// documents.
pub fn read_table(path: impl AsRef<Path>, format: FileFormat) -> Result<Table> {
    let path = path.as_ref();
    let table = match format {
        FileFormat::Csv => read_csv(path)?,
        FileFormat::Json => Table::from_json(read_json(path)?)?,
    };

    debug!(
        rows = table.row_count(),
        columns = table.column_count(),
        path = %path.display(),
        "Loaded table"
    );

    Ok(table)
}

/// Read any JSON document from disk
pub fn read_json(path: impl AsRef<Path>) -> Result<Value> {
    let reader = BufReader::new(File::open(path.as_ref())?);
    Ok(serde_json::from_reader(reader)?)
}

/// Read a JSON file that must be a record array, returning the raw records
pub fn read_records(path: impl AsRef<Path>) -> Result<Vec<Record>> {
    match read_json(path)? {
        Value::Array(items) => crate::table::records_from_values(items),
        other => Err(CommonError::invalid_shape(format!(
            "expected a JSON array of records, found {}",
            json_kind(&other)
        ))),
    }
}

fn read_csv(path: &Path) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;

    let columns: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

    let mut rows = Vec::new();
    for row in reader.records() {
        let row = row?;
        let mut record = Record::new();
        for (index, column) in columns.iter().enumerate() {
            let cell = row.get(index).unwrap_or("");
            record.insert(column.clone(), infer_cell(cell));
        }
        rows.push(record);
    }

    Ok(Table::with_columns(columns, rows))
}

/// Best-effort typing of a CSV cell
fn infer_cell(cell: &str) -> Value {
    if cell.is_empty() {
        return Value::Null;
    }
    if let Ok(int) = cell.parse::<i64>() {
        return Value::Number(int.into());
    }
    if let Some(number) = cell.parse::<f64>().ok().and_then(Number::from_f64) {
        return Value::Number(number);
    }
    match cell.to_lowercase().as_str() {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => Value::String(cell.to_string()),
    }
}
