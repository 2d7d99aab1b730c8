use std::io::Cursor;
use std::path::Path;

use calamine::{Data, Reader, open_workbook_auto_from_rs};
use chrono::{NaiveDateTime, NaiveTime};
use polars::prelude::{AnyValue, CsvReadOptions, DataFrame, SerReader};
use serde_json::{Number, Value};

use super::types::{ColumnTypes, infer_column_types};
use super::{Row, column_names};
use crate::config::ClientConfig;
use crate::error::{Result, VizError};

/// An uploaded data file: its name (for the extension) and its contents
#[derive(Debug, Clone)]
pub struct DataFile {
    name: String,
    bytes: Vec<u8>,
}

impl DataFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a file from disk, keeping only its file name
    pub fn open(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string();
        Ok(Self { name, bytes })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Lowercase extension without the dot, empty when there is none
    pub fn extension(&self) -> String {
        Path::new(&self.name)
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_lowercase()
    }
}

/// Rows with their column list and inferred column types
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedTable {
    pub rows: Vec<Row>,
    pub columns: Vec<String>,
    pub column_types: ColumnTypes,
}

impl LoadedTable {
    pub fn from_rows(rows: Vec<Row>) -> Result<Self> {
        if rows.is_empty() {
            return Err(VizError::EmptyDataset);
        }
        let columns = column_names(&rows);
        let column_types = infer_column_types(&rows);
        Ok(Self {
            rows,
            columns,
            column_types,
        })
    }
}

/// Check size and extension before any parsing or upload
pub fn validate_file(file: &DataFile, config: &ClientConfig) -> Result<()> {
    const MB: f64 = 1024.0 * 1024.0;

    if file.size() > config.max_file_size {
        return Err(VizError::Validation(format!(
            "File size ({:.2}MB) exceeds the maximum limit of {}MB",
            file.size() as f64 / MB,
            config.max_file_size as f64 / MB
        )));
    }

    let extension = file.extension();
    if !config.accepts_extension(&extension) {
        let supported: Vec<String> = config
            .allowed_extensions
            .iter()
            .map(|ext| format!(".{}", ext))
            .collect();
        return Err(VizError::Validation(format!(
            "File type .{} is not supported. Supported types: {}",
            extension,
            supported.join(", ")
        )));
    }

    Ok(())
}

/// Parse a data file with the parser matching its extension
pub fn parse_file(file: &DataFile) -> Result<LoadedTable> {
    profiling::scope!("parse_file");

    let rows = match file.extension().as_str() {
        "csv" => parse_csv(file.bytes())?,
        "xlsx" | "xls" => parse_spreadsheet(file.bytes())?,
        ext => {
            return Err(VizError::UnsupportedFileType {
                extension: ext.to_string(),
            });
        }
    };
    tracing::debug!(file = file.name(), rows = rows.len(), "parsed data file");
    LoadedTable::from_rows(rows)
}

fn parse_csv(bytes: &[u8]) -> Result<Vec<Row>> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(100))
        .map_parse_options(|opts| opts.with_try_parse_dates(true))
        .into_reader_with_file_handle(Cursor::new(bytes.to_vec()))
        .finish()?;
    dataframe_to_rows(&df)
}

fn dataframe_to_rows(df: &DataFrame) -> Result<Vec<Row>> {
    let names: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect();
    let columns: Vec<_> = df
        .get_columns()
        .iter()
        .map(|c| c.as_materialized_series())
        .collect();

    let mut rows = Vec::with_capacity(df.height());
    for idx in 0..df.height() {
        let mut row = Row::new();
        for (name, series) in names.iter().zip(&columns) {
            row.insert(name.clone(), any_value_to_json(series.get(idx)?));
        }
        rows.push(row);
    }
    Ok(rows)
}

fn any_value_to_json(value: AnyValue) -> Value {
    match value {
        AnyValue::Null => Value::Null,
        AnyValue::Boolean(b) => Value::Bool(b),
        AnyValue::String(s) => Value::String(s.to_string()),
        AnyValue::StringOwned(s) => Value::String(s.to_string()),
        AnyValue::Int32(v) => Value::from(v),
        AnyValue::Int64(v) => Value::from(v),
        AnyValue::UInt32(v) => Value::from(v),
        AnyValue::UInt64(v) => Value::from(v),
        AnyValue::Float32(v) => float(v as f64),
        AnyValue::Float64(v) => float(v),
        // Dates and datetimes render as ISO text
        other => Value::String(other.to_string()),
    }
}

fn float(v: f64) -> Value {
    Number::from_f64(v).map(Value::Number).unwrap_or(Value::Null)
}

/// First worksheet, first row as headers
fn parse_spreadsheet(bytes: &[u8]) -> Result<Vec<Row>> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(VizError::EmptyDataset)??;

    let mut lines = range.rows();
    let Some(header) = lines.next() else {
        return Err(VizError::EmptyDataset);
    };
    let headers: Vec<String> = header.iter().map(|cell| cell.to_string()).collect();

    let rows = lines
        .filter(|cells| cells.iter().any(|cell| !matches!(cell, Data::Empty)))
        .map(|cells| {
            headers
                .iter()
                .zip(cells)
                .map(|(name, cell)| (name.clone(), cell_to_json(cell)))
                .collect::<Row>()
        })
        .collect();
    Ok(rows)
}

fn cell_to_json(cell: &Data) -> Value {
    match cell {
        Data::Empty | Data::Error(_) => Value::Null,
        Data::Int(v) => Value::from(*v),
        Data::Float(v) => float(*v),
        Data::Bool(b) => Value::Bool(*b),
        Data::String(s) => Value::String(s.clone()),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(datetime) if !dt.is_duration() => Value::String(iso_text(datetime)),
            _ => float(dt.as_f64()),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => Value::String(s.clone()),
    }
}

/// Date-only text at midnight, full timestamp otherwise
fn iso_text(datetime: NaiveDateTime) -> String {
    if datetime.time() == NaiveTime::MIN {
        datetime.format("%Y-%m-%d").to_string()
    } else {
        datetime.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}
