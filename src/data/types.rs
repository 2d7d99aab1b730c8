//! Column type inference

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Row, column_names};

/// Inferred type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Number,
    Date,
    String,
    #[default]
    Unknown,
}

pub type ColumnTypes = BTreeMap<String, ColumnType>;

const DATETIME_FORMATS: [&str; 5] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
];

const DATE_FORMATS: [&str; 7] = [
    "%Y-%m-%d",
    "%d/%m/%Y",
    "%m/%d/%Y",
    "%Y/%m/%d",
    "%b %d, %Y",
    "%B %d, %Y",
    "%d %b %Y",
];

/// Whether a string looks like a date or timestamp
pub fn parses_as_date(s: &str) -> bool {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return false;
    }
    if DateTime::parse_from_rfc3339(trimmed).is_ok() {
        return true;
    }
    DATETIME_FORMATS
        .iter()
        .any(|format| NaiveDateTime::parse_from_str(trimmed, format).is_ok())
        || DATE_FORMATS
            .iter()
            .any(|format| NaiveDate::parse_from_str(trimmed, format).is_ok())
}

/// Infer a type for every column.
///
/// Nulls are ignored. The first remaining value alone decides whether the
/// column is numeric; otherwise the column is a date only when every remaining
/// value parses as one.
pub fn infer_column_types(rows: &[Row]) -> ColumnTypes {
    column_names(rows)
        .into_iter()
        .map(|column| {
            let values: Vec<&Value> = rows
                .iter()
                .filter_map(|row| row.get(&column))
                .filter(|value| !value.is_null())
                .collect();
            let column_type = classify(&values);
            (column, column_type)
        })
        .collect()
}

fn classify(values: &[&Value]) -> ColumnType {
    let Some(first) = values.first() else {
        return ColumnType::Unknown;
    };
    if first.is_number() {
        return ColumnType::Number;
    }
    let all_dates = values
        .iter()
        .all(|value| value.as_str().is_some_and(parses_as_date));
    if all_dates {
        ColumnType::Date
    } else {
        ColumnType::String
    }
}
