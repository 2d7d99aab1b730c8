//! Aggregation, sort and top-N stages

use std::cmp::Ordering;
use std::collections::HashMap;

use serde_json::{Number, Value, json};

use super::Row;
use super::types::ColumnType;
use crate::state::{Aggregation, ChartType, SortDirection};

/// Everything the pipeline needs to know about the current mapping
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransformConfig {
    pub chart_type: ChartType,
    pub x_axis: Option<String>,
    pub y_axis: Option<String>,
    pub group_by: Option<String>,
    pub aggregation: Aggregation,
    pub sort_by: Option<String>,
    pub sort_direction: SortDirection,
    pub top_n: Option<usize>,
    /// Chart title
    pub title: String,
    pub x_axis_type: Option<ColumnType>,
    pub y_axis_type: Option<ColumnType>,
}

/// Run aggregation, then sort, then top-N truncation.
///
/// Each stage is skipped when its trigger is unset: `aggregation` of
/// [`Aggregation::None`], no `sort_by`, no `top_n`.
pub fn process_data(rows: &[Row], config: &TransformConfig) -> Vec<Row> {
    profiling::scope!("process_data");

    let mut processed = if config.aggregation != Aggregation::None {
        aggregate(rows, config)
    } else {
        rows.to_vec()
    };

    if let Some(field) = config.sort_by.as_deref() {
        // sort_by is stable, equal keys keep their order in both directions
        processed.sort_by(|a, b| {
            let ordering = compare_values(a.get(field), b.get(field));
            match config.sort_direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });
    }

    if let Some(n) = config.top_n {
        processed.truncate(n);
    }

    processed
}

/// Collapse rows into one row per group, in first-seen group order.
///
/// Groups by `group_by`, falling back to `x_axis`. The group key is written under
/// the x field (and under the group field when that differs), the aggregate of
/// the y field under the y field. Without a y field or any grouping field the
/// rows pass through unchanged.
pub fn aggregate(rows: &[Row], config: &TransformConfig) -> Vec<Row> {
    let Some(y_field) = config.y_axis.as_deref() else {
        return rows.to_vec();
    };
    let Some(key_field) = config.group_by.as_deref().or(config.x_axis.as_deref()) else {
        return rows.to_vec();
    };

    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<(Value, Vec<&Row>)> = Vec::new();
    for row in rows {
        let key = row.get(key_field).cloned().unwrap_or(Value::Null);
        // Serialized form keeps 1 and "1" apart
        match index.get(&key.to_string()) {
            Some(&slot) => groups[slot].1.push(row),
            None => {
                index.insert(key.to_string(), groups.len());
                groups.push((key, vec![row]));
            }
        }
    }

    groups
        .into_iter()
        .map(|(key, members)| {
            let mut aggregated = Row::new();
            if let Some(x_field) = config.x_axis.as_deref() {
                aggregated.insert(x_field.to_string(), key.clone());
            }
            if !aggregated.contains_key(key_field) {
                aggregated.insert(key_field.to_string(), key);
            }
            aggregated.insert(
                y_field.to_string(),
                aggregate_values(&members, y_field, config.aggregation),
            );
            aggregated
        })
        .collect()
}

fn aggregate_values(members: &[&Row], field: &str, aggregation: Aggregation) -> Value {
    let numbers: Vec<&Value> = members
        .iter()
        .filter_map(|row| row.get(field))
        .filter(|value| value.is_number())
        .collect();

    match aggregation {
        Aggregation::Count => json!(members.len()),
        Aggregation::Sum => sum(&numbers),
        Aggregation::Avg => {
            if numbers.is_empty() {
                Value::Null
            } else {
                let total: f64 = numbers.iter().filter_map(|v| v.as_f64()).sum();
                float(total / numbers.len() as f64)
            }
        }
        Aggregation::Min => numbers
            .iter()
            .min_by(|a, b| compare_values(Some(**a), Some(**b)))
            .map(|v| (**v).clone())
            .unwrap_or(Value::Null),
        Aggregation::Max => numbers
            .iter()
            .max_by(|a, b| compare_values(Some(**a), Some(**b)))
            .map(|v| (**v).clone())
            .unwrap_or(Value::Null),
        Aggregation::None => members
            .first()
            .and_then(|row| row.get(field))
            .cloned()
            .unwrap_or(Value::Null),
    }
}

/// Integer sum when every input is an integer, float sum otherwise
fn sum(numbers: &[&Value]) -> Value {
    let integers: Option<Vec<i64>> = numbers.iter().map(|v| v.as_i64()).collect();
    if let Some(integers) = integers {
        if let Some(total) = integers.iter().try_fold(0i64, |acc, v| acc.checked_add(*v)) {
            return json!(total);
        }
    }
    float(numbers.iter().filter_map(|v| v.as_f64()).sum())
}

fn float(value: f64) -> Value {
    Number::from_f64(value).map(Value::Number).unwrap_or(Value::Null)
}

fn rank(value: Option<&Value>) -> u8 {
    match value {
        Some(Value::Number(_)) => 0,
        Some(Value::String(_)) => 1,
        Some(Value::Bool(_)) => 2,
        Some(Value::Array(_)) | Some(Value::Object(_)) => 3,
        Some(Value::Null) | None => 4,
    }
}

/// Ascending order used by the sort stage.
///
/// Numbers sort before strings, booleans after; missing and null values sort
/// last.
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(f64::NAN), y.as_f64().unwrap_or(f64::NAN));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}
