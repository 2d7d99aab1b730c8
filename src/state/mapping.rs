//! Mapping configuration: chart type, axis columns and advanced settings

use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::VizError;

/// Chart type selected by the user
///
/// Serialized as its lowercase name; names without a built-in preset are kept
/// as [`ChartType::Other`] and render as plain scatter markers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ChartType {
    #[default]
    Line,
    Bar,
    Scatter,
    Area,
    Histogram,
    Box,
    Violin,
    Other(String),
}

impl ChartType {
    pub fn as_str(&self) -> &str {
        match self {
            ChartType::Line => "line",
            ChartType::Bar => "bar",
            ChartType::Scatter => "scatter",
            ChartType::Area => "area",
            ChartType::Histogram => "histogram",
            ChartType::Box => "box",
            ChartType::Violin => "violin",
            ChartType::Other(name) => name,
        }
    }
}

impl From<String> for ChartType {
    fn from(name: String) -> Self {
        match name.as_str() {
            "line" => ChartType::Line,
            "bar" => ChartType::Bar,
            "scatter" => ChartType::Scatter,
            "area" => ChartType::Area,
            "histogram" => ChartType::Histogram,
            "box" => ChartType::Box,
            "violin" => ChartType::Violin,
            _ => ChartType::Other(name),
        }
    }
}

impl From<&str> for ChartType {
    fn from(name: &str) -> Self {
        ChartType::from(name.to_string())
    }
}

impl From<ChartType> for String {
    fn from(chart_type: ChartType) -> Self {
        match chart_type {
            ChartType::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for ChartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregation applied to the y column per group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    #[default]
    None,
    Sum,
    #[serde(alias = "mean")]
    Avg,
    Min,
    Max,
    Count,
}

impl FromStr for Aggregation {
    type Err = VizError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Aggregation::None),
            "sum" => Ok(Aggregation::Sum),
            "avg" | "mean" => Ok(Aggregation::Avg),
            "min" => Ok(Aggregation::Min),
            "max" => Ok(Aggregation::Max),
            "count" => Ok(Aggregation::Count),
            other => Err(VizError::Validation(format!("Unknown aggregation '{}'", other))),
        }
    }
}

/// Sort direction for the sort stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// Which columns feed the chart axes and grouping
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Mapping {
    pub x: Option<String>,
    pub y: Option<String>,
    pub group_by: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub aggregation: Aggregation,
}

/// Sort, top-N and filter settings
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AdvancedSettings {
    pub sort_by: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub sort_direction: SortDirection,
    #[serde(deserialize_with = "lenient_count")]
    pub top_n: Option<usize>,
    /// Stored and persisted as given; the pipeline does not evaluate them.
    #[serde(deserialize_with = "null_as_default")]
    pub filters: Vec<Value>,
}

/// Treat an explicit `null` like an absent field.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Like [`null_as_default`], but a value outside the vocabulary also falls
/// back to the default. Strings are matched case-insensitively.
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + DeserializeOwned,
{
    let value = match Value::deserialize(deserializer)? {
        Value::Null => return Ok(T::default()),
        Value::String(s) => Value::String(s.to_lowercase()),
        other => other,
    };
    Ok(serde_json::from_value(value.clone()).unwrap_or_else(|_| {
        tracing::warn!(%value, "unrecognised setting, using the default");
        T::default()
    }))
}

/// A count given as a number or numeric string; anything else is unset
fn lenient_count<'de, D>(deserializer: D) -> Result<Option<usize>, D::Error>
where
    D: Deserializer<'de>,
{
    let count = match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| *f >= 0.0 && f.fract() == 0.0)
                .map(|f| f as u64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    Ok(count.and_then(|n| usize::try_from(n).ok()))
}
