//! Persisted visualization record

use serde::{Deserialize, Serialize};

use super::mapping::null_as_default;
use super::{AdvancedSettings, ChartType, Mapping};
use crate::template::ChartTemplate;

/// The shape saved to and loaded from the backend
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualizationRecord {
    pub id: Option<i64>,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub description: String,
    pub config: RecordConfig,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordConfig {
    #[serde(rename = "type", deserialize_with = "null_as_default")]
    pub chart_type: ChartType,
    #[serde(deserialize_with = "null_as_default")]
    pub mapping: Mapping,
    #[serde(deserialize_with = "null_as_default")]
    pub advanced: AdvancedSettings,
    pub plotly: ChartTemplate,
}

impl VisualizationRecord {
    /// Blank strings and a zero top-N count as unset.
    pub(crate) fn normalized(mut self) -> Self {
        let blank = |field: &mut Option<String>| {
            if field.as_deref().is_some_and(str::is_empty) {
                *field = None;
            }
        };

        let config = &mut self.config;
        if matches!(&config.chart_type, ChartType::Other(name) if name.is_empty()) {
            config.chart_type = ChartType::default();
        }
        blank(&mut config.mapping.x);
        blank(&mut config.mapping.y);
        blank(&mut config.mapping.group_by);
        blank(&mut config.advanced.sort_by);
        if config.advanced.top_n == Some(0) {
            config.advanced.top_n = None;
        }
        self
    }
}
