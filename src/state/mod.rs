//! Visualization state management
//!
//! [`VisualizationState`] owns one [`AppState`] snapshot: the record being
//! edited, the loaded data and the transient UI flags. Mapping changes are
//! turned into processed rows and a chart template on the recompute worker.

mod derived;
mod mapping;
mod record;
mod store;
mod update;

pub use derived::{Derived, derive_chart, transform_config};
pub use mapping::{AdvancedSettings, Aggregation, ChartType, Mapping, SortDirection};
pub use record::{RecordConfig, VisualizationRecord};
pub use store::{Subscription, VisualizationState};
pub use update::StateUpdate;

use std::sync::Arc;

use serde_json::Value;

use crate::data::{ColumnTypes, Row};
use crate::template::{ChartTemplate, empty_template};

/// Snapshot held by the store and handed to subscribers
#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    /// Backend id, assigned on first save
    pub id: Option<i64>,
    pub name: String,
    pub description: String,

    pub chart_type: ChartType,
    pub x_axis: Option<String>,
    pub y_axis: Option<String>,
    pub group_by: Option<String>,
    pub aggregation: Aggregation,

    pub sort_by: Option<String>,
    pub sort_direction: SortDirection,
    pub top_n: Option<usize>,
    pub filters: Vec<Value>,

    /// Full plotting template, replaced after every successful recompute
    pub plotly_config: ChartTemplate,

    /// Name of the file (or server-side file) the rows came from
    pub source_file: Option<String>,
    /// Shared with in-flight recomputations
    pub raw_data: Option<Arc<Vec<Row>>>,
    pub processed_data: Vec<Row>,
    pub columns: Vec<String>,
    pub column_types: ColumnTypes,

    pub loading: bool,
    pub has_unsaved_changes: bool,
    pub error: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            id: None,
            name: String::new(),
            description: String::new(),
            chart_type: ChartType::default(),
            x_axis: None,
            y_axis: None,
            group_by: None,
            aggregation: Aggregation::default(),
            sort_by: None,
            sort_direction: SortDirection::default(),
            top_n: None,
            filters: Vec::new(),
            plotly_config: empty_template(),
            source_file: None,
            raw_data: None,
            processed_data: Vec::new(),
            columns: Vec::new(),
            column_types: ColumnTypes::new(),
            loading: false,
            has_unsaved_changes: false,
            error: None,
        }
    }
}

impl AppState {
    /// Check if data is loaded
    pub fn has_data(&self) -> bool {
        self.raw_data.is_some()
    }

    /// Get the number of rows in the current dataset
    pub fn row_count(&self) -> usize {
        self.raw_data.as_ref().map(|rows| rows.len()).unwrap_or(0)
    }

    /// Get the number of columns in the current dataset
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// The mapping part of the record
    pub fn mapping(&self) -> Mapping {
        Mapping {
            x: self.x_axis.clone(),
            y: self.y_axis.clone(),
            group_by: self.group_by.clone(),
            aggregation: self.aggregation,
        }
    }

    /// The advanced-settings part of the record
    pub fn advanced(&self) -> AdvancedSettings {
        AdvancedSettings {
            sort_by: self.sort_by.clone(),
            sort_direction: self.sort_direction,
            top_n: self.top_n,
            filters: self.filters.clone(),
        }
    }
}

/// Where the session stands in the load, configure, save cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    #[default]
    Empty,
    DataLoaded,
    Configured,
    Saved,
    /// Edited since the last save or import
    Dirty,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_state() {
        let state = AppState::default();
        assert!(!state.has_data());
        assert_eq!(state.row_count(), 0);
        assert_eq!(state.chart_type, ChartType::Line);
        assert_eq!(state.plotly_config["data"], json!([]));
        assert_eq!(state.plotly_config["layout"]["margin"]["l"], json!(60));
    }

    #[test]
    fn test_mapping_projection() {
        let state = AppState {
            x_axis: Some("month".to_string()),
            aggregation: Aggregation::Count,
            top_n: Some(3),
            ..AppState::default()
        };
        assert_eq!(state.mapping().x.as_deref(), Some("month"));
        assert_eq!(state.mapping().aggregation, Aggregation::Count);
        assert_eq!(state.advanced().top_n, Some(3));
    }
}
