//! Partial updates to the visualization state

use std::sync::Arc;

use serde_json::Value;

use super::{AdvancedSettings, AppState, Aggregation, ChartType, Mapping, SortDirection};
use crate::data::{ColumnTypes, Row};
use crate::template::ChartTemplate;

/// A shallow update: every `Some` field replaces the matching state field.
///
/// Nullable state fields take `Some(None)` to clear them.
#[derive(Debug, Clone, Default)]
pub struct StateUpdate {
    pub id: Option<Option<i64>>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub chart_type: Option<ChartType>,
    pub x_axis: Option<Option<String>>,
    pub y_axis: Option<Option<String>>,
    pub group_by: Option<Option<String>>,
    pub aggregation: Option<Aggregation>,
    pub sort_by: Option<Option<String>>,
    pub sort_direction: Option<SortDirection>,
    pub top_n: Option<Option<usize>>,
    pub filters: Option<Vec<Value>>,
    pub plotly_config: Option<ChartTemplate>,
    pub source_file: Option<Option<String>>,
    pub raw_data: Option<Option<Arc<Vec<Row>>>>,
    pub processed_data: Option<Vec<Row>>,
    pub columns: Option<Vec<String>>,
    pub column_types: Option<ColumnTypes>,
    pub loading: Option<bool>,
    pub error: Option<Option<String>>,
}

impl StateUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn loading(loading: bool) -> Self {
        Self {
            loading: Some(loading),
            ..Self::default()
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            error: Some(Some(message.into())),
            ..Self::default()
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn chart_type(mut self, chart_type: impl Into<ChartType>) -> Self {
        self.chart_type = Some(chart_type.into());
        self
    }

    pub fn x_axis(mut self, column: Option<&str>) -> Self {
        self.x_axis = Some(column.map(str::to_string));
        self
    }

    pub fn y_axis(mut self, column: Option<&str>) -> Self {
        self.y_axis = Some(column.map(str::to_string));
        self
    }

    pub fn group_by(mut self, column: Option<&str>) -> Self {
        self.group_by = Some(column.map(str::to_string));
        self
    }

    pub fn aggregation(mut self, aggregation: Aggregation) -> Self {
        self.aggregation = Some(aggregation);
        self
    }

    pub fn sort_by(mut self, column: Option<&str>, direction: SortDirection) -> Self {
        self.sort_by = Some(column.map(str::to_string));
        self.sort_direction = Some(direction);
        self
    }

    pub fn top_n(mut self, top_n: Option<usize>) -> Self {
        self.top_n = Some(top_n);
        self
    }

    /// Mapping fields that are set; `aggregation` always applies.
    pub fn from_mapping(mapping: Mapping) -> Self {
        Self {
            x_axis: mapping.x.map(Some),
            y_axis: mapping.y.map(Some),
            group_by: mapping.group_by.map(Some),
            aggregation: Some(mapping.aggregation),
            ..Self::default()
        }
    }

    /// Advanced settings that are set; direction and filters always apply.
    pub fn from_advanced(settings: AdvancedSettings) -> Self {
        Self {
            sort_by: settings.sort_by.map(Some),
            sort_direction: Some(settings.sort_direction),
            top_n: settings.top_n.map(Some),
            filters: Some(settings.filters),
            ..Self::default()
        }
    }

    /// Only the `loading` and `error` flags are touched (or nothing at all)
    pub fn is_transient_only(&self) -> bool {
        let Self {
            id,
            name,
            description,
            chart_type,
            x_axis,
            y_axis,
            group_by,
            aggregation,
            sort_by,
            sort_direction,
            top_n,
            filters,
            plotly_config,
            source_file,
            raw_data,
            processed_data,
            columns,
            column_types,
            loading: _,
            error: _,
        } = self;

        id.is_none()
            && name.is_none()
            && description.is_none()
            && chart_type.is_none()
            && x_axis.is_none()
            && y_axis.is_none()
            && group_by.is_none()
            && aggregation.is_none()
            && sort_by.is_none()
            && sort_direction.is_none()
            && top_n.is_none()
            && filters.is_none()
            && plotly_config.is_none()
            && source_file.is_none()
            && raw_data.is_none()
            && processed_data.is_none()
            && columns.is_none()
            && column_types.is_none()
    }

    /// Write the update into `state`.
    ///
    /// Returns true when a field feeding the derived chart changed value; raw
    /// data counts as changed when it is a different allocation.
    pub(crate) fn apply(self, state: &mut AppState) -> bool {
        let update = self;
        let mut relevant = false;

        macro_rules! replace {
            ($field:ident) => {
                if let Some(value) = update.$field {
                    state.$field = value;
                }
            };
            ($field:ident, tracked) => {
                if let Some(value) = update.$field {
                    relevant |= state.$field != value;
                    state.$field = value;
                }
            };
        }

        replace!(id);
        replace!(name);
        replace!(description);
        replace!(chart_type, tracked);
        replace!(x_axis, tracked);
        replace!(y_axis, tracked);
        replace!(group_by, tracked);
        replace!(aggregation, tracked);
        replace!(sort_by, tracked);
        replace!(sort_direction, tracked);
        replace!(top_n, tracked);
        replace!(filters, tracked);
        replace!(plotly_config);
        replace!(source_file);
        replace!(processed_data);
        replace!(columns);
        replace!(column_types);
        replace!(loading);
        replace!(error);

        if let Some(raw_data) = update.raw_data {
            relevant |= !same_rows(&state.raw_data, &raw_data);
            state.raw_data = raw_data;
        }

        relevant
    }
}

fn same_rows(a: &Option<Arc<Vec<Row>>>, b: &Option<Arc<Vec<Row>>>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => Arc::ptr_eq(a, b),
        (None, None) => true,
        _ => false,
    }
}
