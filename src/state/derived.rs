//! Derived chart data: processed rows plus the full plotting template

use serde_json::Value;

use super::AppState;
use crate::data::{Row, TransformConfig, format_for_traces, process_data};
use crate::error::{Result, VizError};
use crate::template::{ChartTemplate, chart_config, merge};

/// Output of one recomputation
#[derive(Debug, Clone, PartialEq)]
pub struct Derived {
    pub processed: Vec<Row>,
    pub plotly_config: ChartTemplate,
    /// An x column was mapped, so the chart has traces to show
    pub configured: bool,
}

/// Snapshot of the mapping fields the pipeline needs
pub fn transform_config(state: &AppState) -> TransformConfig {
    let column_type = |field: &Option<String>| {
        field
            .as_ref()
            .and_then(|name| state.column_types.get(name))
            .copied()
    };

    TransformConfig {
        chart_type: state.chart_type.clone(),
        x_axis: state.x_axis.clone(),
        y_axis: state.y_axis.clone(),
        group_by: state.group_by.clone(),
        aggregation: state.aggregation,
        sort_by: state.sort_by.clone(),
        sort_direction: state.sort_direction,
        top_n: state.top_n,
        title: state.name.clone(),
        x_axis_type: column_type(&state.x_axis),
        y_axis_type: column_type(&state.y_axis),
    }
}

/// Run the pipeline and layer its traces and layout over the chart preset.
///
/// Every mapped column must exist in `columns`.
pub fn derive_chart(
    rows: &[Row],
    transform: &TransformConfig,
    columns: &[String],
    interaction: &Value,
) -> Result<Derived> {
    let mapped = [&transform.x_axis, &transform.y_axis, &transform.group_by];
    for column in mapped.into_iter().flatten() {
        if !columns.contains(column) {
            return Err(VizError::ColumnNotFound {
                column: column.clone(),
            });
        }
    }

    let processed = process_data(rows, transform);
    let chart = format_for_traces(&processed, transform);
    let plotly_config = merge(
        &chart_config(&transform.chart_type, interaction),
        &chart.into_template(),
    );

    Ok(Derived {
        processed,
        plotly_config,
        configured: transform.x_axis.is_some(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ColumnType;
    use crate::state::{Aggregation, ChartType};
    use serde_json::json;

    fn rows() -> Vec<Row> {
        [
            json!({ "month": "Jan", "sales": 10 }),
            json!({ "month": "Feb", "sales": 20 }),
        ]
        .into_iter()
        .map(|v| v.as_object().cloned().unwrap())
        .collect()
    }

    fn columns() -> Vec<String> {
        vec!["month".to_string(), "sales".to_string()]
    }

    #[test]
    fn test_transform_config_from_state() {
        let mut state = AppState::default();
        state.name = "Revenue".to_string();
        state.x_axis = Some("month".to_string());
        state.aggregation = Aggregation::Sum;
        state.column_types.insert("month".to_string(), ColumnType::String);

        let transform = transform_config(&state);
        assert_eq!(transform.title, "Revenue");
        assert_eq!(transform.x_axis_type, Some(ColumnType::String));
        assert_eq!(transform.y_axis_type, None);
        assert_eq!(transform.aggregation, Aggregation::Sum);
    }

    #[test]
    fn test_derive_layers_over_preset() {
        let transform = TransformConfig {
            chart_type: ChartType::Bar,
            x_axis: Some("month".to_string()),
            y_axis: Some("sales".to_string()),
            ..Default::default()
        };
        let derived = derive_chart(&rows(), &transform, &columns(), &json!({ "displaylogo": true })).unwrap();

        assert!(derived.configured);
        let config = &derived.plotly_config;
        assert_eq!(config["data"].as_array().unwrap().len(), 1);
        assert_eq!(config["data"][0]["x"], json!(["Jan", "Feb"]));
        assert_eq!(config["layout"]["xaxis"]["title"], json!("month"));
        // preset layout keys survive under the derived layout
        assert_eq!(config["layout"]["bargap"], json!(0.3));
        assert_eq!(config["config"]["displaylogo"], json!(true));
    }

    #[test]
    fn test_derive_rejects_unknown_column() {
        let transform = TransformConfig {
            x_axis: Some("month".to_string()),
            group_by: Some("region".to_string()),
            ..Default::default()
        };
        let err = derive_chart(&rows(), &transform, &columns(), &Value::Null).unwrap_err();
        assert!(matches!(err, VizError::ColumnNotFound { ref column } if column == "region"));
    }

    #[test]
    fn test_derive_without_mapping() {
        let derived = derive_chart(&rows(), &TransformConfig::default(), &columns(), &Value::Null).unwrap();
        assert!(!derived.configured);
        assert_eq!(derived.processed, rows());
        let traces = derived.plotly_config["data"].as_array().unwrap();
        assert_eq!(traces.len(), 1);
        assert!(traces[0].get("x").is_none());
    }
}
