//! Trace and layout generation for the plotting library

use serde_json::{Map, Value, json};

use super::Row;
use super::transform::TransformConfig;
use super::types::ColumnType;
use crate::constants::style::*;
use crate::state::ChartType;
use crate::template::ChartTemplate;

/// Traces plus layout, ready to be layered over a chart preset
#[derive(Debug, Clone, PartialEq)]
pub struct FormattedChart {
    pub traces: Vec<Value>,
    pub layout: Value,
}

impl FormattedChart {
    pub fn into_template(self) -> ChartTemplate {
        json!({ "data": self.traces, "layout": self.layout })
    }
}

/// Build traces and layout from processed rows.
///
/// With `group_by` set there is one trace per group value, named after it, in
/// the order groups are first seen; otherwise exactly one trace. A trace only
/// carries the `x`/`y` columns that are mapped.
pub fn format_for_traces(rows: &[Row], config: &TransformConfig) -> FormattedChart {
    profiling::scope!("format_for_traces");

    let layout = layout(config);
    let x_field = config.x_axis.as_deref();
    let y_field = config.y_axis.as_deref();

    let traces = match config.group_by.as_deref() {
        Some(group_field) => partition(rows, group_field)
            .into_iter()
            .enumerate()
            .map(|(index, (name, members))| {
                let mut trace = trace(&members, x_field, y_field, &config.chart_type, index);
                trace.insert("name".to_string(), json!(name));
                Value::Object(trace)
            })
            .collect(),
        None => {
            let members: Vec<&Row> = rows.iter().collect();
            vec![Value::Object(trace(&members, x_field, y_field, &config.chart_type, 0))]
        }
    };

    FormattedChart { traces, layout }
}

fn partition<'a>(rows: &'a [Row], field: &str) -> Vec<(String, Vec<&'a Row>)> {
    let mut groups: Vec<(String, Vec<&'a Row>)> = Vec::new();
    for row in rows {
        let name = group_name(row.get(field));
        match groups.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, members)) => members.push(row),
            None => groups.push((name, vec![row])),
        }
    }
    groups
}

fn group_name(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => "null".to_string(),
        Some(other) => other.to_string(),
    }
}

fn trace(
    members: &[&Row],
    x_field: Option<&str>,
    y_field: Option<&str>,
    chart_type: &ChartType,
    index: usize,
) -> Map<String, Value> {
    let column = |field: &str| -> Value {
        members
            .iter()
            .map(|row| row.get(field).cloned().unwrap_or(Value::Null))
            .collect()
    };

    let (plot_type, mode) = geometry(chart_type);
    let mut trace = Map::new();
    if let Some(x_field) = x_field {
        trace.insert("x".to_string(), column(x_field));
    }
    if let Some(y_field) = y_field {
        trace.insert("y".to_string(), column(y_field));
    }
    trace.insert("type".to_string(), json!(plot_type));
    if let Some(mode) = mode {
        trace.insert("mode".to_string(), json!(mode));
    }
    if let Value::Object(style) = trace_style(chart_type, index) {
        trace.extend(style);
    }
    trace
}

/// Plotting-library trace type and mode for a chart type.
///
/// Unknown chart types draw as plain scatter markers.
pub fn geometry(chart_type: &ChartType) -> (&'static str, Option<&'static str>) {
    match chart_type {
        ChartType::Line => ("scatter", Some("lines+markers")),
        ChartType::Area => ("scatter", Some("lines")),
        ChartType::Scatter => ("scatter", Some("markers")),
        ChartType::Bar => ("bar", None),
        ChartType::Histogram => ("histogram", None),
        ChartType::Box => ("box", None),
        ChartType::Violin => ("violin", None),
        ChartType::Other(_) => ("scatter", Some("markers")),
    }
}

fn rgb(index: usize) -> String {
    let (r, g, b) = PALETTE[index % PALETTE.len()];
    format!("rgb({}, {}, {})", r, g, b)
}

fn rgba(index: usize, alpha: f64) -> String {
    let (r, g, b) = PALETTE[index % PALETTE.len()];
    format!("rgba({}, {}, {}, {})", r, g, b, alpha)
}

/// Default styling for the `index`-th trace of a chart type
pub fn trace_style(chart_type: &ChartType, index: usize) -> Value {
    match chart_type {
        ChartType::Area => json!({
            "fill": "tozeroy",
            "fillcolor": rgba(index, AREA_FILL_ALPHA),
            "line": { "color": rgb(index) }
        }),
        ChartType::Line => json!({
            "line": { "width": LINE_WIDTH, "color": rgb(index) },
            "marker": { "size": LINE_MARKER_SIZE }
        }),
        ChartType::Bar => json!({
            "marker": { "color": rgb(index), "opacity": BAR_OPACITY }
        }),
        ChartType::Histogram | ChartType::Box | ChartType::Violin => json!({}),
        ChartType::Scatter | ChartType::Other(_) => json!({
            "marker": {
                "size": SCATTER_MARKER_SIZE,
                "color": rgb(index),
                "opacity": SCATTER_OPACITY
            }
        }),
    }
}

/// Plotting-library axis type for a column type
pub fn axis_type(column_type: ColumnType) -> &'static str {
    match column_type {
        ColumnType::Date => "date",
        ColumnType::Number => "linear",
        ColumnType::String | ColumnType::Unknown => "category",
    }
}

fn layout(config: &TransformConfig) -> Value {
    let (t, r, b, l) = MARGIN;
    json!({
        "title": config.title,
        "showlegend": true,
        "xaxis": {
            "title": config.x_axis,
            "type": axis_type(config.x_axis_type.unwrap_or_default())
        },
        "yaxis": {
            "title": config.y_axis,
            "type": axis_type(config.y_axis_type.unwrap_or_default())
        },
        "margin": { "t": t, "r": r, "b": b, "l": l },
        "autosize": true,
        "plot_bgcolor": BACKGROUND,
        "paper_bgcolor": BACKGROUND,
        "font": { "family": FONT_FAMILY }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(values: Vec<Value>) -> Vec<Row> {
        values
            .into_iter()
            .map(|v| v.as_object().cloned().unwrap())
            .collect()
    }

    fn config(chart_type: ChartType) -> TransformConfig {
        TransformConfig {
            chart_type,
            x_axis: Some("month".to_string()),
            y_axis: Some("sales".to_string()),
            title: "Revenue".to_string(),
            x_axis_type: Some(ColumnType::String),
            y_axis_type: Some(ColumnType::Number),
            ..Default::default()
        }
    }

    #[test]
    fn test_single_bar_trace() {
        let data = rows(vec![
            json!({ "month": "Jan", "sales": 10 }),
            json!({ "month": "Feb", "sales": 20 }),
        ]);
        let chart = format_for_traces(&data, &config(ChartType::Bar));

        assert_eq!(chart.traces.len(), 1);
        let trace = &chart.traces[0];
        assert_eq!(trace["x"], json!(["Jan", "Feb"]));
        assert_eq!(trace["y"], json!([10, 20]));
        assert_eq!(trace["type"], json!("bar"));
        assert!(trace.get("mode").is_none());
        assert_eq!(trace["marker"]["opacity"], json!(0.8));

        assert_eq!(chart.layout["title"], json!("Revenue"));
        assert_eq!(chart.layout["xaxis"]["title"], json!("month"));
        assert_eq!(chart.layout["xaxis"]["type"], json!("category"));
        assert_eq!(chart.layout["yaxis"]["type"], json!("linear"));
        assert_eq!(chart.layout["plot_bgcolor"], json!("white"));
        assert_eq!(chart.layout["font"]["family"], json!(FONT_FAMILY));
    }

    #[test]
    fn test_grouped_traces_in_first_seen_order() {
        let data = rows(vec![
            json!({ "month": "Jan", "sales": 1, "region": "west" }),
            json!({ "month": "Jan", "sales": 2, "region": "east" }),
            json!({ "month": "Feb", "sales": 3, "region": "west" }),
        ]);
        let mut cfg = config(ChartType::Line);
        cfg.group_by = Some("region".to_string());
        let chart = format_for_traces(&data, &cfg);

        assert_eq!(chart.traces.len(), 2);
        assert_eq!(chart.traces[0]["name"], json!("west"));
        assert_eq!(chart.traces[0]["y"], json!([1, 3]));
        assert_eq!(chart.traces[1]["name"], json!("east"));
        assert_eq!(chart.traces[0]["mode"], json!("lines+markers"));
        assert_ne!(chart.traces[0]["line"]["color"], chart.traces[1]["line"]["color"]);
    }

    #[test]
    fn test_unknown_type_is_scatter_markers() {
        let data = rows(vec![json!({ "month": "Jan", "sales": 1 })]);
        let chart = format_for_traces(&data, &config(ChartType::from("sunburst")));
        assert_eq!(chart.traces[0]["type"], json!("scatter"));
        assert_eq!(chart.traces[0]["mode"], json!("markers"));
    }

    #[test]
    fn test_y_only_trace_without_x_field() {
        let data = rows(vec![
            json!({ "month": "Jan", "sales": 1 }),
            json!({ "month": "Feb", "sales": 4 }),
        ]);
        let mut cfg = config(ChartType::Box);
        cfg.x_axis = None;
        let chart = format_for_traces(&data, &cfg);

        assert_eq!(chart.traces.len(), 1);
        assert!(chart.traces[0].get("x").is_none());
        assert_eq!(chart.traces[0]["y"], json!([1, 4]));
        assert_eq!(chart.layout["xaxis"]["title"], Value::Null);
    }

    #[test]
    fn test_no_rows_still_one_trace() {
        let chart = format_for_traces(&[], &config(ChartType::Bar));
        assert_eq!(chart.traces.len(), 1);
        assert_eq!(chart.traces[0]["x"], json!([]));

        let mut cfg = config(ChartType::Bar);
        cfg.group_by = Some("region".to_string());
        assert!(format_for_traces(&[], &cfg).traces.is_empty());
    }

    #[test]
    fn test_axis_types() {
        assert_eq!(axis_type(ColumnType::Date), "date");
        assert_eq!(axis_type(ColumnType::Number), "linear");
        assert_eq!(axis_type(ColumnType::String), "category");
        assert_eq!(axis_type(ColumnType::Unknown), "category");
    }
}
