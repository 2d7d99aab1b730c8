//! Built-in chart templates
//!
//! Per-type defaults, advanced option layers and the standard interaction
//! options, layered by [`chart_config`].

use serde_json::{Value, json};

use super::{ChartTemplate, merge, merge_all};
use crate::data::Row;
use crate::state::ChartType;

/// Per-type default template. Types without their own preset use the line template.
pub fn default_template(chart_type: &ChartType) -> ChartTemplate {
    match chart_type {
        ChartType::Bar => json!({
            "data": [{
                "type": "bar",
                "x": [],
                "y": [],
                "marker": { "color": "#1f77b4", "opacity": 0.8 },
                "name": "Series 1",
                "text": [],
                "textposition": "auto"
            }],
            "layout": base_layout("Bar Chart", "Categories", "Values", json!({
                "showlegend": false,
                "bargap": 0.3,
                "bargroupgap": 0.1
            }))
        }),
        ChartType::Scatter => json!({
            "data": [{
                "type": "scatter",
                "mode": "markers",
                "x": [],
                "y": [],
                "marker": {
                    "size": 10,
                    "color": "#ff7f0e",
                    "opacity": 0.7,
                    "line": { "color": "white", "width": 1 }
                },
                "name": "Points"
            }],
            "layout": base_layout("Scatter Plot", "X Axis", "Y Axis", json!({
                "showlegend": false,
                "hovermode": "closest"
            }))
        }),
        ChartType::Histogram => json!({
            "data": [{
                "type": "histogram",
                "x": [],
                "marker": {
                    "color": "#17becf",
                    "opacity": 0.7,
                    "line": { "color": "white", "width": 0.5 }
                },
                "name": "Distribution",
                "autobinx": true,
                "histnorm": ""
            }],
            "layout": base_layout("Histogram", "Values", "Frequency", json!({
                "showlegend": false,
                "bargap": 0.05
            }))
        }),
        _ => json!({
            "data": [{
                "type": "scatter",
                "mode": "lines+markers",
                "x": [],
                "y": [],
                "line": { "width": 2, "color": "#2ca02c", "shape": "linear" },
                "marker": { "size": 6, "symbol": "circle", "opacity": 0.7 },
                "name": "Series 1"
            }],
            "layout": base_layout("Line Chart", "X Axis", "Y Axis", json!({
                "showlegend": true,
                "legend": { "x": 1, "y": 1 },
                "hovermode": "closest"
            }))
        }),
    }
}

fn base_layout(title: &str, x_title: &str, y_title: &str, extra: Value) -> Value {
    let layout = json!({
        "template": "plotly_white",
        "title": { "text": title, "font": { "size": 24 } },
        "xaxis": {
            "title": { "text": x_title, "font": { "size": 14 } },
            "showgrid": true,
            "gridcolor": "#E1E1E1"
        },
        "yaxis": {
            "title": { "text": y_title, "font": { "size": 14 } },
            "showgrid": true,
            "gridcolor": "#E1E1E1"
        },
        "plot_bgcolor": "#FFFFFF",
        "paper_bgcolor": "#FFFFFF",
        "margin": { "l": 60, "r": 30, "b": 60, "t": 80 }
    });
    merge(&layout, &extra)
}

/// Advanced options shared by every chart type
pub fn general_advanced() -> ChartTemplate {
    json!({
        "layout": {
            "updatemenus": [],
            "sliders": [],
            "annotations": [],
            "shapes": []
        },
        "config": {
            "scrollZoom": true,
            "editable": false,
            "staticPlot": false,
            "toImageButtonOptions": {
                "format": "png",
                "filename": "custom_chart",
                "height": 800,
                "width": 1200,
                "scale": 2
            },
            "modeBarButtonsToAdd": [],
            "modeBarButtonsToRemove": []
        }
    })
}

/// Advanced options for one chart type, an empty mapping when it has none
pub fn advanced_template(chart_type: &ChartType) -> ChartTemplate {
    match chart_type {
        ChartType::Line => json!({
            "data": [{
                "connectgaps": false,
                "fill": "none",
                "line": { "dash": "solid", "shape": "linear", "smoothing": 1 },
                "transforms": []
            }]
        }),
        ChartType::Bar => json!({
            "data": [{
                "orientation": "v",
                "textangle": 0,
                "textposition": "auto",
                "transforms": [
                    { "type": "sort", "enabled": false, "target": "y", "order": "ascending" },
                    {
                        "type": "aggregate",
                        "enabled": false,
                        "aggregations": [{ "target": "y", "func": "sum", "enabled": true }]
                    }
                ]
            }]
        }),
        ChartType::Scatter => json!({
            "data": [{
                "mode": "markers",
                "transforms": [{ "type": "groupby", "enabled": false, "groups": [], "styles": [] }]
            }]
        }),
        ChartType::Histogram => json!({
            "data": [{
                "histfunc": "count",
                "histnorm": "",
                "nbinsx": 0,
                "autobinx": true,
                "cumulative": { "enabled": false },
                "transforms": []
            }]
        }),
        _ => json!({}),
    }
}

/// Standard interaction options for the plotting library
pub fn interaction_options(chart_type: &ChartType) -> Value {
    json!({
        "responsive": true,
        "displayModeBar": true,
        "modeBarButtonsToRemove": ["lasso2d", "select2d"],
        "displaylogo": false,
        "toImageButtonOptions": {
            "format": "png",
            "filename": format!("{}_chart", chart_type.as_str()),
            "height": 800,
            "width": 1200,
            "scale": 2
        }
    })
}

/// Build the full template for a chart type.
///
/// Layers, later wins: type default, global advanced, type advanced, then the
/// caller's interaction options under `config`. A `null` `user_options` adds
/// nothing.
pub fn chart_config(chart_type: &ChartType, user_options: &Value) -> ChartTemplate {
    let user_layer = match user_options {
        Value::Null => json!({}),
        options => json!({ "config": options }),
    };
    merge_all([
        &default_template(chart_type),
        &json!({ "config": interaction_options(chart_type) }),
        &general_advanced(),
        &advanced_template(chart_type),
        &user_layer,
    ])
}

/// Clear the data arrays of every trace while keeping its styling.
pub fn strip_data(config: &ChartTemplate) -> ChartTemplate {
    let mut stripped = config.clone();
    if let Some(traces) = stripped.get_mut("data").and_then(Value::as_array_mut) {
        for trace in traces.iter_mut().filter_map(Value::as_object_mut) {
            trace.insert("x".to_string(), json!([]));
            trace.insert("y".to_string(), json!([]));
            if trace.contains_key("text") {
                trace.insert("text".to_string(), json!([]));
            }
        }
    }
    stripped
}

/// Write two columns into the first trace and name the axes after them.
///
/// Histograms only take `x`. Returns the config unchanged when there are no
/// rows, no field names, or no trace to fill.
pub fn fill_data(
    config: &ChartTemplate,
    rows: &[Row],
    x_field: Option<&str>,
    y_field: Option<&str>,
) -> ChartTemplate {
    let (Some(x_field), Some(y_field)) = (x_field, y_field) else {
        return config.clone();
    };
    if rows.is_empty() {
        return config.clone();
    }

    let mut updated = config.clone();
    let column = |field: &str| -> Value {
        rows.iter()
            .map(|row| row.get(field).cloned().unwrap_or(Value::Null))
            .collect()
    };

    if let Some(trace) = updated
        .get_mut("data")
        .and_then(|data| data.get_mut(0))
        .and_then(Value::as_object_mut)
    {
        let is_histogram = trace.get("type").and_then(Value::as_str) == Some("histogram");
        trace.insert("x".to_string(), column(x_field));
        if !is_histogram {
            trace.insert("y".to_string(), column(y_field));
        }
    } else {
        return config.clone();
    }

    for (axis, field) in [("xaxis", x_field), ("yaxis", y_field)] {
        let title = &mut updated["layout"][axis]["title"];
        if title.is_object() {
            title["text"] = json!(field);
        } else {
            *title = json!({ "text": field });
        }
    }

    updated
}
