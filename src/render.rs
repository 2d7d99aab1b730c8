//! Rendering seam for the external plotting library

use std::thread;
use std::time::Duration;

use serde_json::{Value, json};

use crate::config::ClientConfig;
use crate::constants::style::{BACKGROUND, FONT_FAMILY, RENDER_MARGIN};
use crate::error::{Result, VizError};
use crate::template::{ChartTemplate, merge};

/// The plotting library, as seen from the renderer
pub trait RenderAdapter {
    /// Draw a new chart, replacing whatever the container showed
    fn new_plot(&mut self, data: &[Value], layout: &Value, options: &Value) -> Result<()>;

    /// Update layout attributes of the chart in place
    fn relayout(&mut self, _update: &Value) -> Result<()> {
        Ok(())
    }

    /// Release the chart and its container resources
    fn purge(&mut self) {}
}

/// Layout every rendered chart starts from
pub fn default_layout() -> Value {
    let (t, r, b, l) = RENDER_MARGIN;
    json!({
        "margin": { "t": t, "r": r, "b": b, "l": l },
        "autosize": true,
        "showlegend": true,
        "hovermode": "closest",
        "plot_bgcolor": BACKGROUND,
        "paper_bgcolor": BACKGROUND,
        "font": { "family": FONT_FAMILY }
    })
}

/// Interaction options every rendered chart starts from
pub fn default_options() -> Value {
    json!({
        "responsive": true,
        "displayModeBar": true,
        "modeBarButtonsToRemove": ["sendDataToCloud", "lasso2d", "select2d"],
        "displaylogo": false
    })
}

/// Owns the one chart container and serializes render calls on it
pub struct ChartRenderer<A: RenderAdapter> {
    adapter: A,
    first_render_delay: Duration,
    rendered_once: bool,
    current: Option<ChartTemplate>,
}

impl<A: RenderAdapter> ChartRenderer<A> {
    pub fn new(adapter: A, config: &ClientConfig) -> Self {
        Self::with_delay(adapter, config.first_render_delay())
    }

    pub fn with_delay(adapter: A, first_render_delay: Duration) -> Self {
        Self {
            adapter,
            first_render_delay,
            rendered_once: false,
            current: None,
        }
    }

    /// Draw `config`.
    ///
    /// The config's layout and options are merged over the defaults. Fails with
    /// a validation error when `data` is not a sequence, leaving the previous
    /// chart in place.
    pub fn render(&mut self, config: &ChartTemplate) -> Result<()> {
        profiling::scope!("ChartRenderer::render");

        let Some(data) = config.get("data").and_then(Value::as_array) else {
            return Err(VizError::Validation(
                "Invalid chart configuration: missing or invalid data".to_string(),
            ));
        };
        let layout = merge(&default_layout(), config.get("layout").unwrap_or(&Value::Null));
        let options = merge(&default_options(), config.get("config").unwrap_or(&Value::Null));

        if !self.rendered_once {
            thread::sleep(self.first_render_delay);
            self.rendered_once = true;
        }

        if let Err(err) = self.adapter.new_plot(data, &layout, &options) {
            err.report("ChartRenderer::render");
            return Err(err);
        }
        tracing::debug!(traces = data.len(), "chart rendered");

        self.current = Some(json!({ "data": data, "layout": layout, "config": options }));
        Ok(())
    }

    /// Resize the current chart; a no-op before the first render
    pub fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        if self.current.is_none() {
            return Ok(());
        }
        self.adapter
            .relayout(&json!({ "width": width, "height": height }))
    }

    /// The last configuration handed to the adapter
    pub fn current(&self) -> Option<&ChartTemplate> {
        self.current.as_ref()
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    pub fn destroy(&mut self) {
        self.adapter.purge();
        self.current = None;
    }
}
