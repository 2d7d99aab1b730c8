//! Chart templates
//!
//! A [`ChartTemplate`] is a plotting-library configuration held as a JSON value:
//! `data` (trace sequence), `layout` and `config` (interaction options).

mod merge;
pub mod presets;

pub use merge::{merge, merge_all};
pub use presets::{chart_config, fill_data, strip_data};

use serde_json::{Value, json};

use crate::constants::style::MARGIN;

/// A plotting-library configuration (`data`, `layout`, `config`)
pub type ChartTemplate = Value;

/// Template held by a fresh visualization before any data is processed
pub fn empty_template() -> ChartTemplate {
    let (t, r, b, l) = MARGIN;
    json!({
        "data": [],
        "layout": {
            "margin": { "t": t, "r": r, "b": b, "l": l },
            "autosize": true,
            "showlegend": true
        }
    })
}
