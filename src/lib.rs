//! Reactive core of a chart builder.
//!
//! Load a CSV or Excel file, map its columns onto a chart, and get back a
//! plotting-library configuration built from per-type presets. Edits go through
//! an observable [`VisualizationState`]; finished configurations are saved to a
//! backend through a [`PersistenceClient`].

pub mod client;
pub mod config;
pub mod constants;
pub mod data;
pub mod error;
pub mod logging;
pub mod perf;
pub mod render;
pub mod session;
pub mod state;
pub mod template;

pub use client::{Debouncer, PersistenceClient, Transport};
pub use config::ClientConfig;
pub use data::{DataFile, Row};
pub use error::{Result, VizError};
pub use render::{ChartRenderer, RenderAdapter};
pub use session::Session;
pub use state::{
    AppState, ChartType, SessionPhase, StateUpdate, Subscription, VisualizationRecord,
    VisualizationState,
};
pub use template::{ChartTemplate, merge};
