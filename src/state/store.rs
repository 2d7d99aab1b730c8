//! Observable store for the visualization being edited

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::Value;

use super::{
    AdvancedSettings, AppState, Mapping, RecordConfig, SessionPhase, StateUpdate,
    VisualizationRecord, transform_config,
};
use crate::data::source::parse_file;
use crate::data::{DataFile, LoadedTable, Row};
use crate::error::{Result, VizError};
use crate::perf::{RecomputeRequest, RecomputeWorker, WorkerResult};
use crate::template::merge;

type Subscriber = Box<dyn FnMut(&AppState) -> Result<()>>;

/// Handle returned by [`VisualizationState::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription(u64);

/// Holds the [`AppState`] and notifies subscribers after every change.
///
/// Recomputation of processed rows and the chart template runs on a
/// [`RecomputeWorker`]; call [`poll`](Self::poll) (or
/// [`wait_idle`](Self::wait_idle)) to apply finished results.
pub struct VisualizationState {
    state: AppState,
    phase: SessionPhase,
    subscribers: Vec<(Subscription, Subscriber)>,
    next_subscription: u64,
    worker: RecomputeWorker,
    /// Results requested before the last reset are dropped
    epoch: u64,
    interaction_options: Value,
}

impl Default for VisualizationState {
    fn default() -> Self {
        Self::new()
    }
}

impl VisualizationState {
    pub fn new() -> Self {
        Self::with_state(AppState::default())
    }

    /// Start from a prepared snapshot
    pub fn with_state(state: AppState) -> Self {
        Self {
            state,
            phase: SessionPhase::Empty,
            subscribers: Vec::new(),
            next_subscription: 0,
            worker: RecomputeWorker::spawn(),
            epoch: 0,
            interaction_options: Value::Null,
        }
    }

    /// Interaction options layered last into every derived template
    pub fn with_interaction_options(mut self, options: Value) -> Self {
        self.interaction_options = options;
        self
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn phase(&self) -> SessionPhase {
        if self.state.has_unsaved_changes {
            SessionPhase::Dirty
        } else {
            self.phase
        }
    }

    /// Recomputations requested but not yet applied
    pub fn is_busy(&self) -> bool {
        self.worker.is_busy()
    }

    pub fn subscribe<F>(&mut self, callback: F) -> Subscription
    where
        F: FnMut(&AppState) -> Result<()> + 'static,
    {
        let subscription = Subscription(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push((subscription, Box::new(callback)));
        subscription
    }

    /// Returns false when the subscription was already gone
    pub fn unsubscribe(&mut self, subscription: Subscription) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(id, _)| *id != subscription);
        self.subscribers.len() != before
    }

    /// Merge `update` into the state and notify subscribers once.
    ///
    /// Marks the state unsaved unless only `loading`/`error` are set. A change to
    /// a mapping field or to the raw data schedules a recomputation when data is
    /// loaded; its result is applied by a later `poll`.
    pub fn set_state(&mut self, update: StateUpdate) {
        let transient = update.is_transient_only();
        let relevant = update.apply(&mut self.state);
        if !transient {
            self.state.has_unsaved_changes = true;
        }
        if relevant {
            self.schedule_recompute();
        }
        self.notify();
    }

    /// Apply the mapping columns that are set
    pub fn set_mapping(&mut self, mapping: Mapping) {
        self.set_state(StateUpdate::from_mapping(mapping));
    }

    /// Apply the advanced settings that are set
    pub fn set_advanced(&mut self, settings: AdvancedSettings) {
        self.set_state(StateUpdate::from_advanced(settings));
    }

    /// Parse a data file and make its rows the raw data.
    ///
    /// On failure the previous data stays in place and the error is stored in
    /// `error` as well as returned.
    pub fn set_data_source(&mut self, file: &DataFile) -> Result<()> {
        self.set_state(StateUpdate::loading(true));
        match parse_file(file) {
            Ok(table) => {
                self.load_table(table, file.name().to_string());
                Ok(())
            }
            Err(err) => Err(self.record_error(err, "VisualizationState::set_data_source")),
        }
    }

    /// Use rows that were already fetched, e.g. from the backend
    pub fn set_rows(&mut self, rows: Vec<Row>, source: impl Into<String>) -> Result<()> {
        match LoadedTable::from_rows(rows) {
            Ok(table) => {
                self.load_table(table, source.into());
                Ok(())
            }
            Err(err) => Err(self.record_error(err, "VisualizationState::set_rows")),
        }
    }

    fn load_table(&mut self, table: LoadedTable, source: String) {
        tracing::info!(
            source = %source,
            rows = table.rows.len(),
            columns = table.columns.len(),
            "data loaded"
        );
        self.phase = SessionPhase::DataLoaded;
        self.set_state(StateUpdate {
            source_file: Some(Some(source)),
            raw_data: Some(Some(Arc::new(table.rows))),
            columns: Some(table.columns),
            column_types: Some(table.column_types),
            loading: Some(false),
            error: Some(None),
            ..StateUpdate::default()
        });
    }

    /// Log `err`, surface it through `error` and hand it back
    pub fn record_error(&mut self, err: VizError, context: &str) -> VizError {
        err.report(context);
        self.set_state(StateUpdate {
            loading: Some(self.worker.is_busy()),
            error: Some(Some(err.user_message())),
            ..StateUpdate::default()
        });
        err
    }

    pub fn clear_error(&mut self) {
        self.set_state(StateUpdate {
            error: Some(None),
            ..StateUpdate::default()
        });
    }

    /// The persisted fields of the current state
    pub fn export_config(&self) -> VisualizationRecord {
        VisualizationRecord {
            id: self.state.id,
            name: self.state.name.clone(),
            description: self.state.description.clone(),
            config: RecordConfig {
                chart_type: self.state.chart_type.clone(),
                mapping: self.state.mapping(),
                advanced: self.state.advanced(),
                plotly: self.state.plotly_config.clone(),
            },
        }
    }

    /// Load a saved record.
    ///
    /// Missing fields take their defaults; the stored template is deep-merged
    /// over the current one. The state counts as saved afterwards.
    pub fn import_config(&mut self, record: &Value) -> Result<()> {
        const CONTEXT: &str = "VisualizationState::import_config";

        if !record.get("config").is_some_and(Value::is_object) {
            let err = VizError::ConfigStructure("Invalid configuration structure".to_string());
            return Err(self.record_error(err, CONTEXT));
        }
        let record = match serde_json::from_value::<VisualizationRecord>(record.clone()) {
            Ok(record) => record.normalized(),
            Err(err) => return Err(self.record_error(err.into(), CONTEXT)),
        };

        let RecordConfig {
            chart_type,
            mapping,
            advanced,
            plotly,
        } = record.config;
        let plotly_config = if plotly.is_object() {
            merge(&self.state.plotly_config, &plotly)
        } else {
            self.state.plotly_config.clone()
        };

        let update = StateUpdate {
            id: Some(record.id),
            name: Some(record.name),
            description: Some(record.description),
            chart_type: Some(chart_type),
            x_axis: Some(mapping.x),
            y_axis: Some(mapping.y),
            group_by: Some(mapping.group_by),
            aggregation: Some(mapping.aggregation),
            sort_by: Some(advanced.sort_by),
            sort_direction: Some(advanced.sort_direction),
            top_n: Some(advanced.top_n),
            filters: Some(advanced.filters),
            plotly_config: Some(plotly_config),
            error: Some(None),
            ..StateUpdate::default()
        };
        update.apply(&mut self.state);
        self.state.has_unsaved_changes = false;
        if self.state.id.is_some() {
            self.phase = SessionPhase::Saved;
        }
        tracing::info!(id = ?self.state.id, name = %self.state.name, "configuration imported");

        self.schedule_recompute();
        self.notify();
        Ok(())
    }

    /// Replace the chart template with hand-edited JSON text.
    ///
    /// Text that is not a JSON object is rejected as a validation error and the
    /// current template is kept.
    pub fn apply_config_edit(&mut self, text: &str) -> Result<()> {
        const CONTEXT: &str = "VisualizationState::apply_config_edit";

        let config = match serde_json::from_str::<Value>(text) {
            Ok(config) if config.is_object() => config,
            Ok(_) => {
                let err = VizError::Validation("Chart configuration must be a JSON object".to_string());
                return Err(self.record_error(err, CONTEXT));
            }
            Err(err) => {
                let err = VizError::Validation(format!("Invalid JSON: {}", err));
                return Err(self.record_error(err, CONTEXT));
            }
        };

        self.set_state(StateUpdate {
            plotly_config: Some(config),
            error: Some(None),
            ..StateUpdate::default()
        });
        Ok(())
    }

    /// Back to construction defaults, keeping id, name and description.
    ///
    /// Results of recomputations already in flight are discarded.
    pub fn reset_state(&mut self) {
        let AppState {
            id,
            name,
            description,
            ..
        } = std::mem::take(&mut self.state);
        self.state = AppState {
            id,
            name,
            description,
            ..AppState::default()
        };
        self.phase = SessionPhase::Empty;
        self.epoch += 1;
        tracing::debug!(epoch = self.epoch, "state reset");
        self.notify();
    }

    /// Record the id the backend assigned and clear the unsaved flag
    pub fn mark_saved(&mut self, id: i64) {
        self.state.id = Some(id);
        self.state.has_unsaved_changes = false;
        self.phase = SessionPhase::Saved;
        self.notify();
    }

    /// Apply finished recomputations, returns how many were applied
    pub fn poll(&mut self) -> usize {
        let mut applied = 0;
        while let Some(result) = self.worker.poll() {
            applied += usize::from(self.apply_result(result));
        }
        applied
    }

    /// Block until every scheduled recomputation has been applied.
    ///
    /// Returns false if `timeout` passed first.
    pub fn wait_idle(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while self.worker.is_busy() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.worker.recv_timeout(remaining) {
                Some(result) => {
                    self.apply_result(result);
                }
                None => return !self.worker.is_busy(),
            }
        }
        true
    }

    fn schedule_recompute(&mut self) {
        let Some(rows) = self.state.raw_data.clone() else {
            return;
        };
        let request = RecomputeRequest {
            epoch: self.epoch,
            rows,
            columns: self.state.columns.clone(),
            transform: transform_config(&self.state),
            interaction: self.interaction_options.clone(),
        };
        if self.worker.request(request) {
            self.state.loading = true;
        }
    }

    fn apply_result(&mut self, result: WorkerResult) -> bool {
        if result.epoch() != self.epoch {
            tracing::debug!(epoch = result.epoch(), "dropping stale recompute result");
            return false;
        }

        let mut update = StateUpdate::loading(self.worker.is_busy());
        match result {
            WorkerResult::Recomputed { derived, .. } => {
                if derived.configured && self.phase == SessionPhase::DataLoaded {
                    self.phase = SessionPhase::Configured;
                }
                update.processed_data = Some(derived.processed);
                update.plotly_config = Some(derived.plotly_config);
                update.error = Some(None);
            }
            WorkerResult::Error { msg, .. } => {
                tracing::warn!(error = %msg, "recompute failed");
                update.error = Some(Some(msg));
            }
        }

        // Derived fields follow the mapping; they do not count as an edit
        let unsaved = self.state.has_unsaved_changes;
        update.apply(&mut self.state);
        self.state.has_unsaved_changes = unsaved;
        self.notify();
        true
    }

    fn notify(&mut self) {
        let state = &self.state;
        for (subscription, callback) in self.subscribers.iter_mut() {
            match panic::catch_unwind(AssertUnwindSafe(|| callback(state))) {
                Ok(Ok(())) => {}
                Ok(Err(err)) => err.report("VisualizationState::notify"),
                Err(_) => {
                    tracing::error!(subscription = subscription.0, "subscriber panicked");
                }
            }
        }
    }
}
