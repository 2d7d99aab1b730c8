//! User-level flows tying the state, the backend client and the config together

use std::time::Instant;

use serde_json::Value;

use crate::client::{Debouncer, PersistenceClient, Transport, VisualizationSummary};
use crate::config::ClientConfig;
use crate::data::DataFile;
use crate::data::source::validate_file;
use crate::error::Result;
use crate::state::VisualizationState;

/// One editing session: a visualization being built and the backend it is
/// saved to. Errors are recorded in the state and also returned.
pub struct Session<T: Transport> {
    state: VisualizationState,
    client: PersistenceClient<T>,
    config: ClientConfig,
    search: Debouncer,
    /// Server-side name of the uploaded data file
    uploaded_file: Option<String>,
}

impl<T: Transport> Session<T> {
    pub fn new(transport: T, config: ClientConfig) -> Self {
        let state = VisualizationState::new()
            .with_interaction_options(config.interaction_options.clone());
        Self {
            state,
            client: PersistenceClient::new(transport, config.base_url.clone()),
            search: Debouncer::new(config.search_debounce()),
            config,
            uploaded_file: None,
        }
    }

    pub fn state(&self) -> &VisualizationState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut VisualizationState {
        &mut self.state
    }

    pub fn client(&self) -> &PersistenceClient<T> {
        &self.client
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn uploaded_file(&self) -> Option<&str> {
        self.uploaded_file.as_deref()
    }

    /// Validate, parse locally, then upload the file.
    ///
    /// The parsed rows become the state's data only once the upload succeeds.
    pub fn upload(&mut self, file: &DataFile) -> Result<()> {
        const CONTEXT: &str = "Session::upload";

        if let Err(err) = validate_file(file, &self.config) {
            return Err(self.state.record_error(err, CONTEXT));
        }
        let table = match crate::data::source::parse_file(file) {
            Ok(table) => table,
            Err(err) => return Err(self.state.record_error(err, CONTEXT)),
        };
        let uploaded = match self.client.upload(file) {
            Ok(uploaded) => uploaded,
            Err(err) => return Err(self.state.record_error(err, CONTEXT)),
        };

        tracing::info!(file = file.name(), stored_as = %uploaded.filename, "file uploaded");
        self.state.set_rows(table.rows, file.name())?;
        self.uploaded_file = Some(uploaded.filename);
        Ok(())
    }

    /// Fetch the rows of a file uploaded earlier
    pub fn load_remote_data(&mut self, filename: &str) -> Result<()> {
        match self.client.load_data(filename) {
            Ok(response) => {
                self.state.set_rows(response.data, filename)?;
                self.uploaded_file = Some(filename.to_string());
                Ok(())
            }
            Err(err) => Err(self.state.record_error(err, "Session::load_remote_data")),
        }
    }

    /// Save the current record and mark the state saved; returns the id
    pub fn save(&mut self) -> Result<i64> {
        let record = self.state.export_config();
        match self.client.save(&record, self.uploaded_file.as_deref()) {
            Ok(response) => {
                tracing::info!(id = response.id, name = %record.name, "visualization saved");
                self.state.mark_saved(response.id);
                Ok(response.id)
            }
            Err(err) => Err(self.state.record_error(err, "Session::save")),
        }
    }

    /// Load a saved visualization into the state
    pub fn open(&mut self, id: i64) -> Result<()> {
        let record = match self.client.get(id) {
            Ok(record) => record,
            Err(err) => return Err(self.state.record_error(err, "Session::open")),
        };
        self.state.import_config(&record)
    }

    pub fn delete(&mut self, id: i64) -> Result<()> {
        match self.client.delete(id) {
            Ok(()) => {
                tracing::info!(id, "visualization deleted");
                Ok(())
            }
            Err(err) => Err(self.state.record_error(err, "Session::delete")),
        }
    }

    pub fn list(&mut self) -> Result<Vec<VisualizationSummary>> {
        match self.client.list() {
            Ok(list) => Ok(list),
            Err(err) => Err(self.state.record_error(err, "Session::list")),
        }
    }

    pub fn recent(&mut self) -> Result<Vec<VisualizationSummary>> {
        match self.client.recent() {
            Ok(list) => Ok(list),
            Err(err) => Err(self.state.record_error(err, "Session::recent")),
        }
    }

    /// Record a keystroke in the search box
    pub fn search_input(&mut self, query: impl Into<String>, now: Instant) {
        self.search.input(query, now);
    }

    /// Run the pending search once typing has paused.
    ///
    /// `None` while waiting; blank queries are dropped without a request.
    pub fn poll_search(&mut self, now: Instant) -> Option<Result<Vec<Value>>> {
        let query = self.search.poll(now)?;
        let query = query.trim();
        if query.is_empty() {
            return None;
        }
        let outcome = match self.client.search(query) {
            Ok(configs) => Ok(configs),
            Err(err) => Err(self.state.record_error(err, "Session::poll_search")),
        };
        Some(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::testing::MockTransport;
    use crate::error::VizError;
    use crate::state::{SessionPhase, StateUpdate};
    use serde_json::json;
    use std::time::Duration;

    const WAIT: Duration = Duration::from_secs(5);

    fn session(transport: MockTransport) -> Session<MockTransport> {
        Session::new(transport, ClientConfig::default())
    }

    #[test]
    fn test_upload_then_save() {
        let transport = MockTransport::default()
            .respond(200, json!({ "filename": "sales_1.csv" }))
            .respond(200, json!({ "id": 21, "message": "Visualization saved successfully" }));
        let mut session = session(transport);

        session
            .upload(&DataFile::new("sales.csv", "month,sales\nJan,10\nFeb,20\n"))
            .unwrap();
        assert_eq!(session.uploaded_file(), Some("sales_1.csv"));
        assert_eq!(session.state().state().row_count(), 2);

        session
            .state_mut()
            .set_state(StateUpdate::new().name("Sales").x_axis(Some("month")));
        assert!(session.state_mut().wait_idle(WAIT));

        assert_eq!(session.save().unwrap(), 21);
        assert_eq!(session.state().phase(), SessionPhase::Saved);
        assert_eq!(session.state().state().id, Some(21));

        let body = session.client().transport().last_body();
        assert_eq!(body["filename"], json!("sales_1.csv"));
        assert_eq!(body["config"]["mapping"]["x"], json!("month"));
    }

    #[test]
    fn test_interaction_options_reach_the_chart() {
        let transport = MockTransport::default().respond(200, json!({ "filename": "sales_1.csv" }));
        let config = ClientConfig {
            interaction_options: json!({
                "scrollZoom": true,
                "toImageButtonOptions": { "format": "svg" }
            }),
            ..ClientConfig::default()
        };
        let mut session = Session::new(transport, config);

        session
            .upload(&DataFile::new("sales.csv", "month,sales\nJan,10\nFeb,20\n"))
            .unwrap();
        session
            .state_mut()
            .set_state(StateUpdate::new().chart_type("bar").x_axis(Some("month")).y_axis(Some("sales")));
        assert!(session.state_mut().wait_idle(WAIT));

        let options = &session.state().state().plotly_config["config"];
        assert_eq!(options["scrollZoom"], json!(true));
        assert_eq!(options["toImageButtonOptions"]["format"], json!("svg"));
        assert_eq!(options["toImageButtonOptions"]["filename"], json!("bar_chart"));
        assert_eq!(options["responsive"], json!(true));
    }

    #[test]
    fn test_invalid_file_never_uploads() {
        let mut session = session(MockTransport::default());
        let err = session.upload(&DataFile::new("notes.txt", "hi")).unwrap_err();

        assert!(matches!(err, VizError::Validation(_)));
        assert!(session.client().transport().requests.is_empty());
        assert!(session.state().state().error.is_some());
    }

    #[test]
    fn test_failed_upload_keeps_state() {
        let transport = MockTransport::default().respond(413, json!({ "error": "Too large" }));
        let mut session = session(transport);

        let err = session.upload(&DataFile::new("a.csv", "x\n1\n")).unwrap_err();
        assert!(matches!(err, VizError::Network { status: 413, .. }));
        assert!(!session.state().state().has_data());
        assert_eq!(session.state().state().error.as_deref(), Some("Too large"));
    }

    #[test]
    fn test_open_imports_record() {
        let transport = MockTransport::default().respond(
            200,
            json!({
                "id": 3,
                "name": "Loans",
                "description": "",
                "config": { "type": "line", "mapping": { "x": "month" } }
            }),
        );
        let mut session = session(transport);
        session.open(3).unwrap();

        let state = session.state().state();
        assert_eq!(state.id, Some(3));
        assert_eq!(state.name, "Loans");
        assert_eq!(session.state().phase(), SessionPhase::Saved);
    }

    #[test]
    fn test_load_remote_data() {
        let transport = MockTransport::default().respond(
            200,
            json!({ "data": [{ "x": 1, "y": 2 }], "columns": ["x", "y"] }),
        );
        let mut session = session(transport);
        session.load_remote_data("stored.csv").unwrap();
        assert_eq!(session.uploaded_file(), Some("stored.csv"));
        assert_eq!(session.state().state().columns, vec!["x", "y"]);
    }

    #[test]
    fn test_debounced_search() {
        let transport = MockTransport::default()
            .respond(200, json!({ "status": "success", "configs": [{ "id": 1 }] }));
        let mut session = session(transport);
        let start = Instant::now();

        session.search_input("circ", start);
        assert!(session.poll_search(start + Duration::from_millis(100)).is_none());
        let configs = session
            .poll_search(start + Duration::from_millis(300))
            .unwrap()
            .unwrap();
        assert_eq!(configs.len(), 1);
        assert_eq!(session.client().transport().requests.len(), 1);

        session.search_input("   ", start);
        assert!(session.poll_search(start + Duration::from_secs(1)).is_none());
        assert_eq!(session.client().transport().requests.len(), 1);
    }
}
