//! Persistence client for the visualization backend
//!
//! Requests are plain `http` values handed to a [`Transport`], so any HTTP
//! stack (or a test double) can carry them.

mod multipart;
pub mod search;

pub use search::Debouncer;

use http::header::{ACCEPT, CONTENT_TYPE};
use http::{Method, Request, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::{api, upload};
use crate::data::{DataFile, Row};
use crate::error::{Result, VizError};
use crate::state::VisualizationRecord;

/// Sends one request and returns the response, whatever its status
pub trait Transport {
    fn send(&mut self, request: Request<Vec<u8>>) -> Result<Response<Vec<u8>>>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn send(&mut self, request: Request<Vec<u8>>) -> Result<Response<Vec<u8>>> {
        (**self).send(request)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&mut self, request: Request<Vec<u8>>) -> Result<Response<Vec<u8>>> {
        (**self).send(request)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UploadResponse {
    /// Name the server stored the file under
    pub filename: String,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct DataResponse {
    pub data: Vec<Row>,
    pub columns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SaveResponse {
    pub id: i64,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// A saved visualization as listed by the backend
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualizationSummary {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub chart_type: Option<String>,
    pub category: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    visualizations: Vec<VisualizationSummary>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    configs: Vec<Value>,
}

/// Talks to the backend over a [`Transport`]. No retries.
pub struct PersistenceClient<T: Transport> {
    transport: T,
    base_url: String,
}

impl<T: Transport> PersistenceClient<T> {
    pub fn new(transport: T, base_url: impl Into<String>) -> Self {
        Self {
            transport,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Upload a data file as the `file` form field
    pub fn upload(&mut self, file: &DataFile) -> Result<UploadResponse> {
        let form = multipart::file_form(upload::FILE_FIELD, file);
        let request = Request::builder()
            .method(Method::POST)
            .uri(self.url(api::UPLOAD))
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, form.content_type)
            .body(form.body)?;
        tracing::debug!(file = file.name(), bytes = file.size(), "uploading data file");
        self.execute(request)
    }

    /// Rows of a previously uploaded file
    pub fn load_data(&mut self, filename: &str) -> Result<DataResponse> {
        let path = format!("{}/{}", api::DATA, encode_component(filename));
        self.call(Method::GET, &path, None)
    }

    /// Save a record; the backend assigns the id on first save
    pub fn save(
        &mut self,
        record: &VisualizationRecord,
        filename: Option<&str>,
    ) -> Result<SaveResponse> {
        let mut body = serde_json::to_value(record)?;
        if let Some(fields) = body.as_object_mut() {
            fields.insert(
                "chart_type".to_string(),
                Value::from(record.config.chart_type.as_str()),
            );
            fields.insert("filename".to_string(), Value::from(filename));
        }
        self.call(Method::POST, api::SAVE, Some(&body))
    }

    /// Fetch a saved record as raw JSON, ready for import
    pub fn get(&mut self, id: i64) -> Result<Value> {
        let path = format!("{}/{}", api::VISUALIZATION, id);
        self.call(Method::GET, &path, None)
    }

    pub fn list(&mut self) -> Result<Vec<VisualizationSummary>> {
        let response: ListResponse = self.call(Method::GET, api::LIST, None)?;
        Ok(response.visualizations)
    }

    pub fn delete(&mut self, id: i64) -> Result<()> {
        let path = format!("{}/{}", api::VISUALIZATION, id);
        let _: Value = self.call(Method::DELETE, &path, None)?;
        Ok(())
    }

    /// Most recently updated visualizations
    pub fn recent(&mut self) -> Result<Vec<VisualizationSummary>> {
        let response: ListResponse = self.call(Method::GET, api::RECENT, None)?;
        Ok(response.visualizations)
    }

    /// Saved configurations matching `query`
    pub fn search(&mut self, query: &str) -> Result<Vec<Value>> {
        let path = format!("{}?q={}", api::SEARCH, encode_component(query));
        let response: SearchResponse = self.call(Method::GET, &path, None)?;
        if let Some(status) = response.status.as_deref().filter(|s| *s != "success") {
            return Err(VizError::Validation(format!("Search failed: {}", status)));
        }
        Ok(response.configs)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn call<R: DeserializeOwned>(
        &mut self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<R> {
        let mut builder = Request::builder()
            .method(method)
            .uri(self.url(path))
            .header(ACCEPT, "application/json");
        let body = match body {
            Some(body) => {
                builder = builder.header(CONTENT_TYPE, "application/json");
                serde_json::to_vec(body)?
            }
            None => Vec::new(),
        };
        self.execute(builder.body(body)?)
    }

    fn execute<R: DeserializeOwned>(&mut self, request: Request<Vec<u8>>) -> Result<R> {
        let method = request.method().clone();
        let uri = request.uri().clone();
        let response = self.transport.send(request)?;

        let status = response.status();
        tracing::debug!(%method, %uri, status = status.as_u16(), "backend call");
        if !status.is_success() {
            return Err(network_error(status, response.body()));
        }
        Ok(serde_json::from_slice(response.body())?)
    }
}

/// Non-2xx response to `Network`, preferring the body's `error`/`message`
fn network_error(status: StatusCode, body: &[u8]) -> VizError {
    let message = serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|body| {
            ["error", "message"]
                .iter()
                .find_map(|key| body.get(key).and_then(Value::as_str).map(str::to_string))
        })
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_string()
        });
    VizError::Network {
        status: status.as_u16(),
        message,
    }
}

/// Percent-encode everything but unreserved characters
pub fn encode_component(s: &str) -> String {
    let mut encoded = String::with_capacity(s.len());
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(byte as char)
            }
            _ => encoded.push_str(&format!("%{:02X}", byte)),
        }
    }
    encoded
}


#[cfg(test)]
mod tests {
    use super::testing::MockTransport;
    use super::*;
    use crate::state::ChartType;
    use serde_json::json;

    fn client(transport: MockTransport) -> PersistenceClient<MockTransport> {
        PersistenceClient::new(transport, "http://localhost:5000/")
    }

    #[test]
    fn test_upload_sends_multipart() {
        let mut client = client(MockTransport::default().respond(200, json!({ "filename": "sales_1.csv" })));
        let response = client.upload(&DataFile::new("sales.csv", "a\n1\n")).unwrap();
        assert_eq!(response.filename, "sales_1.csv");

        let request = &client.transport().requests[0];
        assert_eq!(request.method(), Method::POST);
        assert_eq!(request.uri(), "http://localhost:5000/viz/upload");
        let content_type = request.headers()[CONTENT_TYPE].to_str().unwrap();
        assert!(content_type.starts_with("multipart/form-data; boundary="));
    }

    #[test]
    fn test_save_body() {
        let mut client = client(MockTransport::default().respond(200, json!({ "id": 12, "message": "ok" })));
        let mut record = VisualizationRecord::default();
        record.name = "Sales".to_string();
        record.config.chart_type = ChartType::Bar;

        let response = client.save(&record, Some("sales_1.csv")).unwrap();
        assert_eq!(response.id, 12);

        let body = client.transport().last_body();
        assert_eq!(body["name"], json!("Sales"));
        assert_eq!(body["chart_type"], json!("bar"));
        assert_eq!(body["filename"], json!("sales_1.csv"));
        assert_eq!(body["config"]["type"], json!("bar"));
    }

    #[test]
    fn test_error_message_from_body() {
        let mut client = client(
            MockTransport::default()
                .respond(404, json!({ "error": "File not found" }))
                .respond(400, json!({ "message": "Bad name" }))
                .respond(503, json!("down")),
        );

        let err = client.load_data("missing.csv").unwrap_err();
        assert!(matches!(err, VizError::Network { status: 404, ref message } if message == "File not found"));

        let err = client.delete(3).unwrap_err();
        assert_eq!(err.user_message(), "Bad name");

        let err = client.list().unwrap_err();
        assert!(matches!(err, VizError::Network { status: 503, ref message } if message == "Service Unavailable"));
    }

    #[test]
    fn test_paths_and_methods() {
        let mut client = client(
            MockTransport::default()
                .respond(200, json!({ "data": [{ "a": 1 }], "columns": ["a"] }))
                .respond(200, json!({ "id": 5, "config": {} }))
                .respond(200, json!({ "status": "deleted" }))
                .respond(200, json!({ "visualizations": [{ "id": 1, "name": "A", "chart_type": "bar" }] }))
                .respond(200, json!({ "status": "success", "configs": [{ "id": 2 }] })),
        );

        let data = client.load_data("my file.csv").unwrap();
        assert_eq!(data.columns, vec!["a"]);
        client.get(5).unwrap();
        client.delete(5).unwrap();
        let recent = client.recent().unwrap();
        assert_eq!(recent[0].chart_type.as_deref(), Some("bar"));
        assert_eq!(client.search("q&a").unwrap().len(), 1);

        let sent: Vec<(String, String)> = client
            .transport()
            .requests
            .iter()
            .map(|r| (r.method().to_string(), r.uri().path_and_query().unwrap().to_string()))
            .collect();
        assert_eq!(
            sent,
            vec![
                ("GET".to_string(), "/viz/data/my%20file.csv".to_string()),
                ("GET".to_string(), "/viz/5".to_string()),
                ("DELETE".to_string(), "/viz/5".to_string()),
                ("GET".to_string(), "/api/recent".to_string()),
                ("GET".to_string(), "/api/search?q=q%26a".to_string()),
            ]
        );
    }

    #[test]
    fn test_search_failure_status() {
        let mut client = client(MockTransport::default().respond(200, json!({ "status": "error", "configs": [] })));
        assert!(client.search("x").is_err());
    }
}
