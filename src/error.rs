//! Error types for plot-composer
//!
//! Every fallible operation in the crate returns [`VizError`]. Collaborator
//! failures (parsing, network) are also recorded on the visualization state so
//! subscribers can surface them, see [`crate::state::VisualizationState`].

use thiserror::Error;

/// Main error type for plot-composer operations
#[derive(Error, Debug)]
pub enum VizError {
    /// Bad file type/size, malformed JSON edit, invalid chart configuration
    #[error("Validation failed: {0}")]
    Validation(String),

    /// File extension has no parser
    #[error("Unsupported file type: {extension}")]
    UnsupportedFileType { extension: String },

    /// Non-2xx response from the backend
    #[error("Request failed with status {status}: {message}")]
    Network { status: u16, message: String },

    /// Imported record is missing its required shape
    #[error("Invalid configuration structure: {0}")]
    ConfigStructure(String),

    /// Column not found in data
    #[error("Column '{column}' not found in dataset")]
    ColumnNotFound { column: String },

    /// Empty dataset error
    #[error("Dataset is empty or has no rows")]
    EmptyDataset,

    /// File I/O error
    #[error("Failed to access file: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parsing error from polars
    #[error("Data processing error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// Excel parsing error from calamine
    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Malformed HTTP request
    #[error("HTTP error: {0}")]
    Http(#[from] http::Error),
}

/// Result type alias for plot-composer operations
pub type Result<T> = std::result::Result<T, VizError>;

/// UI-friendly error message formatting
impl VizError {
    /// Get a user-friendly error message suitable for a toast or alert
    pub fn user_message(&self) -> String {
        match self {
            VizError::Validation(msg) => msg.clone(),
            VizError::UnsupportedFileType { extension } => {
                format!("Unsupported file type: '.{}'", extension)
            }
            VizError::Network { message, .. } => message.clone(),
            VizError::ConfigStructure(msg) => {
                format!("Failed to import configuration: {}", msg)
            }
            VizError::ColumnNotFound { column } => {
                format!("Column '{}' not found", column)
            }
            VizError::EmptyDataset => "Dataset is empty".to_string(),
            VizError::Io(e) => format!("File error: {}", e),
            VizError::Polars(e) => format!("Error parsing CSV: {}", e),
            VizError::Spreadsheet(e) => format!("Error parsing spreadsheet: {}", e),
            VizError::Json(e) => format!("JSON error: {}", e),
            VizError::Http(e) => format!("Request error: {}", e),
        }
    }

    /// Get a short title for the error (for toast notifications)
    pub fn title(&self) -> &'static str {
        match self {
            VizError::Validation(_) => "Validation Error",
            VizError::UnsupportedFileType { .. } => "Unsupported File Type",
            VizError::Network { .. } => "Network Error",
            VizError::ConfigStructure(_) => "Configuration Error",
            VizError::ColumnNotFound { .. } => "Column Not Found",
            VizError::EmptyDataset => "Empty Dataset",
            VizError::Io(_) => "File Error",
            VizError::Polars(_) | VizError::Spreadsheet(_) => "Data Error",
            VizError::Json(_) => "JSON Error",
            VizError::Http(_) => "Request Error",
        }
    }

    /// Log the error with the operation it came from.
    pub fn report(&self, context: &str) {
        tracing::error!(context, title = self.title(), "{}", self);
    }
}
