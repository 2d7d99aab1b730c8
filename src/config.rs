//! Client configuration
//!
//! Persisted as pretty-printed JSON, the same way view settings are saved.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::{api, config, timing, upload};
use crate::error::{Result, VizError};

/// Settings shared by the session, the upload validator and the renderer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Backend base URL, without a trailing slash
    pub base_url: String,

    /// Maximum accepted upload size in bytes
    pub max_file_size: u64,

    /// Accepted upload extensions, lowercase and without the dot
    pub allowed_extensions: Vec<String>,

    /// Search input quiescence window in milliseconds
    pub search_debounce_ms: u64,

    /// Delay before the first render in milliseconds
    pub first_render_delay_ms: u64,

    /// Extra plotting-library interaction options, layered last over the presets
    pub interaction_options: Value,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: api::DEFAULT_BASE_URL.to_string(),
            max_file_size: upload::DEFAULT_MAX_FILE_SIZE,
            allowed_extensions: upload::ALLOWED_EXTENSIONS
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
            search_debounce_ms: timing::SEARCH_DEBOUNCE_MS,
            first_render_delay_ms: timing::FIRST_RENDER_DELAY_MS,
            interaction_options: Value::Null,
        }
    }
}

impl ClientConfig {
    /// Load a configuration file, filling absent keys with defaults
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: ClientConfig = serde_json::from_str(&contents)?;
        config.validate()?;
        tracing::debug!(path = %path.display(), "loaded client config");
        Ok(config)
    }

    /// Load `plot-composer.json` from `dir`, or the defaults when there is none
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        let path = dir.join(config::CONFIG_FILE);
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Write the configuration as pretty JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.base_url.is_empty() {
            return Err(VizError::Validation("base_url must not be empty".to_string()));
        }
        if self.max_file_size == 0 {
            return Err(VizError::Validation("max_file_size must be positive".to_string()));
        }
        if self.allowed_extensions.is_empty() {
            return Err(VizError::Validation(
                "allowed_extensions must list at least one extension".to_string(),
            ));
        }
        Ok(())
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    pub fn first_render_delay(&self) -> Duration {
        Duration::from_millis(self.first_render_delay_ms)
    }

    /// Whether an extension (with or without the leading dot) is accepted
    pub fn accepts_extension(&self, extension: &str) -> bool {
        let ext = extension.trim_start_matches('.').to_lowercase();
        self.allowed_extensions.iter().any(|allowed| *allowed == ext)
    }
}
