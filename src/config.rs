//! Configuration types
//!
//! `ExportConfig` is loaded from a YAML or JSON file and then overridden
//! from the command line. Every field has a default, so an empty file (or
//! no file) is a valid configuration apart from the API credential.

use crate::auth::Credential;
use crate::engine::{BackoffConfig, DEFAULT_RETRY_BUDGET};
use crate::error::{Error, Result};
use crate::types::{ExportFormat, FetchMode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable the CLI reads the API key from
pub const API_KEY_ENV: &str = "FUB_API_KEY";

// ============================================================================
// Top-Level Config
// ============================================================================

/// Complete export configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Upstream API settings
    pub api: ApiConfig,

    /// Fetch loop settings
    pub fetch: FetchSettings,

    /// File output settings
    pub output: OutputConfig,

    /// API credential, opaque to the fetch logic
    #[serde(skip_serializing)]
    pub api_key: Credential,
}

impl ExportConfig {
    /// Load a configuration file (YAML or JSON)
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::FileNotFound {
                    path: path.display().to_string(),
                }
            } else {
                Error::config(format!(
                    "Failed to read config file '{}': {e}",
                    path.display()
                ))
            }
        })?;
        Self::from_str(&content)
    }

    /// Parse a configuration from a YAML or JSON string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
            .map_err(|e| Error::config(format!("Failed to parse config: {e}")))
    }

    /// Set the API credential
    #[must_use]
    pub fn with_api_key(mut self, key: Credential) -> Self {
        self.api_key = key;
        self
    }

    /// Check the configuration before any request is made
    pub fn validate(&self) -> Result<()> {
        if self.api_key.is_empty() {
            return Err(Error::missing_field("api_key"));
        }
        self.api.validate()?;
        self.fetch.validate()?;
        self.output.validate()
    }
}

// ============================================================================
// API Config
// ============================================================================

/// Upstream API settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL for all requests
    pub base_url: String,

    /// Listing endpoint, relative to the base URL
    pub endpoint: String,

    /// Dot path to the records array in a response
    pub records_path: String,

    /// Dot path to the continuation token in a response
    pub cursor_path: String,

    /// Query parameter the continuation token is sent under
    pub cursor_param: String,

    /// Query parameter the page size is sent under
    pub limit_param: String,

    /// Static query parameters added to every request
    pub extra_query: BTreeMap<String, String>,

    /// Headers added to every request (e.g. `X-System`)
    pub headers: BTreeMap<String, String>,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Client-side pacing; `None` disables it
    pub requests_per_second: Option<u32>,

    /// User agent override
    pub user_agent: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        let mut extra_query = BTreeMap::new();
        extra_query.insert("fields".to_string(), "allFields".to_string());
        extra_query.insert("includeTrash".to_string(), "true".to_string());

        Self {
            base_url: "https://api.followupboss.com/v1".to_string(),
            endpoint: "people".to_string(),
            records_path: "people".to_string(),
            cursor_path: "_metadata.next".to_string(),
            cursor_param: "next".to_string(),
            limit_param: "limit".to_string(),
            extra_query,
            headers: BTreeMap::new(),
            timeout_secs: 30,
            requests_per_second: Some(10),
            user_agent: None,
        }
    }
}

impl ApiConfig {
    fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(Error::config("api.base_url cannot be empty"));
        }
        let url = url::Url::parse(&self.base_url)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::invalid_value(
                "api.base_url",
                format!("unsupported scheme '{}'", url.scheme()),
            ));
        }
        if self.endpoint.trim().is_empty() {
            return Err(Error::config("api.endpoint cannot be empty"));
        }
        if self.cursor_param.is_empty() || self.limit_param.is_empty() {
            return Err(Error::config(
                "api.cursor_param and api.limit_param cannot be empty",
            ));
        }
        if self.timeout_secs == 0 {
            return Err(Error::invalid_value("api.timeout_secs", "must be positive"));
        }
        if self.requests_per_second == Some(0) {
            return Err(Error::invalid_value(
                "api.requests_per_second",
                "must be positive (omit it to disable pacing)",
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Fetch Settings
// ============================================================================

/// Fetch loop settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchSettings {
    /// Bulk export or sample
    pub mode: FetchMode,

    /// Record cap; defaults to the mode's cap
    pub target_count: Option<usize>,

    /// Records asked for per request
    pub page_size: u32,

    /// Retries allowed per run of consecutive 429s
    pub retry_budget: u32,

    /// First backoff wait in milliseconds
    pub backoff_floor_ms: u64,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            mode: FetchMode::default(),
            target_count: None,
            page_size: 100,
            retry_budget: DEFAULT_RETRY_BUDGET,
            backoff_floor_ms: 1000,
        }
    }
}

impl FetchSettings {
    /// Record cap after applying the mode default
    pub fn effective_target(&self) -> usize {
        self.target_count
            .unwrap_or_else(|| self.mode.default_target())
    }

    /// First backoff wait
    pub fn backoff_floor(&self) -> Duration {
        Duration::from_millis(self.backoff_floor_ms)
    }

    /// Backoff configuration for the fetch engine
    pub fn backoff_config(&self) -> BackoffConfig {
        BackoffConfig::new(self.backoff_floor(), self.retry_budget)
    }

    fn validate(&self) -> Result<()> {
        if self.effective_target() == 0 {
            return Err(Error::invalid_value("fetch.target_count", "must be positive"));
        }
        if self.page_size == 0 {
            return Err(Error::invalid_value("fetch.page_size", "must be positive"));
        }
        if self.backoff_floor_ms == 0 {
            return Err(Error::invalid_value(
                "fetch.backoff_floor_ms",
                "must be positive",
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Output Config
// ============================================================================

/// File output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory files are written to
    pub dir: PathBuf,

    /// File name prefix
    pub file_prefix: String,

    /// Formats to write
    pub formats: Vec<ExportFormat>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            file_prefix: "people_data".to_string(),
            formats: vec![ExportFormat::Csv, ExportFormat::Json],
        }
    }
}

impl OutputConfig {
    fn validate(&self) -> Result<()> {
        if self.formats.is_empty() {
            return Err(Error::config("output.formats cannot be empty"));
        }
        if self.file_prefix.contains(['/', '\\']) {
            return Err(Error::invalid_value(
                "output.file_prefix",
                "must not contain path separators",
            ));
        }
        Ok(())
    }
}
