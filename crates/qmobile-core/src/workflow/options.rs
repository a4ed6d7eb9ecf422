//! Upload options

use std::path::PathBuf;

use qmobile_client::HostType;
use serde_json::{Map, Value};

use crate::config::DEFAULT_CHANNEL;
use crate::error::{ConfigError, Result};

/// Everything a caller controls about one upload
#[derive(Debug, Clone)]
pub struct UploadOptions {
    /// Service API key, required
    pub api_key: String,
    /// Package path; discovered when absent
    pub file: Option<PathBuf>,
    /// Explicit configuration file
    pub config_path: Option<PathBuf>,
    pub host_type: HostType,
    pub channel: String,
    pub branch: Option<String>,
    pub last_commit: Option<String>,
    pub ci_url: Option<String>,
    pub changelog: Option<String>,
    /// Overrides the name read from the package
    pub app_name: Option<String>,
    pub slug: Option<String>,
    /// Overrides `api.version` from configuration
    pub api_version: Option<String>,
    /// Overrides `api.timeout` from configuration, in seconds
    pub timeout: Option<u64>,
    /// Extra form fields, applied last
    pub custom_data: Map<String, Value>,
    /// Directory used for relative paths and package discovery
    pub working_dir: PathBuf,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            file: None,
            config_path: None,
            host_type: HostType::default(),
            channel: DEFAULT_CHANNEL.to_string(),
            branch: None,
            last_commit: None,
            ci_url: None,
            changelog: None,
            app_name: None,
            slug: None,
            api_version: None,
            timeout: None,
            custom_data: Map::new(),
            working_dir: PathBuf::from("."),
        }
    }
}

impl UploadOptions {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    pub fn with_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.file = Some(file.into());
        self
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = dir.into();
        self
    }

    pub fn with_custom_data(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.custom_data.insert(key.into(), value.into());
        self
    }
}

/// Parse `--custom-data`, which must be a JSON object
pub fn parse_custom_data(raw: &str) -> Result<Map<String, Value>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(Map::new());
    }

    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(ConfigError::InvalidCustomData(format!(
            "expected a JSON object, got {other}"
        ))
        .into()),
        Err(e) => Err(ConfigError::InvalidCustomData(e.to_string()).into()),
    }
}
