//! Configuration types

use qmobile_client::{ClientOptions, Hosts};
use serde::{Deserialize, Serialize};

use super::defaults::{DEFAULT_API_VERSION, DEFAULT_TIMEOUT_SECS, DEFAULT_UPLOAD_PATH};

/// Main configuration for qmobile
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base address per host type
    pub hosts: Hosts,

    /// Upload API settings
    pub api: ApiConfig,
}

/// Upload API settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// API version substituted into `upload_path`
    pub version: String,

    /// Upload path appended to the host, may contain `{version}`
    pub upload_path: String,

    /// Transfer timeout in seconds
    pub timeout: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            version: DEFAULT_API_VERSION.to_string(),
            upload_path: DEFAULT_UPLOAD_PATH.to_string(),
            timeout: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl Config {
    /// Client settings, with command-line overrides applied
    pub fn client_options(&self, api_version: Option<&str>, timeout: Option<u64>) -> ClientOptions {
        ClientOptions {
            hosts: self.hosts.clone(),
            api_version: api_version
                .filter(|v| !v.is_empty())
                .unwrap_or(self.api.version.as_str())
                .to_string(),
            timeout: timeout.filter(|t| *t > 0).unwrap_or(self.api.timeout),
            upload_path: self.api.upload_path.clone(),
        }
    }
}
