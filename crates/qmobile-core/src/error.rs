//! Error types for qmobile

use std::path::PathBuf;

use qmobile_client::ClientError;
use qmobile_package::PackageError;
use thiserror::Error;

/// Result type alias using WorkflowError
pub type Result<T> = std::result::Result<T, WorkflowError>;

/// Everything that can stop an upload
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Bad or missing input, raised before any network call
    #[error(transparent)]
    Configuration(#[from] ConfigError),

    /// The package could not be inspected
    #[error(transparent)]
    Package(#[from] PackageError),

    /// Transport or response decoding failure
    #[error(transparent)]
    Client(#[from] ClientError),

    /// The server rejected the request fields
    #[error("{0}")]
    Validation(String),

    /// The server failed with a status that has no specific handling
    #[error("{0}")]
    Unclassified(String),
}

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// API key absent or empty
    #[error("No API key, please input again")]
    MissingApiKey,

    /// No package given and none discovered
    #[error("You have to either pass an ipa or an apk file")]
    MissingFile,

    /// Configuration file not found
    #[error("Configuration file not found at {0}")]
    NotFound(PathBuf),

    /// Invalid configuration value
    #[error("Invalid configuration: {field} - {message}")]
    InvalidValue { field: String, message: String },

    /// custom_data is not a JSON object
    #[error("Invalid custom data: {0}")]
    InvalidCustomData(String),

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// IO error
    #[error("IO error reading config: {0}")]
    Io(#[from] std::io::Error),
}

impl ConfigError {
    pub(crate) fn invalid<F: Into<String>, M: Into<String>>(field: F, message: M) -> Self {
        Self::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }
}
