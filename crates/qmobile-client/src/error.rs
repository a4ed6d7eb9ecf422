//! Client error types

use std::path::PathBuf;

use thiserror::Error;

use crate::types::HostType;

/// Errors raised by the upload client and response classifier
#[derive(Debug, Error)]
pub enum ClientError {
    /// API key is empty
    #[error("No API key, please input again")]
    MissingApiKey,

    /// Package file does not exist
    #[error("Upload file not found: {0}")]
    MissingFile(PathBuf),

    /// No base address configured for the requested host type
    #[error("No {0} host configured")]
    HostNotConfigured(HostType),

    /// Transfer exceeded the configured timeout
    #[error("Upload timed out after {seconds}s")]
    Timeout { seconds: u64 },

    /// Any other transport failure
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    /// Response body is not the expected JSON shape
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    pub(crate) fn malformed<S: Into<String>>(msg: S) -> Self {
        Self::MalformedResponse(msg.into())
    }
}

/// Result type for client operations
pub type Result<T> = std::result::Result<T, ClientError>;
