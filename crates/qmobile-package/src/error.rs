//! Package inspection error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while inspecting an application package
#[derive(Debug, Error)]
pub enum PackageError {
    /// The package path does not resolve to a file
    #[error("Package file not found: {0}")]
    FileNotFound(PathBuf),

    /// The file is not a recognizable APK or IPA
    #[error("Unsupported package format: {0}")]
    UnsupportedFormat(String),

    /// The archive is recognizable but its contents are broken
    #[error("Invalid package: {0}")]
    InvalidPackage(String),

    /// Binary XML decoding failed
    #[error("Malformed binary XML at offset {offset}: {message}")]
    BinaryXml { offset: usize, message: String },

    /// Icon could not be repaired
    #[error("Icon repair failed: {0}")]
    IconRepair(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Zip archive error
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Property list error
    #[error("Plist error: {0}")]
    Plist(#[from] plist::Error),
}

impl PackageError {
    pub(crate) fn invalid<S: Into<String>>(msg: S) -> Self {
        Self::InvalidPackage(msg.into())
    }

    pub(crate) fn axml<S: Into<String>>(offset: usize, msg: S) -> Self {
        Self::BinaryXml {
            offset,
            message: msg.into(),
        }
    }
}

/// Result type for package inspection
pub type Result<T> = std::result::Result<T, PackageError>;
