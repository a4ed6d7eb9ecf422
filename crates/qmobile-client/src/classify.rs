//! Turns an upload response into exactly one terminal outcome

use std::ops::RangeInclusive;

use serde::Serialize;
use tracing::debug;

use crate::error::{ClientError, Result};
use crate::response::{SuccessEntry, UploadResponse};

pub const SUCCESS_MESSAGE: &str = "Successful uploaded file";
pub const DUPLICATE_MESSAGE: &str = "This version had been uploaded.";
pub const UNKNOWN_ERROR_MESSAGE: &str = "Unknown error!";

/// Statuses treated as field validation failures
pub const VALIDATION_STATUSES: RangeInclusive<u16> = 400..=428;

/// Result of one upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// 201: the build was stored
    NewUpload { url: String },
    /// 200: the same version already exists
    AlreadyExists { url: String },
    /// 400..=428: the server rejected the request fields
    ValidationFailure { message: String },
    /// Anything else
    UnclassifiedFailure { message: String },
}

impl Outcome {
    /// Install URL for outcomes that produced one
    pub fn url(&self) -> Option<&str> {
        match self {
            Outcome::NewUpload { url } | Outcome::AlreadyExists { url } => Some(url),
            _ => None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.url().is_some()
    }

    /// Headline shown to the user
    pub fn message(&self) -> &str {
        match self {
            Outcome::NewUpload { .. } => SUCCESS_MESSAGE,
            Outcome::AlreadyExists { .. } => DUPLICATE_MESSAGE,
            Outcome::ValidationFailure { message } | Outcome::UnclassifiedFailure { message } => message.as_str(),
        }
    }
}

/// Classify a response by HTTP status
///
/// Fails only when a 200/201 entry lacks what the install URL needs.
pub fn classify(response: &UploadResponse) -> Result<Outcome> {
    let body = &response.body;
    let outcome = match response.status {
        201 => Outcome::NewUpload {
            url: install_url(&body.success_entry()?, false)?,
        },
        200 => Outcome::AlreadyExists {
            url: install_url(&body.success_entry()?, true)?,
        },
        status if VALIDATION_STATUSES.contains(&status) => Outcome::ValidationFailure {
            message: render_validation_errors(response),
        },
        _ => Outcome::UnclassifiedFailure {
            message: body
                .message
                .clone()
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| UNKNOWN_ERROR_MESSAGE.to_string()),
        },
    };

    debug!(status = response.status, ?outcome, "classified upload response");
    Ok(outcome)
}

/// `host/apps/slug`, with `/version` appended when requested
pub fn install_url(entry: &SuccessEntry, with_version: bool) -> Result<String> {
    let host = entry
        .external_host()
        .ok_or_else(|| ClientError::malformed("entry.host.external is missing"))?;
    let slug = entry
        .slug()
        .ok_or_else(|| ClientError::malformed("entry has no app slug"))?;

    let mut segments = vec![host.trim_end_matches('/').to_string(), "apps".to_string(), slug.to_string()];
    if with_version {
        let version = entry
            .version
            .as_ref()
            .ok_or_else(|| ClientError::malformed("entry.version is missing"))?;
        segments.push(version.to_string());
    }

    Ok(segments.join("/"))
}

/// Render a validation failure:
///
/// ```text
/// [ERROR] <message>
/// 1. <field>
/// - <error>
/// ```
pub fn render_validation_errors(response: &UploadResponse) -> String {
    let body = &response.body;
    if body.entry_is_empty() {
        return UNKNOWN_ERROR_MESSAGE.to_string();
    }

    let entry = body.failure_entry();
    let message = entry
        .message
        .as_deref()
        .or(body.message.as_deref())
        .unwrap_or_default();

    let mut lines = vec![format!("[ERROR] {message}")];
    for (i, (field, errors)) in entry.errors.iter().enumerate() {
        lines.push(format!("{}. {}", i + 1, field));
        lines.extend(errors.iter().map(|e| format!("- {e}")));
    }
    lines.join("\n")
}
