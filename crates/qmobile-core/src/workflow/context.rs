//! Frozen state of one upload

use std::path::PathBuf;

use qmobile_client::{QueryParams, UploadRequest, DEFAULT_TIMEOUT_SECS};
use qmobile_package::PackageMetadata;
use serde::Serialize;

use super::options::UploadOptions;

/// Fields left out of the printed summary
const HIDDEN_SUMMARY_KEYS: [&str; 3] = ["devices", "changelog", "key"];

/// Inputs of an upload after validation, inspection and enrichment
///
/// Built once by [`super::UploadWorkflow::prepare`] and never mutated.
#[derive(Debug, Clone)]
pub struct UploadContext {
    pub options: UploadOptions,
    pub file: PathBuf,
    pub metadata: PackageMetadata,
    pub params: QueryParams,
    pub request_url: String,
}

/// One row of the pre-upload summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryRow {
    pub key: String,
    pub value: String,
}

impl UploadContext {
    /// Request handed to the uploader
    pub fn request(&self) -> UploadRequest {
        UploadRequest {
            file: self.file.clone(),
            icon: self.metadata.icon.clone(),
            params: self.params.clone(),
            host_type: self.options.host_type,
        }
    }

    pub fn timeout(&self) -> u64 {
        self.options.timeout.unwrap_or(DEFAULT_TIMEOUT_SECS)
    }

    /// Rows of the pre-upload summary, secrets and long lists hidden
    pub fn summary(&self) -> Vec<SummaryRow> {
        let icon = self
            .metadata
            .icon
            .as_ref()
            .map(|i| i.file_name.clone())
            .unwrap_or_default();

        let mut rows = vec![
            row("channel", &self.options.channel),
            row("timeout", &self.timeout().to_string()),
            row("url", &self.request_url),
            row("file", &self.file.display().to_string()),
            row("icon", &icon),
        ];

        for (key, value) in self.params.iter() {
            if HIDDEN_SUMMARY_KEYS.contains(&key) {
                continue;
            }
            let value = value.to_string();
            match rows.iter_mut().find(|r| r.key == key) {
                Some(existing) => existing.value = value,
                None => rows.push(row(key, &value)),
            }
        }

        rows
    }
}

fn row(key: &str, value: &str) -> SummaryRow {
    SummaryRow {
        key: key.to_string(),
        value: value.to_string(),
    }
}
