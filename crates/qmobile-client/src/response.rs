//! Response schema of the upload API

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ClientError, Result};

/// HTTP status plus decoded body
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadResponse {
    pub status: u16,
    pub body: ResponseBody,
}

/// JSON envelope `{ code, message, entry }`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponseBody {
    pub code: Option<i64>,
    pub message: Option<String>,
    /// Shape depends on the status, see [`SuccessEntry`] and [`FailureEntry`]
    pub entry: Value,
}

impl ResponseBody {
    /// Whether `entry` carries nothing
    pub fn entry_is_empty(&self) -> bool {
        match &self.entry {
            Value::Null => true,
            Value::Object(map) => map.is_empty(),
            Value::Array(items) => items.is_empty(),
            Value::String(s) => s.is_empty(),
            _ => false,
        }
    }

    pub fn success_entry(&self) -> Result<SuccessEntry> {
        serde_json::from_value(self.entry.clone())
            .map_err(|e| ClientError::malformed(format!("unexpected entry: {e}")))
    }

    pub fn failure_entry(&self) -> FailureEntry {
        FailureEntry::from_value(&self.entry)
    }
}

/// Entry of a 200/201 response
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SuccessEntry {
    pub host: Option<HostUrls>,
    pub app: Option<AppRef>,
    /// Flattened slug used by older servers
    pub slug: Option<String>,
    pub version: Option<Version>,
}

impl SuccessEntry {
    pub fn external_host(&self) -> Option<&str> {
        self.host
            .as_ref()
            .and_then(|h| h.external.as_deref())
            .filter(|h| !h.is_empty())
    }

    /// Slug from `app.slug`, else the flattened `slug`
    pub fn slug(&self) -> Option<&str> {
        self.app
            .as_ref()
            .and_then(|a| a.slug.as_deref())
            .or(self.slug.as_deref())
            .filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct HostUrls {
    pub external: Option<String>,
    pub internal: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppRef {
    pub slug: Option<String>,
}

/// Version id, sent as a number or a string
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Version {
    Number(serde_json::Number),
    Text(String),
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Version::Number(n) => write!(f, "{n}"),
            Version::Text(s) => f.write_str(s),
        }
    }
}

/// Entry of a validation failure
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FailureEntry {
    pub message: Option<String>,
    /// Field name to error strings, in server order
    pub errors: Vec<(String, Vec<String>)>,
}

impl FailureEntry {
    /// Accepts `{ message, errors: { field: [..] } }` or the legacy shape
    /// where the entry itself maps field to errors
    pub fn from_value(value: &Value) -> Self {
        let Some(map) = value.as_object() else {
            return Self::default();
        };

        match map.get("errors").and_then(|e| e.as_object()) {
            Some(errors) => Self {
                message: map.get("message").and_then(|m| m.as_str()).map(str::to_string),
                errors: errors.iter().map(|(k, v)| (k.clone(), messages(v))).collect(),
            },
            None => Self {
                message: None,
                errors: map.iter().map(|(k, v)| (k.clone(), messages(v))).collect(),
            },
        }
    }
}

fn messages(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect(),
        Value::String(s) => vec![s.clone()],
        Value::Null => Vec::new(),
        other => vec![other.to_string()],
    }
}
