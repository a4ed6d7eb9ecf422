//! Request-side types for the upload API

use std::path::PathBuf;
use std::str::FromStr;

use qmobile_package::AppIcon;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// Default upload path, `{version}` is replaced by the API version
pub const DEFAULT_UPLOAD_PATH: &str = "/api/{version}/apps/upload";

/// Default API version
pub const DEFAULT_API_VERSION: &str = "v2";

/// Default transfer timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 600;

/// Which of the service's base addresses to talk to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostType {
    /// Publicly reachable address
    #[default]
    External,
    /// Intranet address
    Internal,
}

impl HostType {
    pub fn as_str(&self) -> &'static str {
        match self {
            HostType::External => "external",
            HostType::Internal => "internal",
        }
    }
}

impl std::fmt::Display for HostType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown host type name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown host type '{0}', expected 'external' or 'internal'")]
pub struct ParseHostTypeError(pub String);

impl FromStr for HostType {
    type Err = ParseHostTypeError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "external" => Ok(HostType::External),
            "internal" => Ok(HostType::Internal),
            _ => Err(ParseHostTypeError(s.to_string())),
        }
    }
}

/// Base addresses per host type
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Hosts {
    pub external: Option<String>,
    pub internal: Option<String>,
}

impl Hosts {
    pub fn get(&self, host_type: HostType) -> Option<&str> {
        match host_type {
            HostType::External => self.external.as_deref(),
            HostType::Internal => self.internal.as_deref(),
        }
        .filter(|h| !h.trim().is_empty())
    }
}

/// Resolved client settings
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub hosts: Hosts,
    pub api_version: String,
    /// Transfer timeout in seconds
    pub timeout: u64,
    pub upload_path: String,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            hosts: Hosts::default(),
            api_version: DEFAULT_API_VERSION.to_string(),
            timeout: DEFAULT_TIMEOUT_SECS,
            upload_path: DEFAULT_UPLOAD_PATH.to_string(),
        }
    }
}

/// A single form value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Text(String),
    List(Vec<String>),
}

impl ParamValue {
    /// Convert a free-form JSON value; `null` yields `None`
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        use serde_json::Value;

        match value {
            Value::Null => None,
            Value::String(s) => Some(ParamValue::Text(s.clone())),
            Value::Array(items) => Some(ParamValue::List(
                items
                    .iter()
                    .filter(|v| !v.is_null())
                    .map(|v| match v {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect(),
            )),
            other => Some(ParamValue::Text(other.to_string())),
        }
    }
}

impl std::fmt::Display for ParamValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParamValue::Text(s) => f.write_str(s),
            ParamValue::List(items) => f.write_str(&items.join(", ")),
        }
    }
}

impl From<String> for ParamValue {
    fn from(s: String) -> Self {
        ParamValue::Text(s)
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        ParamValue::Text(s.to_string())
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(items: Vec<String>) -> Self {
        ParamValue::List(items)
    }
}

impl Serialize for ParamValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            ParamValue::Text(s) => serializer.serialize_str(s),
            ParamValue::List(items) => items.serialize(serializer),
        }
    }
}

/// Ordered form fields sent with an upload
///
/// Inserting an existing key replaces its value in place, so the first
/// insertion fixes the position and the last one wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    entries: Vec<(String, ParamValue)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Insert only when a value is present
    pub fn insert_opt<V: Into<ParamValue>>(&mut self, key: impl Into<String>, value: Option<V>) {
        if let Some(value) = value {
            self.insert(key, value);
        }
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn remove(&mut self, key: &str) -> Option<ParamValue> {
        let index = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(index).1)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for QueryParams {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// Everything one upload sends
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub file: PathBuf,
    pub icon: Option<AppIcon>,
    pub params: QueryParams,
    pub host_type: HostType,
}
