//! Default configuration values

use std::path::PathBuf;

pub use qmobile_client::types::{DEFAULT_API_VERSION, DEFAULT_TIMEOUT_SECS, DEFAULT_UPLOAD_PATH};

/// Default configuration file name (TOML)
pub const DEFAULT_CONFIG_TOML: &str = "qmobile.toml";

/// Default configuration file name (YAML)
pub const DEFAULT_CONFIG_YAML: &str = "qmobile.yaml";

/// Default upload channel
pub const DEFAULT_CHANNEL: &str = "fastlane";

/// Get list of config file names to search for
pub fn config_file_names() -> Vec<&'static str> {
    vec![
        DEFAULT_CONFIG_TOML,
        DEFAULT_CONFIG_YAML,
        ".qmobile.toml",
        ".qmobile.yaml",
    ]
}

/// Per-user state directory, `~/.qmobile`
pub fn user_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".qmobile"))
}

/// Per-user configuration file, `~/.qmobile/config.toml`
pub fn user_config_path() -> Option<PathBuf> {
    user_dir().map(|dir| dir.join("config.toml"))
}

/// Configuration template written by hand or shown in docs
pub const DEFAULT_CONFIG_TEMPLATE: &str = r#"# qmobile configuration

[hosts]
external = "https://qmobile.example.com"
internal = "http://qmobile.intranet"

[api]
version = "v2"
upload_path = "/api/{version}/apps/upload"
timeout = 600
"#;
