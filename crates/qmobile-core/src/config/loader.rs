//! Configuration loading

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{ConfigError, Result};

use super::defaults::{config_file_names, user_config_path};
use super::types::Config;
use super::validation::validate_config;

/// Load configuration from a file, TOML or YAML by extension
pub fn load_config(path: &Path) -> Result<Config> {
    let format = if path.extension().is_some_and(|e| e == "toml") {
        "TOML"
    } else {
        "YAML"
    };
    info!(path = %path.display(), format, "loading config");

    let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;

    let config: Config = if format == "TOML" {
        toml::from_str(&content).map_err(ConfigError::TomlError)?
    } else {
        serde_yaml::from_str(&content).map_err(ConfigError::YamlError)?
    };

    validate_config(&config)?;
    debug!(path = %path.display(), "config loaded and validated");
    Ok(config)
}

/// Find a configuration file in `start_dir` or its parents
pub fn find_config(start_dir: &Path) -> Option<PathBuf> {
    debug!(start_dir = %start_dir.display(), "searching for config file");
    let mut current = start_dir.to_path_buf();

    loop {
        for name in config_file_names() {
            let config_path = current.join(name);
            if config_path.is_file() {
                info!(path = %config_path.display(), "found config file");
                return Some(config_path);
            }
        }

        if !current.pop() {
            break;
        }
    }

    debug!("no config file found");
    None
}

/// Resolve the configuration for a run
///
/// An explicit path must exist. Otherwise the search walks up from
/// `start_dir`, then falls back to `~/.qmobile/config.toml`, then to
/// defaults.
pub fn resolve_config(explicit: Option<&Path>, start_dir: &Path) -> Result<(Config, Option<PathBuf>)> {
    if let Some(path) = explicit {
        if !path.is_file() {
            return Err(ConfigError::NotFound(path.to_path_buf()).into());
        }
        return Ok((load_config(path)?, Some(path.to_path_buf())));
    }

    let found = find_config(start_dir).or_else(|| user_config_path().filter(|p| p.is_file()));
    match found {
        Some(path) => Ok((load_config(&path)?, Some(path))),
        None => {
            debug!(dir = %start_dir.display(), "no config found, using defaults");
            Ok((Config::default(), None))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WorkflowError;
    use tempfile::TempDir;

    const TOML_CONFIG: &str = "[hosts]\nexternal = \"https://qmobile.example.com\"\n\n[api]\ntimeout = 120\n";

    #[test]
    fn test_find_config_toml() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("qmobile.toml");
        std::fs::write(&config_path, TOML_CONFIG).unwrap();

        assert_eq!(find_config(temp.path()), Some(config_path));
    }

    #[test]
    fn test_find_config_prefers_toml_over_yaml() {
        let temp = TempDir::new().unwrap();
        let toml_path = temp.path().join("qmobile.toml");
        std::fs::write(&toml_path, TOML_CONFIG).unwrap();
        std::fs::write(temp.path().join("qmobile.yaml"), "api:\n  timeout: 5\n").unwrap();

        assert_eq!(find_config(temp.path()).unwrap(), toml_path);
    }

    #[test]
    fn test_find_config_in_parent() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join(".qmobile.yaml");
        std::fs::write(&config_path, "api:\n  timeout: 5\n").unwrap();
        let nested = temp.path().join("ios").join("build");
        std::fs::create_dir_all(&nested).unwrap();

        assert_eq!(find_config(&nested).unwrap(), config_path);
    }

    #[test]
    fn test_load_config_toml() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("qmobile.toml");
        std::fs::write(&config_path, TOML_CONFIG).unwrap();

        let config = load_config(&config_path).unwrap();
        assert_eq!(config.hosts.external.as_deref(), Some("https://qmobile.example.com"));
        assert_eq!(config.api.timeout, 120);
        assert_eq!(config.api.version, "v2");
    }

    #[test]
    fn test_load_config_yaml() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("qmobile.yaml");
        std::fs::write(
            &config_path,
            "hosts:\n  internal: http://qmobile.intranet\napi:\n  version: v3\n",
        )
        .unwrap();

        let config = load_config(&config_path).unwrap();
        assert_eq!(config.hosts.internal.as_deref(), Some("http://qmobile.intranet"));
        assert_eq!(config.api.version, "v3");
    }

    #[test]
    fn test_resolve_explicit_missing() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("nope.toml");
        let err = resolve_config(Some(&missing), temp.path()).unwrap_err();
        assert!(matches!(err, WorkflowError::Configuration(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_resolve_explicit_wins_over_search() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("qmobile.toml"), TOML_CONFIG).unwrap();
        let explicit = temp.path().join("other.yaml");
        std::fs::write(&explicit, "api:\n  timeout: 7\n").unwrap();

        let (config, path) = resolve_config(Some(&explicit), temp.path()).unwrap();
        assert_eq!(config.api.timeout, 7);
        assert_eq!(path, Some(explicit));
    }
}
