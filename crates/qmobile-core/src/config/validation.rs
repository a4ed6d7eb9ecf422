//! Configuration validation

use tracing::debug;
use url::Url;

use crate::error::{ConfigError, Result};

use super::types::Config;

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    debug!("validating configuration");
    validate_host("hosts.external", config.hosts.external.as_deref())?;
    validate_host("hosts.internal", config.hosts.internal.as_deref())?;
    validate_api(config)?;
    debug!("configuration validation passed");
    Ok(())
}

fn validate_host(field: &str, host: Option<&str>) -> Result<()> {
    let Some(host) = host.filter(|h| !h.trim().is_empty()) else {
        return Ok(());
    };

    let url = Url::parse(host)
        .map_err(|e| ConfigError::invalid(field, format!("'{host}' is not a valid URL: {e}")))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::invalid(field, "must use http or https").into());
    }

    Ok(())
}

fn validate_api(config: &Config) -> Result<()> {
    if config.api.version.trim().is_empty() {
        return Err(ConfigError::invalid("api.version", "version cannot be empty").into());
    }

    if !config.api.upload_path.starts_with('/') {
        return Err(ConfigError::invalid("api.upload_path", "must start with '/'").into());
    }

    if config.api.timeout == 0 {
        return Err(ConfigError::invalid("api.timeout", "must be greater than zero").into());
    }

    Ok(())
}
