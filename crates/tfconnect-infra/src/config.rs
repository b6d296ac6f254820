//! Configuration loader for tfconnect.
//!
//! Reads an optional TOML file into [`BridgeConfig`], then applies
//! environment overrides. A missing file yields the defaults; a file that
//! exists but fails to parse is an error, since a silently ignored engine
//! path or template folder would only surface later as failed runs.

use std::path::{Path, PathBuf};

use secrecy::SecretString;

use tfconnect_types::config::BridgeConfig;
use tfconnect_types::error::ConfigError;

pub const ENV_CLIENT_ID: &str = "PORT_CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "PORT_CLIENT_SECRET";
pub const ENV_BASE_URL: &str = "PORT_BASE_URL";
pub const ENV_TEMPLATES: &str = "TFCONNECT_TEMPLATES";
pub const ENV_BOOTSTRAP: &str = "TFCONNECT_BOOTSTRAP";
pub const ENV_ENGINE_BIN: &str = "TFCONNECT_ENGINE_BIN";

/// Load configuration from `path` (if given) and the process environment.
pub async fn load_config(path: Option<&Path>) -> Result<BridgeConfig, ConfigError> {
    let mut config = match path {
        Some(path) => read_config_file(path).await?,
        None => BridgeConfig::default(),
    };
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    Ok(config)
}

/// Parse a TOML config file. A missing file yields the defaults.
pub async fn read_config_file(path: &Path) -> Result<BridgeConfig, ConfigError> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config file at {}, using defaults", path.display());
            return Ok(BridgeConfig::default());
        }
        Err(err) => {
            return Err(ConfigError::Read {
                path: path.display().to_string(),
                reason: err.to_string(),
            });
        }
    };

    toml::from_str(&content).map_err(|err| ConfigError::Parse {
        path: path.display().to_string(),
        reason: err.to_string(),
    })
}

/// Apply environment overrides on top of file values.
///
/// `lookup` abstracts the environment so tests stay hermetic. Empty
/// values are ignored.
pub fn apply_env_overrides(config: &mut BridgeConfig, lookup: impl Fn(&str) -> Option<String>) {
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(id) = get(ENV_CLIENT_ID) {
        config.port.client_id = Some(id);
    }
    if let Some(secret) = get(ENV_CLIENT_SECRET) {
        config.port.client_secret = Some(SecretString::from(secret));
    }
    if let Some(url) = get(ENV_BASE_URL) {
        config.port.base_url = url;
    }
    if let Some(dir) = get(ENV_TEMPLATES) {
        config.templates.dir = PathBuf::from(dir);
    }
    if let Some(bootstrap) = get(ENV_BOOTSTRAP) {
        config.templates.bootstrap = PathBuf::from(bootstrap);
    }
    if let Some(bin) = get(ENV_ENGINE_BIN) {
        config.engine.binary = Some(PathBuf::from(bin));
    }
}
