//! Configuration types for tfconnect.
//!
//! `BridgeConfig` is the immutable context handed to every component at
//! construction time. It is loaded from an optional `tfconnect.toml`,
//! then overridden by environment variables and CLI flags. All fields
//! have sensible defaults except the upstream credentials.

use std::path::PathBuf;

use secrecy::SecretString;
use serde::Deserialize;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BridgeConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub templates: TemplateConfig,

    #[serde(default)]
    pub workspace: WorkspaceConfig,

    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub port: PortConfig,
}

/// Webhook listener settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_listen_port")]
    pub port: u16,

    /// Upper bound on one request's total latency, in seconds.
    /// `None` leaves operations unbounded.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_listen_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_listen_port(),
            request_timeout_secs: None,
        }
    }
}

/// Where templates live.
#[derive(Debug, Clone, Deserialize)]
pub struct TemplateConfig {
    /// Folder containing one `<blueprint>.<extension>` file per blueprint.
    #[serde(default = "default_templates_dir")]
    pub dir: PathBuf,

    /// Bootstrap (backend) template with a `{{ .storage_key }}` slot.
    #[serde(default = "default_bootstrap")]
    pub bootstrap: PathBuf,

    #[serde(default = "default_extension")]
    pub extension: String,
}

fn default_templates_dir() -> PathBuf {
    PathBuf::from("templates")
}

fn default_bootstrap() -> PathBuf {
    PathBuf::from("main.tf")
}

fn default_extension() -> String {
    "tf".to_string()
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            dir: default_templates_dir(),
            bootstrap: default_bootstrap(),
            extension: default_extension(),
        }
    }
}

/// Ephemeral workspace settings.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkspaceConfig {
    /// Parent directory for workspaces; the system temp dir when unset.
    #[serde(default)]
    pub root: Option<PathBuf>,

    #[serde(default = "default_workspace_prefix")]
    pub prefix: String,
}

fn default_workspace_prefix() -> String {
    "tf-".to_string()
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            root: None,
            prefix: default_workspace_prefix(),
        }
    }
}

/// External engine settings.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Explicit engine binary. Falls back to `terraform` on `PATH`.
    #[serde(default)]
    pub binary: Option<PathBuf>,

    /// Exact engine version the connector is pinned to.
    #[serde(default = "default_required_version")]
    pub required_version: semver::Version,

    /// Read the entity id back from state after a successful apply.
    #[serde(default)]
    pub show_after_apply: bool,
}

fn default_required_version() -> semver::Version {
    semver::Version::new(1, 2, 9)
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            binary: None,
            required_version: default_required_version(),
            show_after_apply: false,
        }
    }
}

/// Upstream status endpoint and credentials.
#[derive(Debug, Clone, Deserialize)]
pub struct PortConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default)]
    pub client_id: Option<String>,

    #[serde(default)]
    pub client_secret: Option<SecretString>,
}

pub fn default_base_url() -> String {
    "https://api.getport.io".to_string()
}

impl Default for PortConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            client_id: None,
            client_secret: None,
        }
    }
}
