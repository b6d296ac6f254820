//! CLI command definitions and dispatch for the `tfconnect` binary.
//!
//! Uses clap derive macros for argument parsing. `serve` runs the webhook
//! listener; `run` and `render` take a single action document from disk.

pub mod render;
pub mod run;
pub mod serve;

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use clap_complete::Shell;

use tfconnect_infra::config::load_config;
use tfconnect_types::action::ActionBody;
use tfconnect_types::config::BridgeConfig;

/// Turn infrastructure actions into Terraform runs.
#[derive(Parser)]
#[command(name = "tfconnect", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for debug, -vv for trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to the TOML configuration file.
    #[arg(long, global = true, env = "TFCONNECT_CONFIG", default_value = "tfconnect.toml")]
    pub config: PathBuf,

    /// Folder holding one resource template per blueprint.
    #[arg(long, global = true)]
    pub templates: Option<PathBuf>,

    /// Export spans to stdout through OpenTelemetry.
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the webhook listener.
    Serve {
        /// Port to listen on.
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to.
        #[arg(long)]
        host: Option<String>,
    },

    /// Execute one action document locally.
    Run {
        /// JSON action document, as the webhook would receive it.
        #[arg(long)]
        event: PathBuf,

        /// Skip reporting the run status upstream.
        #[arg(long)]
        no_report: bool,
    },

    /// Write the files an action would run with, without running the engine.
    Render {
        /// JSON action document, as the webhook would receive it.
        #[arg(long)]
        event: PathBuf,

        /// Output directory (created if missing).
        #[arg(long)]
        out: PathBuf,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

/// Load the config file and environment, then apply global CLI flags.
pub async fn resolve_config(cli: &Cli) -> anyhow::Result<BridgeConfig> {
    let mut config = load_config(Some(&cli.config)).await?;
    if let Some(templates) = &cli.templates {
        config.templates.dir = templates.clone();
    }
    Ok(config)
}

/// Read an action document from disk.
pub async fn read_action(path: &Path) -> anyhow::Result<ActionBody> {
    let raw = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_slice(&raw).with_context(|| format!("invalid action document {}", path.display()))
}
