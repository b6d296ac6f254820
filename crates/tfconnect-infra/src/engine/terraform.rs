//! Terraform CLI driver.
//!
//! Implements [`EngineDriver`] by spawning the terraform binary once per
//! call. Every invocation runs non-interactively (`-input=false`,
//! `-no-color`, `TF_IN_AUTOMATION=1`) inside the operation's workspace.
//! Child processes are killed if the calling future is dropped, which is
//! how a request deadline cancels an in-flight run.
//!
//! The binary is never downloaded. It must be provisioned before startup,
//! either at `engine.binary` or as `terraform` on `PATH`, and
//! [`TerraformCli::install`] only checks that it reports exactly the pinned
//! version.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use serde::Deserialize;

use tfconnect_core::engine::EngineDriver;
use tfconnect_types::config::EngineConfig;
use tfconnect_types::error::EngineError;
use tfconnect_types::state::ApplyMode;

/// Binary looked up on `PATH` when no explicit path is configured.
const DEFAULT_BINARY: &str = "terraform";

/// Subset of `terraform version -json`.
#[derive(Debug, Deserialize)]
struct VersionOutput {
    terraform_version: String,
}

/// Handle to an installed, version-checked terraform binary.
#[derive(Debug, Clone)]
pub struct TerraformCli {
    binary: PathBuf,
    version: semver::Version,
}

impl TerraformCli {
    /// Resolve the already-provisioned binary and verify it is the pinned
    /// version. Nothing is fetched.
    ///
    /// Must complete before any operation runs; a missing binary or a
    /// version mismatch is a startup error.
    pub async fn install(config: &EngineConfig) -> Result<Self, EngineError> {
        let binary = config
            .binary
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_BINARY));

        let version = probe_version(&binary).await?;
        if version != config.required_version {
            return Err(EngineError::VersionMismatch {
                required: config.required_version.to_string(),
                found: version.to_string(),
            });
        }

        tracing::info!(
            binary = %binary.display(),
            version = %version,
            "terraform ready"
        );
        Ok(Self { binary, version })
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    pub fn version(&self) -> &semver::Version {
        &self.version
    }

    /// Run one subcommand in `workdir` and return its stdout.
    async fn run(&self, workdir: &Path, args: Vec<OsString>) -> Result<Vec<u8>, EngineError> {
        let command = describe(&args);
        tracing::debug!(workdir = %workdir.display(), command = %command, "spawning terraform");

        let output = tokio::process::Command::new(&self.binary)
            .args(&args)
            .current_dir(workdir)
            .env("TF_IN_AUTOMATION", "1")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| EngineError::Spawn {
                command: command.clone(),
                reason: format!("{}: {e}", self.binary.display()),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
            tracing::warn!(
                command = %command,
                exit_code = ?output.status.code(),
                "terraform failed"
            );
            return Err(EngineError::Failed {
                command,
                exit_code: output.status.code(),
                stderr,
            });
        }

        Ok(output.stdout)
    }
}

impl EngineDriver for TerraformCli {
    async fn init(&self, workdir: &Path) -> Result<(), EngineError> {
        self.run(workdir, init_args()).await.map(|_| ())
    }

    async fn apply(&self, workdir: &Path, var_file: &Path, mode: ApplyMode) -> Result<(), EngineError> {
        self.run(workdir, apply_args(var_file, mode)).await.map(|_| ())
    }

    async fn show(&self, workdir: &Path) -> Result<serde_json::Value, EngineError> {
        let stdout = self.run(workdir, show_args()).await?;
        serde_json::from_slice(&stdout).map_err(|e| EngineError::Output {
            command: "terraform show".to_string(),
            reason: e.to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// Argument construction
// ---------------------------------------------------------------------------

fn init_args() -> Vec<OsString> {
    ["init", "-input=false", "-no-color"]
        .into_iter()
        .map(OsString::from)
        .collect()
}

fn apply_args(var_file: &Path, mode: ApplyMode) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["apply".into()];
    if mode == ApplyMode::Destroy {
        args.push("-destroy".into());
    }
    args.extend(["-auto-approve", "-input=false", "-no-color"].map(OsString::from));

    let mut var_flag = OsString::from("-var-file=");
    var_flag.push(var_file.as_os_str());
    args.push(var_flag);
    args
}

fn show_args() -> Vec<OsString> {
    ["show", "-json", "-no-color"]
        .into_iter()
        .map(OsString::from)
        .collect()
}

/// `terraform <subcommand>` label for logs and errors.
fn describe(args: &[OsString]) -> String {
    match args.first() {
        Some(sub) => format!("terraform {}", sub.to_string_lossy()),
        None => "terraform".to_string(),
    }
}

async fn probe_version(binary: &Path) -> Result<semver::Version, EngineError> {
    let command = "terraform version".to_string();
    let output = tokio::process::Command::new(binary)
        .args(["version", "-json"])
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| EngineError::Spawn {
            command: command.clone(),
            reason: format!("{}: {e}", binary.display()),
        })?;

    if !output.status.success() {
        return Err(EngineError::Failed {
            command,
            exit_code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }

    let parsed: VersionOutput =
        serde_json::from_slice(&output.stdout).map_err(|e| EngineError::Output {
            command: command.clone(),
            reason: e.to_string(),
        })?;
    semver::Version::parse(&parsed.terraform_version).map_err(|e| EngineError::Output {
        command,
        reason: format!("bad version '{}': {e}", parsed.terraform_version),
    })
}
