//! Ephemeral per-operation workspaces.
//!
//! Every apply or destroy runs in a fresh private directory that exists
//! only for the duration of the operation. The directory is removed on
//! success, on failure, on panic, and when the operation future is
//! dropped mid-flight (request cancelled or timed out), because removal
//! is tied to [`tempfile::TempDir`]'s drop.

use std::future::Future;
use std::path::{Path, PathBuf};

use tfconnect_types::config::WorkspaceConfig;
use tfconnect_types::error::BridgeError;

/// Creates and cleans up operation workspaces.
#[derive(Debug, Clone)]
pub struct WorkspaceManager {
    root: PathBuf,
    prefix: String,
}

impl WorkspaceManager {
    pub fn new(config: &WorkspaceConfig) -> Self {
        Self {
            root: config.root.clone().unwrap_or_else(std::env::temp_dir),
            prefix: config.prefix.clone(),
        }
    }

    /// Parent directory new workspaces are created under.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Run `op` inside a newly created workspace, then remove it.
    ///
    /// The workspace path handed to `op` is unique per call, so concurrent
    /// operations never share files. Cleanup errors are logged and never
    /// replace the operation's own result.
    pub async fn with_workspace<F, Fut, T>(&self, op: F) -> Result<T, BridgeError>
    where
        F: FnOnce(PathBuf) -> Fut,
        Fut: Future<Output = Result<T, BridgeError>>,
    {
        let dir = tempfile::Builder::new()
            .prefix(&self.prefix)
            .tempdir_in(&self.root)
            .map_err(|e| {
                BridgeError::WorkspaceCreationFailed(format!("{}: {e}", self.root.display()))
            })?;
        let path = dir.path().to_path_buf();
        tracing::debug!(workspace = %path.display(), "workspace created");

        let result = op(path.clone()).await;

        if let Err(e) = dir.close() {
            tracing::warn!(
                workspace = %path.display(),
                error = %e,
                "failed to remove workspace"
            );
        } else {
            tracing::debug!(workspace = %path.display(), "workspace removed");
        }

        result
    }
}

/// Write `contents` to `dir/name`, readable by the owner only.
pub async fn write_private_file(
    dir: &Path,
    name: &str,
    contents: &[u8],
) -> Result<PathBuf, BridgeError> {
    use tokio::io::AsyncWriteExt;

    let path = dir.join(name);
    let io_err = |e: std::io::Error| BridgeError::WorkspaceIo {
        file: name.to_string(),
        reason: e.to_string(),
    };

    let mut options = tokio::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(0o600);

    let mut file = options.open(&path).await.map_err(io_err)?;
    file.write_all(contents).await.map_err(io_err)?;
    file.flush().await.map_err(io_err)?;

    Ok(path)
}
