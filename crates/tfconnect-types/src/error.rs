use thiserror::Error;

/// Errors that end an apply or destroy operation.
///
/// Every variant is terminal for the current operation; nothing is
/// retried internally.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("resource template '{blueprint}' not found at {path}")]
    TemplateNotFound { blueprint: String, path: String },

    #[error("bootstrap template error: {0}")]
    TemplateError(String),

    #[error("failed to create workspace: {0}")]
    WorkspaceCreationFailed(String),

    #[error("failed to write workspace file {file}: {reason}")]
    WorkspaceIo { file: String, reason: String },

    #[error("failed to serialize variable file: {0}")]
    SerializationError(String),

    #[error("engine init failed: {0}")]
    EngineInitFailed(EngineError),

    #[error("engine {mode} failed: {source}")]
    EngineApplyFailed {
        mode: crate::state::ApplyMode,
        source: EngineError,
    },

    #[error("entity reference is empty, cannot destroy")]
    MissingEntityReference,

    #[error("unknown action: {0}")]
    UnknownTrigger(String),

    #[error("invalid action event: {0}")]
    InvalidEvent(String),

    #[error("operation succeeded but reporting the run status failed: {0}")]
    ReportFailed(ReportError),

    #[error("action did not finish within {}s", .0.as_secs())]
    DeadlineExceeded(std::time::Duration),
}

impl BridgeError {
    /// Engine diagnostic text, when the failure came from the engine.
    pub fn diagnostic(&self) -> Option<&str> {
        match self {
            BridgeError::EngineInitFailed(e) | BridgeError::EngineApplyFailed { source: e, .. } => {
                e.diagnostic()
            }
            _ => None,
        }
    }

    /// Whether the inbound request itself was malformed, as opposed to
    /// the operation failing while running.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            BridgeError::UnknownTrigger(_) | BridgeError::InvalidEvent(_)
        )
    }
}

/// Failure of a single engine invocation.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine binary could not be started.
    #[error("failed to run {command}: {reason}")]
    Spawn { command: String, reason: String },

    /// The engine ran and reported failure. `stderr` is verbatim.
    #[error("{command} exited with {}: {stderr}", describe_exit(.exit_code))]
    Failed {
        command: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    /// The engine succeeded but its output could not be interpreted.
    #[error("unexpected output from {command}: {reason}")]
    Output { command: String, reason: String },

    /// The installed engine does not satisfy the configured version.
    #[error("engine version mismatch: required {required}, found {found}")]
    VersionMismatch { required: String, found: String },
}

impl EngineError {
    /// The engine's own diagnostic text, if it produced any.
    pub fn diagnostic(&self) -> Option<&str> {
        match self {
            EngineError::Failed { stderr, .. } if !stderr.trim().is_empty() => Some(stderr),
            _ => None,
        }
    }
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("status {c}"),
        None => "signal".to_string(),
    }
}

/// Failure to report a run status upstream.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("authentication with status endpoint failed: {0}")]
    Authentication(String),

    #[error("status endpoint returned {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("status endpoint unreachable: {0}")]
    Transport(String),
}

/// Configuration problems detected at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("failed to parse config file {path}: {reason}")]
    Parse { path: String, reason: String },

    #[error("missing required setting: {0}")]
    Missing(&'static str),

    #[error("invalid setting {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}
