//! External engine port.
//!
//! The declarative-infrastructure engine is opaque to this crate. It is
//! reached only through [`EngineDriver`], which the infrastructure layer
//! implements over the real binary and tests implement with fakes.

pub mod state;

use std::future::Future;
use std::path::Path;

use tfconnect_types::error::EngineError;
use tfconnect_types::state::ApplyMode;

/// Capability interface over the engine's command line.
///
/// Each call runs the engine once inside `workdir` and completes when the
/// engine exits. A non-zero exit becomes [`EngineError::Failed`] with the
/// engine's stderr verbatim; callers only branch on success vs failure.
pub trait EngineDriver: Send + Sync {
    /// Initialize the working directory (backend + providers).
    fn init(&self, workdir: &Path) -> impl Future<Output = Result<(), EngineError>> + Send;

    /// Apply the configuration in `workdir` with the given variable file.
    ///
    /// [`ApplyMode::Destroy`] tears down everything tracked under the
    /// configured backend key instead of converging toward the config.
    fn apply(
        &self,
        workdir: &Path,
        var_file: &Path,
        mode: ApplyMode,
    ) -> impl Future<Output = Result<(), EngineError>> + Send;

    /// Read back the current state as the engine's JSON representation.
    fn show(
        &self,
        workdir: &Path,
    ) -> impl Future<Output = Result<serde_json::Value, EngineError>> + Send;
}
