//! Status reporting port.

use std::future::Future;

use tfconnect_types::error::ReportError;
use tfconnect_types::state::ActionStatus;

/// Reports a run's final status to the system that triggered it.
pub trait StatusReporter: Send + Sync {
    fn report(
        &self,
        run_id: &str,
        status: ActionStatus,
    ) -> impl Future<Output = Result<(), ReportError>> + Send;
}
