//! Action handling service.
//!
//! `ActionService` is the entry point the transport layer calls with a
//! raw webhook body. It validates the body into an [`ActionEvent`],
//! dispatches on the trigger kind, and reports the final status upstream.
//!
//! Reporting is attempted for every body that carries a run id, whatever
//! the outcome. When the operation itself failed, a reporting failure is
//! logged and the operation's error is returned unchanged. When the
//! operation succeeded, a reporting failure surfaces as
//! [`BridgeError::ReportFailed`].
//!
//! A deadline bounds the operation only. Expiry cancels it and becomes
//! [`BridgeError::DeadlineExceeded`], which is then reported like any other
//! failure, so each run gets exactly one report.

use std::time::Duration;

use tfconnect_types::action::{ActionBody, ActionEvent, TriggerKind};
use tfconnect_types::error::BridgeError;
use tfconnect_types::state::{ActionStatus, OperationOutcome};

use super::orchestrator::Orchestrator;
use crate::engine::EngineDriver;
use crate::report::StatusReporter;

pub struct ActionService<E: EngineDriver, R: StatusReporter> {
    orchestrator: Orchestrator<E>,
    reporter: R,
}

impl<E: EngineDriver, R: StatusReporter> ActionService<E, R> {
    pub fn new(orchestrator: Orchestrator<E>, reporter: R) -> Self {
        Self {
            orchestrator,
            reporter,
        }
    }

    pub fn orchestrator(&self) -> &Orchestrator<E> {
        &self.orchestrator
    }

    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    /// Handle one inbound action end to end.
    pub async fn handle(&self, body: &ActionBody) -> Result<OperationOutcome, BridgeError> {
        self.handle_within(body, None).await
    }

    /// Like [`handle`](Self::handle), cancelling the operation if it has
    /// not finished within `deadline`.
    pub async fn handle_within(
        &self,
        body: &ActionBody,
        deadline: Option<Duration>,
    ) -> Result<OperationOutcome, BridgeError> {
        let result = match ActionEvent::from_body(body) {
            Ok(event) => match deadline {
                Some(limit) => tokio::time::timeout(limit, self.dispatch(&event))
                    .await
                    .unwrap_or(Err(BridgeError::DeadlineExceeded(limit))),
                None => self.dispatch(&event).await,
            },
            Err(e) => Err(e),
        };

        let run_id = body.context.run_id.trim();
        if run_id.is_empty() {
            // Nothing upstream to correlate a report with.
            return result;
        }
        self.report(run_id, result).await
    }

    /// Route a validated event to apply or destroy.
    pub async fn dispatch(&self, event: &ActionEvent) -> Result<OperationOutcome, BridgeError> {
        tracing::info!(
            run_id = %event.run_id,
            trigger = %event.trigger,
            blueprint = %event.blueprint,
            entity = event.entity_ref.as_deref().unwrap_or(""),
            "handling action"
        );
        match event.trigger {
            TriggerKind::Create | TriggerKind::Day2Update => self.orchestrator.apply(event).await,
            TriggerKind::Delete => self.orchestrator.destroy(event).await,
        }
    }

    async fn report(
        &self,
        run_id: &str,
        result: Result<OperationOutcome, BridgeError>,
    ) -> Result<OperationOutcome, BridgeError> {
        let status = match &result {
            Ok(_) => ActionStatus::Success,
            Err(e) => {
                tracing::error!(
                    run_id = %run_id,
                    error = %e,
                    diagnostic = e.diagnostic().unwrap_or(""),
                    "action failed"
                );
                ActionStatus::Failure
            }
        };

        match (self.reporter.report(run_id, status).await, result) {
            (Ok(()), result) => {
                tracing::info!(run_id = %run_id, status = %status, "run status reported");
                result
            }
            (Err(report_err), Ok(_)) => Err(BridgeError::ReportFailed(report_err)),
            (Err(report_err), Err(original)) => {
                tracing::warn!(
                    run_id = %run_id,
                    error = %report_err,
                    "failed to report run failure upstream"
                );
                Err(original)
            }
        }
    }
}
