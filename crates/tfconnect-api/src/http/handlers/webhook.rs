//! Action webhook receiver.
//!
//! Verifies the request signature over the raw body, parses the action,
//! and runs it through the `ActionService` synchronously: the response
//! is sent only once the engine run has finished and its status has been
//! reported upstream. The configured request deadline bounds the engine
//! run; an expired run is reported as a failure and answered with 504.

use std::time::Instant;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use secrecy::ExposeSecret;
use serde::Serialize;
use uuid::Uuid;

use tfconnect_infra::webhook::signature::{SIGNATURE_HEADER, TIMESTAMP_HEADER, verify_port_signature};
use tfconnect_types::action::ActionBody;
use tfconnect_types::error::BridgeError;
use tfconnect_types::state::ApplyMode;

use crate::http::error::AppError;
use crate::http::response::{ApiMeta, ApiResponse};
use crate::state::AppState;

/// Body of a successful action response.
#[derive(Debug, Serialize)]
pub struct ActionAccepted {
    pub message: &'static str,
    pub run_id: String,
    pub state_key: String,
    pub mode: ApplyMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
}

/// POST / - Run one action.
pub async fn receive_action(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<ApiResponse<ActionAccepted>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());
    verify_port_signature(
        state.webhook_secret.expose_secret().as_bytes(),
        header(TIMESTAMP_HEADER),
        &body,
        header(SIGNATURE_HEADER),
    )
    .inspect_err(|e| tracing::warn!(request_id = %request_id, error = %e, "rejected webhook"))?;

    let action: ActionBody = serde_json::from_slice(&body)
        .map_err(|e| AppError::Validation(format!("invalid action body: {e}")))?;

    let outcome = state
        .action_service
        .handle_within(&action, state.request_timeout)
        .await
        .inspect_err(|e| {
            if matches!(e, BridgeError::DeadlineExceeded(_)) {
                tracing::error!(
                    request_id = %request_id,
                    run_id = %action.context.run_id,
                    "action timed out"
                );
            }
        })?;

    let meta = ApiMeta::since(request_id, start);
    tracing::info!(
        request_id = %meta.request_id,
        run_id = %outcome.run_id,
        state_key = %outcome.state_key,
        elapsed_ms = meta.response_time_ms,
        "action completed"
    );

    Ok(ApiResponse::success(
        ActionAccepted {
            message: "OK",
            run_id: outcome.run_id,
            state_key: outcome.state_key.into_string(),
            mode: outcome.mode,
            entity_id: outcome.entity_id,
        },
        meta,
    ))
}
