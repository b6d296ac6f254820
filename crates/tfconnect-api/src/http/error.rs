//! Application error type mapping to HTTP status codes and envelope format.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use tfconnect_infra::webhook::signature::SignatureError;
use tfconnect_types::error::BridgeError;

use crate::http::response::ApiMeta;

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// The action failed, or was rejected before running.
    Bridge(BridgeError),
    /// Webhook signature verification failed.
    Signature(SignatureError),
    /// Request body could not be parsed.
    Validation(String),
}

impl From<BridgeError> for AppError {
    fn from(e: BridgeError) -> Self {
        AppError::Bridge(e)
    }
}

impl From<SignatureError> for AppError {
    fn from(e: SignatureError) -> Self {
        AppError::Signature(e)
    }
}

impl AppError {
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Bridge(e) => (bridge_status(e), bridge_code(e)),
            AppError::Signature(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
        }
    }

    fn message(&self) -> String {
        match self {
            AppError::Bridge(e) => e.to_string(),
            AppError::Signature(e) => e.to_string(),
            AppError::Validation(msg) => msg.clone(),
        }
    }
}

fn bridge_status(e: &BridgeError) -> StatusCode {
    match e {
        BridgeError::DeadlineExceeded(_) => StatusCode::GATEWAY_TIMEOUT,
        e if e.is_client_error() => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn bridge_code(e: &BridgeError) -> &'static str {
    match e {
        BridgeError::TemplateNotFound { .. } => "TEMPLATE_NOT_FOUND",
        BridgeError::TemplateError(_) => "TEMPLATE_ERROR",
        BridgeError::WorkspaceCreationFailed(_) | BridgeError::WorkspaceIo { .. } => {
            "WORKSPACE_ERROR"
        }
        BridgeError::SerializationError(_) => "SERIALIZATION_ERROR",
        BridgeError::EngineInitFailed(_) => "ENGINE_INIT_FAILED",
        BridgeError::EngineApplyFailed { .. } => "ENGINE_APPLY_FAILED",
        BridgeError::MissingEntityReference => "MISSING_ENTITY_REFERENCE",
        BridgeError::UnknownTrigger(_) => "UNKNOWN_TRIGGER",
        BridgeError::InvalidEvent(_) => "VALIDATION_ERROR",
        BridgeError::ReportFailed(_) => "REPORT_FAILED",
        BridgeError::DeadlineExceeded(_) => "TIMEOUT",
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let message = self.message();

        let body = json!({
            "data": null,
            "meta": ApiMeta::detached(),
            "errors": [{
                "code": code,
                "message": message,
            }]
        });

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tfconnect_types::error::{EngineError, ReportError};
    use tfconnect_types::state::ApplyMode;

    #[test]
    fn client_errors_map_to_400() {
        let err = AppError::from(BridgeError::UnknownTrigger("restart".to_string()));
        assert_eq!(
            err.status_and_code(),
            (StatusCode::BAD_REQUEST, "UNKNOWN_TRIGGER")
        );
    }

    #[test]
    fn operation_failures_map_to_500() {
        let err = AppError::from(BridgeError::EngineApplyFailed {
            mode: ApplyMode::Apply,
            source: EngineError::Failed {
                command: "terraform apply".to_string(),
                exit_code: Some(1),
                stderr: "Error: boom".to_string(),
            },
        });
        assert_eq!(
            err.status_and_code(),
            (StatusCode::INTERNAL_SERVER_ERROR, "ENGINE_APPLY_FAILED")
        );
        assert!(err.message().contains("Error: boom"));

        let err = AppError::from(BridgeError::ReportFailed(ReportError::Transport(
            "refused".to_string(),
        )));
        assert_eq!(err.status_and_code().0, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn signature_and_timeout_codes() {
        assert_eq!(
            AppError::from(SignatureError::Mismatch).status_and_code().0,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::from(BridgeError::DeadlineExceeded(std::time::Duration::from_secs(5)))
                .status_and_code(),
            (StatusCode::GATEWAY_TIMEOUT, "TIMEOUT")
        );
    }
}
