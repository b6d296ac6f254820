//! Response envelope shared by successes and failures.
//!
//! ```json
//! { "data": { ... }, "meta": { "request_id": "...", "timestamp": "...", "response_time_ms": 5 } }
//! ```
//!
//! Failures carry `"data": null` plus an `errors` list, built by
//! [`crate::http::error::AppError`].

use std::time::Instant;

use axum::Json;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Per-request metadata.
#[derive(Debug, Clone, Serialize)]
pub struct ApiMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
    pub response_time_ms: u64,
}

impl ApiMeta {
    /// Stamp a response for `request_id`, timed from `started`.
    pub fn since(request_id: impl Into<String>, started: Instant) -> Self {
        Self {
            request_id: request_id.into(),
            timestamp: Utc::now(),
            response_time_ms: started.elapsed().as_millis() as u64,
        }
    }

    /// Metadata for responses produced outside a handler's timing scope.
    pub fn detached() -> Self {
        Self {
            request_id: String::new(),
            timestamp: Utc::now(),
            response_time_ms: 0,
        }
    }
}

/// Successful payload inside the envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ApiMeta,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T, meta: ApiMeta) -> Self {
        Self { data, meta }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn success_is_200_json_envelope() {
        let meta = ApiMeta::since("req-1", Instant::now());
        let resp = ApiResponse::success(serde_json::json!({"message": "OK"}), meta).into_response();

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers()[axum::http::header::CONTENT_TYPE],
            "application/json"
        );
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["data"]["message"], "OK");
        assert_eq!(value["meta"]["request_id"], "req-1");
        assert!(value["meta"]["timestamp"].is_string());
        assert!(value.get("errors").is_none());
    }

    #[test]
    fn detached_meta_has_no_request_id() {
        let meta = ApiMeta::detached();
        assert!(meta.request_id.is_empty());
        assert_eq!(meta.response_time_ms, 0);
    }
}
