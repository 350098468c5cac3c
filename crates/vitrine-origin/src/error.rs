//! API error types and response formatting.
//!
//! Only the JSON endpoints (`/api/tts`, `/debug-social` argument checks)
//! produce these. Page routes never fail: they fall back to default HTML.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// API error type that converts to appropriate HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Invalid request parameters.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// A required upstream integration is not configured.
    #[error("service unavailable: {0}")]
    Unavailable(String),

    /// An upstream API failed.
    #[error("upstream error: {0}")]
    Upstream(String),

    /// Internal server error (filesystem, etc.).
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// JSON error response body.
#[derive(Debug, Clone, Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match &self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone())),
            Self::Unavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "unavailable",
                Some(msg.clone()),
            ),
            Self::Upstream(msg) => {
                tracing::warn!(error = %msg, "upstream failure");
                (
                    StatusCode::BAD_GATEWAY,
                    "upstream_error",
                    Some(msg.clone()),
                )
            }
            Self::Internal(err) => {
                tracing::error!(error = %err, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    Some("An internal error occurred".to_string()),
                )
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}
