//! Error types for the gateway daemon
//!
//! `DaemonError` covers process lifecycle; `ApiError` carries the gateway
//! taxonomy to the HTTP edge. Upstream HTTP error statuses are NOT mapped
//! here -- they pass through the proxy untouched; only the gateway's own
//! rejections take these shapes.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use flowgate_types::GatewayError;
use serde::Serialize;
use thiserror::Error;

/// Daemon-level errors
#[derive(Debug, Error)]
pub enum DaemonError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Server startup error
    #[error("Server error: {0}")]
    Server(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for daemon operations
pub type DaemonResult<T> = Result<T, DaemonError>;

/// A gateway rejection on its way out as an HTTP response
#[derive(Debug, Error)]
#[error(transparent)]
pub struct ApiError(#[from] pub GatewayError);

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self.0 {
            GatewayError::ContextMissing(_) => (StatusCode::BAD_REQUEST, "CONTEXT_MISSING"),
            GatewayError::NamingViolation(_) => (StatusCode::BAD_REQUEST, "NAMING_VIOLATION"),
            GatewayError::DisallowedTaskType(_) => (StatusCode::BAD_REQUEST, "DISALLOWED_TASK_TYPE"),
            GatewayError::NameMismatch { .. } => (StatusCode::BAD_REQUEST, "NAME_MISMATCH"),
            GatewayError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            GatewayError::AuthorizationDenied(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            GatewayError::Upstream(_) => (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR"),
            GatewayError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        let body = ErrorResponse {
            error: self.to_string(),
            code: code.to_string(),
        };

        (status, Json(body)).into_response()
    }
}
