//! Error types for the guard layer
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::{header::RETRY_AFTER, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Machine-readable code attached to throttling responses.
pub const RATE_LIMIT_CODE: &str = "RATE_LIMIT_EXCEEDED";

// == Guard Error Enum ==
/// Unified error type for the middleware layer and its admin surface.
#[derive(Error, Debug)]
pub enum GuardError {
    /// Requested resource does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Client exceeded its quota for the current window
    #[error("Too many requests, retry after {retry_after_secs} seconds")]
    RateLimited { retry_after_secs: u64 },

    /// A handler body could not be buffered after it was consumed
    #[error("Failed to read response body: {0}")]
    BodyRead(String),

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for GuardError {
    fn into_response(self) -> Response {
        let message = self.to_string();

        if let GuardError::RateLimited { retry_after_secs } = self {
            let body = Json(json!({
                "error": message,
                "code": RATE_LIMIT_CODE,
                "retryAfter": retry_after_secs,
            }));
            return (
                StatusCode::TOO_MANY_REQUESTS,
                [(RETRY_AFTER, retry_after_secs.to_string())],
                body,
            )
                .into_response();
        }

        let status = match &self {
            GuardError::NotFound(_) => StatusCode::NOT_FOUND,
            GuardError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            GuardError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            GuardError::BodyRead(_) | GuardError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the guard layer.
pub type Result<T> = std::result::Result<T, GuardError>;
