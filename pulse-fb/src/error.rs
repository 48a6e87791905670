//! Error types for pulse-fb
//!
//! Maps the pipeline's error taxonomy onto HTTP responses: validation
//! failures are 400s with corrective messages, storage failures are 503s
//! ("data unavailable", never a fake-empty success), and provider
//! failures on the on-demand insights path are 502s.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::models::ValidationError;
use crate::services::orchestrator::SubmissionError;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request shape or parameters (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Feedback input failed validation (400)
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Storage failure (503): the data is unavailable, which is distinct
    /// from an empty store
    #[error("Feedback data is unavailable: {0}")]
    StorageUnavailable(String),

    /// Enrichment provider failure on an on-demand path (502)
    #[error("Enrichment provider error: {0}")]
    Provider(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<SubmissionError> for ApiError {
    fn from(e: SubmissionError) -> Self {
        match e {
            SubmissionError::Rejected(v) => ApiError::Validation(v),
            SubmissionError::Storage(e) => ApiError::StorageUnavailable(e.to_string()),
        }
    }
}

impl From<pulse_common::Error> for ApiError {
    fn from(e: pulse_common::Error) -> Self {
        match e {
            pulse_common::Error::Database(e) => ApiError::StorageUnavailable(e.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::Validation(ref err) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_FAILED",
                err.to_string(),
            ),
            ApiError::StorageUnavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "STORAGE_UNAVAILABLE",
                msg,
            ),
            ApiError::Provider(msg) => (StatusCode::BAD_GATEWAY, "PROVIDER_ERROR", msg),
            ApiError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                msg,
            ),
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
