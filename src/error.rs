//! Error handling module
//!
//! Provides unified error types and handling for the entire application.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// Content mutation attempted while a stakeholder review is in flight.
    #[error("A stakeholder review is in progress: {0}")]
    ReviewPending(String),

    /// An external host (content, e-signature, screenshot) returned a
    /// non-success result. The upstream message is forwarded verbatim.
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// A multi-step workflow failed after some side effects committed.
    /// `completed` names what already happened so operators can reconcile.
    #[error("Partial failure after {completed}: {message}")]
    PartialFailure { completed: String, message: String },

    #[error("Metadata store error: {0}")]
    Store(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_code, message, details) = match &self {
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                msg.clone(),
                None,
            ),
            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                msg.clone(),
                None,
            ),
            AppError::Conflict(msg) => (
                StatusCode::CONFLICT,
                "CONFLICT",
                msg.clone(),
                None,
            ),
            AppError::ReviewPending(msg) => (
                StatusCode::CONFLICT,
                "REVIEW_IN_PROGRESS",
                msg.clone(),
                None,
            ),
            AppError::Upstream(msg) => (
                StatusCode::BAD_GATEWAY,
                "UPSTREAM_ERROR",
                msg.clone(),
                None,
            ),
            AppError::PartialFailure { completed, message } => {
                error!("Partial failure after {}: {}", completed, message);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "PARTIAL_FAILURE",
                    format!("Operation failed after {} had already completed", completed),
                    Some(message.clone()),
                )
            }
            AppError::Store(msg) => {
                error!("Metadata store error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORE_ERROR",
                    "A metadata store error occurred".to_string(),
                    Some(msg.clone()),
                )
            }
            AppError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                "BAD_REQUEST",
                msg.clone(),
                None,
            ),
            AppError::Internal(msg) => {
                error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                    Some(msg.clone()),
                )
            }
            AppError::Config(msg) => {
                error!("Configuration error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "CONFIG_ERROR",
                    "A configuration error occurred".to_string(),
                    Some(msg.clone()),
                )
            }
        };

        let body = Json(ErrorResponse {
            success: false,
            message,
            error: details,
            code: Some(error_code.to_string()),
        });

        (status, body).into_response()
    }
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, AppError>;

/// Helper function to create a validation error
pub fn validation_error(msg: impl Into<String>) -> AppError {
    AppError::Validation(msg.into())
}

/// Helper function to create a not found error
pub fn not_found_error(msg: impl Into<String>) -> AppError {
    AppError::NotFound(msg.into())
}

/// Helper function to create a conflict error
pub fn conflict_error(msg: impl Into<String>) -> AppError {
    AppError::Conflict(msg.into())
}
