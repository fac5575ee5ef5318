//! Error handling module
//!
//! Centralized error types and HTTP response conversion.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// Application-wide Result type
pub type AppResult<T> = Result<T, AppError>;

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Client errors (4xx)
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Malformed identifier: {0}")]
    MalformedId(String),

    #[error("Transaction not found: {0}")]
    TransactionNotFound(String),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Authentication required: {0}")]
    Authentication(String),

    #[error("Forbidden: {0}")]
    Authorization(String),

    #[error("User already exists: {0}")]
    UserAlreadyExists(String),

    // Domain errors
    #[error(transparent)]
    Domain(#[from] crate::domain::DomainError),

    // Server errors (5xx)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

impl From<crate::policy::PolicyDenial> for AppError {
    fn from(denial: crate::policy::PolicyDenial) -> Self {
        Self::Authorization(denial.reason)
    }
}

impl From<crate::domain::AmountError> for AppError {
    fn from(err: crate::domain::AmountError) -> Self {
        Self::Validation(err.to_string())
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub error_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_code, details) = match &self {
            // 400 Bad Request
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "validation_error", Some(msg.clone())),
            AppError::MalformedId(msg) => (StatusCode::BAD_REQUEST, "malformed_id", Some(msg.clone())),
            AppError::UserAlreadyExists(msg) => {
                (StatusCode::BAD_REQUEST, "user_already_exists", Some(msg.clone()))
            }
            AppError::Domain(err) => (StatusCode::BAD_REQUEST, "validation_error", Some(err.to_string())),

            // 401 Unauthorized
            AppError::Authentication(msg) => {
                (StatusCode::UNAUTHORIZED, "authentication_required", Some(msg.clone()))
            }

            // 403 Forbidden
            AppError::Authorization(msg) => (StatusCode::FORBIDDEN, "forbidden", Some(msg.clone())),

            // 404 Not Found
            AppError::TransactionNotFound(id) => {
                (StatusCode::NOT_FOUND, "transaction_not_found", Some(id.clone()))
            }
            AppError::UserNotFound(id) => (StatusCode::NOT_FOUND, "user_not_found", Some(id.clone())),

            // 500 Internal Server Error (opaque to the caller)
            AppError::Database(err) => {
                tracing::error!("Database error: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "database_error", None)
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
            AppError::Config(err) => {
                tracing::error!("Configuration error: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "config_error", None)
            }
        };

        let body = ErrorResponse {
            error: self.to_string(),
            error_code: error_code.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}
