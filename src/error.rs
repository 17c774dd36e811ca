//! Error types for VidTube
//!
//! All errors in the application are converted to `AppError`,
//! which implements `IntoResponse` and renders the same envelope
//! as successful responses.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Application-wide error type
///
/// Validation and authorization failures are raised before any store
/// mutation. Store failures on the write path surface as `Database` or
/// `Internal` and never carry raw store text into the response.
#[derive(Debug, Error)]
pub enum AppError {
    /// Missing or malformed input (400)
    #[error("{0}")]
    Validation(String),

    /// No acting identity where one is required (401)
    #[error("Authentication required")]
    Unauthorized,

    /// Acting identity is not the owner of the resource (403)
    #[error("You are not the owner of this {0}")]
    Forbidden(&'static str),

    /// Referenced entity does not exist (404)
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Operation exceeded the caller's deadline (503)
    #[error("Operation timed out: {0}")]
    Timeout(&'static str),

    /// Database error (500)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Configuration error (500)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal server error (500)
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// HTTP status for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Timeout(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Database(_) | AppError::Config(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_type(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "validation",
            AppError::Unauthorized => "unauthorized",
            AppError::Forbidden(_) => "forbidden",
            AppError::NotFound(_) => "not_found",
            AppError::Timeout(_) => "timeout",
            AppError::Database(_) => "database",
            AppError::Config(_) => "config",
            AppError::Internal(_) => "internal",
        }
    }

    /// Message safe to show to API clients.
    pub fn public_message(&self) -> String {
        match self {
            AppError::Timeout(_) => "Service temporarily unavailable, please retry".to_string(),
            AppError::Database(_) | AppError::Config(_) | AppError::Internal(_) => {
                "Internal server error".to_string()
            }
            _ => self.to_string(),
        }
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(format!("Invalid request body: {}", rejection.body_text()))
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Validation(format!("Invalid query string: {}", rejection.body_text()))
    }
}

impl IntoResponse for AppError {
    /// Convert error to the uniform response envelope
    fn into_response(self) -> Response {
        let status = self.status_code();

        match &self {
            AppError::Database(error) => tracing::error!(%error, "Database operation failed"),
            AppError::Internal(error) => tracing::error!(error = %error, "Internal error"),
            AppError::Config(message) => tracing::error!(%message, "Configuration error"),
            AppError::Timeout(operation) => tracing::warn!(%operation, "Operation timed out"),
            _ => tracing::debug!(error = %self, "Request rejected"),
        }

        crate::metrics::ERRORS_TOTAL
            .with_label_values(&[self.error_type()])
            .inc();

        let envelope = crate::api::ApiResponse::<()>::failure(status, self.public_message());
        (status, axum::Json(envelope)).into_response()
    }
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
