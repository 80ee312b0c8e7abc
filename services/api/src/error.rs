//! services/api/src/error.rs
//!
//! Defines the error types for the API service: `ApiError` for startup and
//! infrastructure failures, and `HttpError` for what a request handler answers with.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use misinfo_core::AnalysisError;
use serde::Serialize;
use utoipa::ToSchema;

use crate::config::ConfigError;

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error from the underlying database library.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration Error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

//=========================================================================================
// Request-level Errors
//=========================================================================================

/// The JSON body of every non-2xx response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    pub message: String,
}

/// An error answered to an HTTP caller.
#[derive(Debug)]
pub struct HttpError {
    pub status: StatusCode,
    pub message: String,
}

impl HttpError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "Authentication required")
    }
}

impl From<AnalysisError> for HttpError {
    fn from(err: AnalysisError) -> Self {
        let status = match &err {
            AnalysisError::Validation(_) => StatusCode::BAD_REQUEST,
            AnalysisError::Classification(_) => StatusCode::BAD_GATEWAY,
            AnalysisError::Persistence(_) => StatusCode::SERVICE_UNAVAILABLE,
            AnalysisError::NotFound(_) => StatusCode::NOT_FOUND,
        };
        if status.is_server_error() {
            tracing::error!("request failed: {}", err);
        }
        Self::new(status, err.to_string())
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { message: self.message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analysis_errors_map_to_statuses() {
        let cases = [
            (AnalysisError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (AnalysisError::Classification("x".into()), StatusCode::BAD_GATEWAY),
            (AnalysisError::Persistence("x".into()), StatusCode::SERVICE_UNAVAILABLE),
            (AnalysisError::NotFound("x".into()), StatusCode::NOT_FOUND),
        ];
        for (err, status) in cases {
            assert_eq!(HttpError::from(err).status, status);
        }
    }
}
