//! Application error types
//!
//! Maps core errors onto the responses the boundary layer hands back.

use forum_core::DomainError;
use serde::Serialize;
use std::fmt;

use crate::config::ConfigError;

/// Application-wide error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Internal error")]
    Internal(#[source] anyhow::Error),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl AppError {
    /// Get the HTTP-style status code for this error
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::Config(_) | Self::Internal(_) => 500,
            Self::Domain(e) => {
                if e.is_not_found() {
                    404
                } else if e.is_connection() {
                    503
                } else {
                    500
                }
            }
        }
    }

    /// Get error code for responses
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::Domain(e) => e.code(),
        }
    }

    /// Create a not found error for a resource
    #[must_use]
    pub fn not_found(resource: impl fmt::Display) -> Self {
        Self::NotFound(resource.to_string())
    }

    /// Create an internal error from any error
    pub fn internal(err: impl Into<anyhow::Error>) -> Self {
        Self::Internal(err.into())
    }
}

/// Error body handed back across the boundary
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl From<&AppError> for ErrorResponse {
    fn from(err: &AppError) -> Self {
        // Not-found bodies use the fixed wording; the detail stays in the code.
        let message = if err.status_code() == 404 {
            "The resource you requested could not be found.".to_string()
        } else {
            err.to_string()
        };
        Self {
            code: err.error_code().to_string(),
            message,
        }
    }
}

impl From<AppError> for ErrorResponse {
    fn from(err: AppError) -> Self {
        Self::from(&err)
    }
}

/// Result type alias for boundary operations
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(AppError::not_found("user").status_code(), 404);
        assert_eq!(
            AppError::from(DomainError::TopicNotFound(1)).status_code(),
            404
        );
        assert_eq!(AppError::from(DomainError::InvalidTag(String::new())).status_code(), 404);
        assert_eq!(
            AppError::from(DomainError::ConnectionError("x".into())).status_code(),
            503
        );
        assert_eq!(
            AppError::from(DomainError::DatabaseError("x".into())).status_code(),
            500
        );
        assert_eq!(AppError::from(DomainError::usage("x")).status_code(), 500);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(AppError::not_found("user").error_code(), "NOT_FOUND");
        assert_eq!(
            AppError::from(DomainError::PostNotFound(2)).error_code(),
            "UNKNOWN_POST"
        );
        assert_eq!(
            AppError::from(ConfigError::MissingVar("FORUM_DB_USER")).error_code(),
            "CONFIG_ERROR"
        );
    }

    #[test]
    fn test_internal_error_hides_source() {
        let err = AppError::internal(anyhow::anyhow!("boom"));
        assert_eq!(err.status_code(), 500);
        assert_eq!(ErrorResponse::from(&err).message, "Internal error");
    }

    #[test]
    fn test_error_response() {
        let response = ErrorResponse::from(AppError::from(DomainError::TagNotFound("x".into())));
        assert_eq!(response.code, "UNKNOWN_TAG");
        assert_eq!(
            response.message,
            "The resource you requested could not be found."
        );

        let response = ErrorResponse::from(AppError::from(DomainError::DatabaseError(
            "syntax".into(),
        )));
        assert_eq!(response.code, "DATABASE_ERROR");
        assert_eq!(response.message, "Database error: syntax");
    }

    #[test]
    fn test_error_response_json_shape() {
        let response = ErrorResponse::from(AppError::not_found("user named Ghost"));
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            serde_json::json!({
                "code": "NOT_FOUND",
                "message": "The resource you requested could not be found."
            })
        );
    }
}
