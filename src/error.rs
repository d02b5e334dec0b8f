//! Engine error types with HTTP status code mapping.
//!
//! [`EngineError`] is the central error type for the engine. Each variant
//! maps to a specific HTTP status code and structured JSON error response.
//! Empty data is never an error: a student without records resolves to
//! zero-valued metrics further down, not to one of these variants.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 2001,
///     "message": "student not found: s-42",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code.
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category           | HTTP Status               |
/// |-----------|--------------------|---------------------------|
/// | 1000–1999 | Validation         | 400 Bad Request           |
/// | 2000–2999 | Not Found          | 404 Not Found             |
/// | 3000–3999 | Storage / Server   | 500 Internal Server Error |
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Student with the given ID does not exist.
    #[error("student not found: {0}")]
    StudentNotFound(String),

    /// Game with the given ID does not exist.
    #[error("game not found: {0}")]
    GameNotFound(String),

    /// Course with the given ID does not exist.
    #[error("course not found: {0}")]
    CourseNotFound(String),

    /// Request validation failed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Storage layer failure.
    #[error("persistence error: {0}")]
    PersistenceError(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl EngineError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::StudentNotFound(_) => 2001,
            Self::GameNotFound(_) => 2002,
            Self::CourseNotFound(_) => 2003,
            Self::Internal(_) => 3000,
            Self::PersistenceError(_) => 3001,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::StudentNotFound(_) | Self::GameNotFound(_) | Self::CourseNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            Self::PersistenceError(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns `true` for the not-found family of errors.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::StudentNotFound(_) | Self::GameNotFound(_) | Self::CourseNotFound(_)
        )
    }
}

impl From<sqlx::Error> for EngineError {
    fn from(err: sqlx::Error) -> Self {
        Self::PersistenceError(err.to_string())
    }
}

impl IntoResponse for EngineError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(code = self.error_code(), error = %self, "request failed");
        }
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_variants_map_to_404() {
        let errors = [
            EngineError::StudentNotFound("s".to_string()),
            EngineError::GameNotFound("g".to_string()),
            EngineError::CourseNotFound("c".to_string()),
        ];
        for err in errors {
            assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
            assert!(err.is_not_found());
            assert!((2000..3000).contains(&err.error_code()));
        }
    }

    #[test]
    fn validation_maps_to_400() {
        let err = EngineError::InvalidRequest("level must be >= 1".to_string());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.error_code(), 1001);
        assert!(!err.is_not_found());
    }

    #[test]
    fn response_carries_status() {
        let response = EngineError::PersistenceError("down".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
