/// Unified error types for Gym Desk
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for the service
#[derive(Error, Debug)]
pub enum GymError {
    /// Database errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Schema migration errors
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Authentication errors
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Not found errors
    #[error("Not found: {0}")]
    NotFound(String),

    /// Conflict errors (e.g., duplicate member email)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal server errors
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl GymError {
    /// Map a unique-constraint violation to a conflict, leaving other errors untouched
    pub fn conflict_on_unique(err: sqlx::Error, message: &str) -> Self {
        match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                GymError::Conflict(message.to_string())
            }
            _ => GymError::Database(err),
        }
    }
}

impl From<validator::ValidationErrors> for GymError {
    fn from(errors: validator::ValidationErrors) -> Self {
        GymError::Validation(errors.to_string())
    }
}

/// Error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

/// Convert GymError to HTTP response
impl IntoResponse for GymError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            GymError::Authentication(_) => (
                StatusCode::UNAUTHORIZED,
                "AuthenticationRequired",
                self.to_string(),
            ),
            GymError::Validation(_) => (
                StatusCode::BAD_REQUEST,
                "InvalidRequest",
                self.to_string(),
            ),
            GymError::NotFound(_) => (
                StatusCode::NOT_FOUND,
                "NotFound",
                self.to_string(),
            ),
            GymError::Conflict(_) => (
                StatusCode::CONFLICT,
                "Conflict",
                self.to_string(),
            ),
            GymError::Database(_)
            | GymError::Migration(_)
            | GymError::Internal(_)
            | GymError::Io(_) => {
                tracing::error!(error = %self, "Request failed with a system error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "InternalServerError",
                    "Internal server error".to_string(), // Don't leak details
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
        });

        (status, body).into_response()
    }
}

/// Result type alias for service operations
pub type GymResult<T> = Result<T, GymError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let cases = vec![
            (GymError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (GymError::Conflict("x".into()), StatusCode::CONFLICT),
            (GymError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (GymError::Authentication("x".into()), StatusCode::UNAUTHORIZED),
            (GymError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (
                GymError::Database(sqlx::Error::RowNotFound),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[test]
    fn test_non_unique_errors_stay_database_errors() {
        let err = GymError::conflict_on_unique(sqlx::Error::RowNotFound, "taken");
        assert!(matches!(err, GymError::Database(_)));
    }
}
