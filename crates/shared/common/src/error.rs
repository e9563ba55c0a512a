//! Unified error handling.
//!
//! Provides a single error type for every user-service operation. Callers
//! (the CLI, or any transport layered on top) map variants through
//! [`AppError::code`] and [`AppError::user_message`] instead of matching on
//! message text.

use domain::{error::DomainError, validation::format_field_errors, FieldError};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// Application error types.
///
/// None of these are retried automatically. `VersionConflict` carries the
/// identifier and attempted version so a caller can re-read and decide.
#[derive(Error, Debug)]
pub enum AppError {
    // Record lookups
    #[error("User with identifier '{identifier}' not found")]
    NotFound { identifier: String },

    // Optimistic locking
    #[error("User {id} has been modified by another process (expected version {expected})")]
    VersionConflict {
        id: Uuid,
        expected: i32,
        actual: Option<i32>,
    },

    // Uniqueness
    #[error("Username '{0}' is already taken")]
    UsernameTaken(String),

    #[error("Email '{0}' is already registered")]
    EmailTaken(String),

    // Validation
    #[error("Validation failed: {}", format_field_errors(.0))]
    Validation(Vec<FieldError>),

    // Store returned an outcome no other variant explains
    #[error("Store error: {0}")]
    Store(String),

    #[cfg(feature = "database")]
    #[error("Database error")]
    Database(#[from] sea_orm::DbErr),

    // Internal
    #[error("Internal server error")]
    Internal(String),
}

/// Error body for callers that render errors as JSON
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldError>,
}

impl AppError {
    /// Get stable error code for clients
    pub fn code(&self) -> &'static str {
        match self {
            AppError::NotFound { .. } => "USER_NOT_FOUND",
            AppError::VersionConflict { .. } => "VERSION_MISMATCH",
            AppError::UsernameTaken(_) => "USERNAME_ALREADY_EXISTS",
            AppError::EmailTaken(_) => "EMAIL_ALREADY_EXISTS",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Store(_) => "STORE_ERROR",
            #[cfg(feature = "database")]
            AppError::Database(_) => "DATABASE_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Get user-facing message (hides internal details)
    pub fn user_message(&self) -> String {
        match self {
            AppError::VersionConflict { .. } => {
                "Resource has been modified by another process. Please refresh and try again"
                    .to_string()
            }

            // Hide details for internal errors
            AppError::Store(msg) => {
                tracing::error!("Store error: {}", msg);
                "The store rejected the operation".to_string()
            }
            #[cfg(feature = "database")]
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                "A database error occurred".to_string()
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "An internal error occurred".to_string()
            }

            // Use default message for others
            _ => self.to_string(),
        }
    }

    /// Build the serialisable error body
    pub fn to_response(&self) -> ErrorResponse {
        let fields = match self {
            AppError::Validation(fields) => fields.clone(),
            _ => Vec::new(),
        };

        ErrorResponse {
            error: ErrorBody {
                code: self.code().to_string(),
                message: self.user_message(),
                fields,
            },
        }
    }
}

// =============================================================================
// Domain Error Conversion
// =============================================================================

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(fields) => AppError::Validation(fields),
            DomainError::Credential(msg) => AppError::Internal(msg),
        }
    }
}

/// Result type alias
pub type AppResult<T> = Result<T, AppError>;

/// Extension trait for Option -> AppError conversion
pub trait OptionExt<T> {
    fn ok_or_not_found(self, identifier: impl std::fmt::Display) -> AppResult<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_not_found(self, identifier: impl std::fmt::Display) -> AppResult<T> {
        self.ok_or_else(|| AppError::not_found(identifier))
    }
}

/// Convenience constructors
impl AppError {
    pub fn not_found(identifier: impl std::fmt::Display) -> Self {
        AppError::NotFound {
            identifier: identifier.to_string(),
        }
    }

    pub fn version_conflict(id: Uuid, expected: i32, actual: Option<i32>) -> Self {
        AppError::VersionConflict {
            id,
            expected,
            actual,
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Validation(vec![FieldError::new(field, message)])
    }

    pub fn store(msg: impl Into<String>) -> Self {
        AppError::Store(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        AppError::Internal(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(AppError::not_found("ID:1").code(), "USER_NOT_FOUND");
        assert_eq!(
            AppError::version_conflict(Uuid::new_v4(), 1, Some(2)).code(),
            "VERSION_MISMATCH"
        );
        assert_eq!(
            AppError::UsernameTaken("alice".into()).code(),
            "USERNAME_ALREADY_EXISTS"
        );
        assert_eq!(
            AppError::EmailTaken("a@x.com".into()).code(),
            "EMAIL_ALREADY_EXISTS"
        );
        assert_eq!(AppError::store("zero rows").code(), "STORE_ERROR");
    }

    #[test]
    fn test_version_conflict_keeps_context() {
        let id = Uuid::new_v4();
        let err = AppError::version_conflict(id, 1, Some(2));

        match err {
            AppError::VersionConflict {
                id: got,
                expected,
                actual,
            } => {
                assert_eq!(got, id);
                assert_eq!(expected, 1);
                assert_eq!(actual, Some(2));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let err = AppError::store("UPDATE affected 0 rows for id 42");
        assert!(!err.user_message().contains("42"));

        let err = AppError::internal("argon2 exploded");
        assert_eq!(err.user_message(), "An internal error occurred");
    }

    #[test]
    fn test_validation_response_lists_fields() {
        let err = AppError::from(DomainError::field("email", "must be a valid email address"));
        let body = serde_json::to_value(err.to_response()).unwrap();

        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(body["error"]["fields"][0]["field"], "email");
    }

    #[test]
    fn test_ok_or_not_found() {
        let missing: Option<u8> = None;
        let err = missing.ok_or_not_found("username:alice").unwrap_err();

        assert!(matches!(err, AppError::NotFound { ref identifier } if identifier == "username:alice"));
    }
}
