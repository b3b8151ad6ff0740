/**
 * Backend Error Types
 *
 * This module defines the error type returned by every service and
 * resolver in the backend. Each variant maps to a stable machine-readable
 * code and an HTTP status, and carries the user-facing message verbatim.
 *
 * # Error Categories
 *
 * ## Client Errors
 *
 * - `Unauthenticated` - Missing, malformed, expired or wrong-kind token
 * - `Forbidden` - Authenticated but not allowed (not owner, not member, not staff)
 * - `NotFound` - A referenced record does not exist
 * - `SharedError` - Validation or subscription-limit failure
 *
 * ## Internal Errors
 *
 * Database, hashing and token-signing failures. Their details are logged
 * and the client only sees "Internal server error".
 */

use thiserror::Error;
use axum::http::StatusCode;
use crate::shared::SharedError;

/// Message reported to clients for any internal failure
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// Backend-specific error types
///
/// # Usage
///
/// ```rust
/// use chatplan::backend::error::BackendError;
///
/// let err = BackendError::unauthenticated("Authentication required");
/// assert_eq!(err.code(), "UNAUTHENTICATED");
///
/// let err = BackendError::not_found("Conversation not found");
/// assert_eq!(err.message(), "Conversation not found");
/// ```
#[derive(Debug, Error)]
pub enum BackendError {
    /// The caller could not be authenticated
    #[error("{message}")]
    Unauthenticated {
        /// Human-readable error message
        message: String,
    },

    /// The caller is authenticated but not allowed to do this
    #[error("{message}")]
    Forbidden {
        /// Human-readable error message
        message: String,
    },

    /// A referenced record does not exist
    #[error("{message}")]
    NotFound {
        /// Human-readable error message
        message: String,
    },

    /// Validation or limit error from the shared rules
    #[error(transparent)]
    SharedError(#[from] SharedError),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Password hashing or verification error
    #[error("Password hashing error: {0}")]
    PasswordHash(#[from] bcrypt::BcryptError),

    /// JWT signing error
    #[error("Token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    /// Any other internal failure
    #[error("Internal error: {message}")]
    Internal {
        /// Human-readable error message
        message: String,
    },
}

impl BackendError {
    /// Create an authentication error
    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::Unauthenticated {
            message: message.into(),
        }
    }

    /// Create a permission error
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    /// Create a not-found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create a validation error for `field`
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SharedError(SharedError::validation(field, message))
    }

    /// Create a limit error
    pub fn limit(message: impl Into<String>) -> Self {
        Self::SharedError(SharedError::limit(message))
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether the details of this error must be hidden from clients
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            Self::Database(_) | Self::PasswordHash(_) | Self::Token(_) | Self::Internal { .. }
        )
    }

    /// Get the HTTP status code for this error
    ///
    /// # Status Code Mapping
    ///
    /// - `Unauthenticated` - 401 Unauthorized
    /// - `Forbidden` - 403 Forbidden
    /// - `NotFound` - 404 Not Found
    /// - `SharedError` - 400 Bad Request (validation) or 422 Unprocessable Entity (limits)
    /// - internal variants - 500 Internal Server Error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthenticated { .. } => StatusCode::UNAUTHORIZED,
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::SharedError(err) => match err {
                SharedError::ValidationError { .. } => StatusCode::BAD_REQUEST,
                SharedError::LimitExceeded { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            },
            Self::Database(_) | Self::PasswordHash(_) | Self::Token(_) | Self::Internal { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Machine-readable error code reported in GraphQL error extensions
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unauthenticated { .. } => "UNAUTHENTICATED",
            Self::Forbidden { .. } => "FORBIDDEN",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::SharedError(SharedError::ValidationError { .. }) => "BAD_USER_INPUT",
            Self::SharedError(SharedError::LimitExceeded { .. }) => "LIMIT_EXCEEDED",
            _ => "INTERNAL_SERVER_ERROR",
        }
    }

    /// Get the client-facing error message
    pub fn message(&self) -> String {
        if self.is_internal() {
            INTERNAL_ERROR_MESSAGE.to_string()
        } else {
            self.to_string()
        }
    }
}

/// Name of the unique constraint `err` violated, if that is what happened
pub fn unique_violation(err: &sqlx::Error) -> Option<&str> {
    err.as_database_error()
        .filter(|db_err| db_err.is_unique_violation())
        .map(|db_err| db_err.constraint().unwrap_or_default())
}
