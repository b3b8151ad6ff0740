//! Shared Error Types
//!
//! This module defines the domain errors raised by the pure rules in
//! `shared` (input validation and plan limits). They carry the exact,
//! user-facing message that the API reports back to clients.
//!
//! # Error Categories
//!
//! - `ValidationError` - A request field failed validation
//! - `LimitExceeded` - A subscription-plan limit would be exceeded
//!
//! # Usage
//!
//! ```rust
//! use chatplan::shared::error::SharedError;
//!
//! let error = SharedError::validation("email", "Invalid email format");
//! assert_eq!(error.to_string(), "Invalid email format");
//! ```
use thiserror::Error;

/// Domain errors shared by the validation and limit rules
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SharedError {
    /// Data validation error
    #[error("{message}")]
    ValidationError {
        /// The field that failed validation
        field: String,
        /// Human-readable error message
        message: String,
    },

    /// Subscription-plan limit error
    #[error("{message}")]
    LimitExceeded {
        /// Human-readable error message
        message: String,
    },
}

impl SharedError {
    /// Create a new validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a new limit error
    pub fn limit(message: impl Into<String>) -> Self {
        Self::LimitExceeded {
            message: message.into(),
        }
    }

    /// The field a validation error refers to, if any
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::ValidationError { field, .. } => Some(field),
            Self::LimitExceeded { .. } => None,
        }
    }
}
