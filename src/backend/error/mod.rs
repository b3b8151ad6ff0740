//! Backend Error Module
//!
//! This module defines the error type shared by services and resolvers.
//! These errors can be converted to HTTP responses and GraphQL errors.
//!
//! # Module Structure
//!
//! ```text
//! error/
//! ├── mod.rs        - Module exports and documentation
//! ├── types.rs      - Error type definitions
//! └── conversion.rs - IntoResponse and GraphQL conversions
//! ```

/// Error type definitions
pub mod types;

/// Error conversion implementations
pub mod conversion;

// Re-export commonly used types
pub use types::{unique_violation, BackendError, INTERNAL_ERROR_MESSAGE};
pub use conversion::GraphQLResultExt;

/// Result alias used across the backend services
pub type BackendResult<T> = Result<T, BackendError>;
