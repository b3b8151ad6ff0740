//! Shared Module
//!
//! Domain rules that do not touch the database or the network: input
//! validation, subscription-limit arithmetic and the errors they raise.
//! The backend calls into these after loading whatever state a rule needs,
//! which keeps the rules themselves trivially testable.

/// Shared error types
pub mod error;

/// Field validators for user and conversation input
pub mod validation;

/// Subscription-plan limit arithmetic
pub mod limits;

/// Re-export commonly used types for convenience
pub use error::SharedError;
pub use limits::LimitCheck;
