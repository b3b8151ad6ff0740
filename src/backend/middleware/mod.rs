//! Middleware Module
//!
//! Request processing that runs before the GraphQL executor.
//!
//! - **`auth`** - Bearer token extraction from the `Authorization` header
//!
//! # Example
//!
//! ```rust,no_run
//! use chatplan::backend::middleware::BearerToken;
//!
//! async fn handler(token: BearerToken) {
//!     if let Some(token) = token.as_deref() {
//!         // verify with SessionKeys
//!     }
//! }
//! ```

pub mod auth;

pub use auth::BearerToken;
