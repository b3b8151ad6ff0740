//! Backend Module
//!
//! This module contains all server-side code for chatplan: the Axum HTTP
//! server, the GraphQL API and the services behind it.
//!
//! # Architecture
//!
//! The backend is organized into focused submodules:
//!
//! - **`server`** - Settings, application state, start-up
//! - **`routes`** - HTTP route configuration and router assembly
//! - **`graphql`** - Schema, object types and resolvers
//! - **`auth`** - Users, JWT sessions, email verification
//! - **`chat`** - Conversations, members and messages
//! - **`subscription`** - Plans and limit enforcement
//! - **`mail`** - Verification email delivery and its worker queue
//! - **`middleware`** - Bearer token extraction
//! - **`error`** - Backend error type and its HTTP/GraphQL mappings
//!
//! # Module Structure
//!
//! ```text
//! backend/
//! ├── mod.rs          - Module exports and documentation
//! ├── main.rs         - Server binary
//! ├── server/         - Settings, state, start-up
//! ├── routes/         - Route configuration
//! ├── graphql/        - GraphQL API
//! ├── auth/           - Authentication
//! ├── chat/           - Conversations and messages
//! ├── subscription/   - Subscription plans
//! ├── mail/           - Verification email
//! ├── middleware/     - Request middleware
//! └── error/          - Error types
//! ```
//!
//! # Layers
//!
//! Resolvers in `graphql` authenticate the caller and delegate to the
//! `service` module of each area. Services enforce permissions and plan
//! limits, then call the data functions in `db.rs` / `users.rs`, which are
//! generic over any `sqlx` executor so they run on the pool or inside a
//! transaction alike.
//!
//! # Error Handling
//!
//! ```rust
//! use chatplan::backend::BackendError;
//!
//! let err = BackendError::forbidden("Access denied");
//! assert_eq!(err.code(), "FORBIDDEN");
//! ```

/// Server setup and configuration
pub mod server;

/// Route configuration
pub mod routes;

/// GraphQL schema and resolvers
pub mod graphql;

/// Backend error types
pub mod error;

/// Authentication and user management
pub mod auth;

/// Conversations and messages
pub mod chat;

/// Subscription plans and limits
pub mod subscription;

/// Verification email delivery
pub mod mail;

/// Middleware for request processing
pub mod middleware;

/// Re-export commonly used types
pub use error::{BackendError, BackendResult};
pub use server::create_app;
