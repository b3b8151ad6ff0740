//! chatplan - Chat Platform Backend
//!
//! A chat backend exposed through a single GraphQL API. Users register,
//! verify their email address and log in with JWT access/refresh tokens;
//! they create conversations, add members and exchange messages, within
//! the limits of their subscription plan.
//!
//! # Module Structure
//!
//! - **`shared`** - Rules with no I/O
//!   - Field validation (user names, emails, passwords, titles)
//!   - Subscription-limit arithmetic
//!   - Validation and limit error types
//!
//! - **`backend`** - Server-side code
//!   - Axum HTTP server and GraphQL schema
//!   - Auth, chat and subscription services over PostgreSQL
//!   - Verification email queue and worker
//!
//! # Running
//!
//! ```text
//! DATABASE_URL=postgres://localhost/chatplan cargo run --bin chatplan-server
//! ```
//!
//! Migrations in `migrations/` run at start-up. GraphiQL is served at
//! `GET /graphql`.
//!
//! # Error Handling
//!
//! - `shared::SharedError` for validation and limit failures
//! - `backend::BackendError` for everything the API reports, mapped to
//!   GraphQL errors with a `code` extension

/// Shared validation and limit rules
pub mod shared;

/// Backend server-side code
pub mod backend;
