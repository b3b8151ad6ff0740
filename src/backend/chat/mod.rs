//! Chat Backend Module
//!
//! This module contains all server-side chat functionality:
//! - Conversations with an owner and a set of members
//! - Messages posted by members
//! - Access rules and subscription limits in front of both
//!
//! # Architecture
//!
//! - **`db`** - Queries for conversations, members and messages
//! - **`service`** - Membership, ownership and limit checks
//!
//! # Example
//!
//! ```rust,no_run
//! use chatplan::backend::auth::users::User;
//! use chatplan::backend::chat::service;
//!
//! # async fn example(pool: sqlx::PgPool, user: User) -> Result<(), chatplan::backend::BackendError> {
//! let created = service::create_conversation(&pool, &user, "Weekend plans", &[]).await?;
//! let message = service::send_message(&pool, &user, &created.conversation.id.to_string(), "Hi!").await?;
//! # Ok(())
//! # }
//! ```

/// Database operations for conversations and messages
pub mod db;

/// Conversation and message rules
pub mod service;

/// Re-export commonly used types
pub use db::{Conversation, Message};
pub use service::{AddUserOutcome, CreatedConversation};
