//! Subscription Module
//!
//! Plans bound what a user may do: how many conversations they own and
//! how long their messages are.
//!
//! # Module Structure
//!
//! ```text
//! subscription/
//! ├── mod.rs      - Module exports and documentation
//! ├── db.rs       - Plan and subscription queries
//! └── service.rs  - Default plan, limit checks, plan changes
//! ```

/// Plan and subscription queries
pub mod db;

/// Subscription rules
pub mod service;

pub use db::{SubscriptionPlan, UserSubscription};
pub use service::PlanInput;
