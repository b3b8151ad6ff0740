//! Route Configuration Module
//!
//! This module configures the HTTP routes of the backend server. Almost
//! all traffic goes to the single GraphQL endpoint; see `router` for the
//! full list.
//!
//! # Example
//!
//! ```rust,ignore
//! use chatplan::backend::routes::create_router;
//! use chatplan::backend::server::AppState;
//!
//! let router = create_router(AppState { pool, schema });
//! ```

/// Main router creation
pub mod router;

pub use router::create_router;
