//! Server Module
//!
//! Start-up code for the Axum HTTP server.
//!
//! - **`config`** - Settings from the environment, database pool
//! - **`state`** - `AppState` and its `FromRef` implementations
//! - **`init`** - Builds the schema and router from settings
//!
//! # Initialization Flow
//!
//! 1. **Configuration Loading**: `Settings::from_env`
//! 2. **Database**: `load_database` connects and runs migrations
//! 3. **Mail Worker**: the binary spawns `mail::run_worker`
//! 4. **Router Creation**: `create_app`
//!
//! # Example
//!
//! ```rust,no_run
//! use chatplan::backend::mail::MailQueue;
//! use chatplan::backend::server::{config::{load_database, Settings}, create_app};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = Settings::from_env()?;
//! let pool = load_database(&settings).await?;
//! let (mail, _jobs) = MailQueue::new();
//! let app = create_app(&settings, pool, mail);
//! # Ok(())
//! # }
//! ```

/// Application state management
pub mod state;

/// Server configuration loading
pub mod config;

/// Server initialization
pub mod init;

// Re-export commonly used types
pub use config::{ConfigError, Settings};
pub use init::create_app;
pub use state::AppState;
