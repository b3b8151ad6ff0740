//! Authentication Module
//!
//! This module handles user registration, email verification, login and
//! session management. The GraphQL resolvers call into `service`; the
//! other submodules hold the data and token primitives it builds on.
//!
//! # Module Structure
//!
//! ```text
//! auth/
//! ├── mod.rs           - Module exports and documentation
//! ├── users.rs         - User model and database operations
//! ├── sessions.rs      - JWT access/refresh tokens
//! ├── verification.rs  - Email verification tokens
//! └── service.rs       - Register, login, refresh, verify, authenticate
//! ```
//!
//! # Authentication Flow
//!
//! 1. **Register**: user is created inactive, a verification email is queued
//! 2. **Verify email**: the mailed token activates the account and returns a token pair
//! 3. **Login**: user name and password → access + refresh token
//! 4. **Authenticated calls**: `Authorization: Bearer <access token>`
//! 5. **Refresh**: refresh token → new access token
//!
//! # Security
//!
//! - Passwords are hashed using bcrypt before storage
//! - Tokens are HS256 JWTs; access tokens are short-lived
//! - Invalid credentials never reveal which part was wrong

/// User data model and database operations
pub mod users;

/// JWT token generation and validation
pub mod sessions;

/// Email verification tokens
pub mod verification;

/// Authentication operations
pub mod service;

// Re-export commonly used types
pub use service::{LoginResult, Registration, VerifyEmailOutcome};
pub use sessions::{Claims, SessionKeys, TokenPair};
pub use users::User;
