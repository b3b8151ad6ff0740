//! Mail Module
//!
//! Background delivery of the one email the backend sends: the account
//! verification email.
//!
//! # Module Structure
//!
//! ```text
//! mail/
//! ├── mod.rs      - Module exports and documentation
//! ├── mailer.rs   - Mailer trait, SMTP and logging mailers
//! └── queue.rs    - Job queue, worker and retry policy
//! ```

/// Mailer trait and implementations
pub mod mailer;

/// Job queue and worker
pub mod queue;

pub use mailer::{ConfiguredMailer, LogMailer, MailError, Mailer, OutgoingEmail, SmtpMailer};
pub use queue::{run_worker, MailQueue, RetryPolicy, VerificationEmailJob};
