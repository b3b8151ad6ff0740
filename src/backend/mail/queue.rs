//! # Verification Email Queue
//!
//! An in-process job queue with a single consumer. Requests enqueue a
//! `VerificationEmailJob` and return immediately; the worker delivers each
//! job with the configured `Mailer`, retrying failures.
//!
//! ## Retry Policy
//!
//! - **Max Retries**: 3 retries after the first attempt (configurable)
//! - **Exponential Backoff**: 1s, 2s, 4s ... capped at 10 minutes
//! - **Jitter**: up to 10% extra delay per retry
//!
//! After the last failure the job is dropped and logged at `error`.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use chatplan::backend::mail::{run_worker, LogMailer, MailQueue, RetryPolicy, VerificationEmailJob};
//!
//! # async fn example() {
//! let (queue, receiver) = MailQueue::new();
//! tokio::spawn(run_worker(LogMailer, receiver, RetryPolicy::default(), "noreply@chatplan.local".into()));
//!
//! queue.enqueue(VerificationEmailJob { to: "new@example.com".into(), token: uuid::Uuid::new_v4() });
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use uuid::Uuid;

use super::mailer::{verification_email, Mailer};

/// "Send verification email" job payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationEmailJob {
    pub to: String,
    pub token: Uuid,
}

/// Producer side of the queue
#[derive(Debug, Clone)]
pub struct MailQueue {
    sender: mpsc::UnboundedSender<VerificationEmailJob>,
}

impl MailQueue {
    /// Create a queue and the receiver the worker consumes
    pub fn new() -> (Self, mpsc::UnboundedReceiver<VerificationEmailJob>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    /// Enqueue a job; never blocks
    ///
    /// A closed queue is logged, not reported, so callers never fail on it.
    pub fn enqueue(&self, job: VerificationEmailJob) {
        tracing::debug!("Queued verification email for {}", job.to);
        if let Err(e) = self.sender.send(job) {
            tracing::error!("Mail queue is closed, dropping verification email for {}", e.0.to);
        }
    }
}

/// Retry and backoff configuration
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry
    pub base_delay: Duration,
    /// Upper bound for any single delay (before jitter)
    pub max_delay: Duration,
    /// Jitter factor (0.0 to 1.0)
    pub jitter: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(600),
            jitter: 0.1,
        }
    }
}

impl RetryPolicy {
    pub fn with_max_retries(max_retries: u32) -> Self {
        Self { max_retries, ..Self::default() }
    }

    /// Delay before retry number `retry` (1-based), without jitter
    pub fn backoff_delay(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    /// Backoff delay plus random jitter
    fn delay_with_jitter(&self, retry: u32) -> Duration {
        let delay = self.backoff_delay(retry);
        let max_jitter = delay.mul_f64(self.jitter.clamp(0.0, 1.0));
        if max_jitter.is_zero() {
            return delay;
        }
        let jitter_ms = rand::thread_rng().gen_range(0..=max_jitter.as_millis() as u64);
        delay + Duration::from_millis(jitter_ms)
    }
}

/// Deliver one job, retrying per `policy`
///
/// Returns `true` if the email was sent.
pub async fn deliver_with_retry<M: Mailer>(
    mailer: &M,
    job: &VerificationEmailJob,
    policy: &RetryPolicy,
    from: &str,
) -> bool {
    let email = verification_email(from, &job.to, job.token);
    let mut attempt: u32 = 0;

    loop {
        match mailer.send(&email).await {
            Ok(()) => {
                tracing::info!("Verification email sent to {}", job.to);
                return true;
            }
            Err(e) if attempt < policy.max_retries => {
                attempt += 1;
                let delay = policy.delay_with_jitter(attempt);
                tracing::warn!(
                    "Failed to send verification email to {} ({}), retry {}/{} in {:?}",
                    job.to,
                    e,
                    attempt,
                    policy.max_retries,
                    delay
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                tracing::error!(
                    "Giving up on verification email to {} after {} attempts: {}",
                    job.to,
                    attempt + 1,
                    e
                );
                return false;
            }
        }
    }
}

/// Consume the queue until every sender is dropped
///
/// Jobs are delivered concurrently so one job's backoff does not hold up
/// the rest. In-flight deliveries finish before this returns.
pub async fn run_worker<M: Mailer + 'static>(
    mailer: M,
    mut receiver: mpsc::UnboundedReceiver<VerificationEmailJob>,
    policy: RetryPolicy,
    from: String,
) {
    tracing::info!("Mail worker started");

    let mailer = Arc::new(mailer);
    let policy = Arc::new(policy);
    let from: Arc<str> = Arc::from(from);
    let mut in_flight = JoinSet::new();

    loop {
        tokio::select! {
            job = receiver.recv() => {
                let Some(job) = job else { break };
                let mailer = Arc::clone(&mailer);
                let policy = Arc::clone(&policy);
                let from = Arc::clone(&from);
                in_flight.spawn(async move {
                    deliver_with_retry(mailer.as_ref(), &job, &policy, &from).await;
                });
            }
            Some(result) = in_flight.join_next(), if !in_flight.is_empty() => {
                if let Err(e) = result {
                    tracing::error!("Mail delivery task panicked: {}", e);
                }
            }
        }
    }

    while let Some(result) = in_flight.join_next().await {
        if let Err(e) = result {
            tracing::error!("Mail delivery task panicked: {}", e);
        }
    }

    tracing::info!("Mail worker stopped");
}
