/**
 * Mail Delivery
 *
 * `Mailer` is the seam between the queue worker and the outside world.
 *
 * - `SmtpMailer` relays through an SMTP server with `lettre`
 * - `LogMailer` writes the message to the log (development)
 * - `ConfiguredMailer` picks one of them from `Settings`
 */

use std::future::Future;

use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message as Email, Tokio1Executor,
};
use thiserror::Error;
use uuid::Uuid;

use crate::backend::server::config::SmtpSettings;

/// Mail errors
#[derive(Debug, Error)]
pub enum MailError {
    #[error("invalid address: {0}")]
    Address(#[from] lettre::address::AddressError),
    #[error("failed to build message: {0}")]
    Build(#[from] lettre::error::Error),
    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
    #[error("delivery failed: {0}")]
    Delivery(String),
}

/// A plain-text message ready to send
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Build the verification email for `token`
///
/// The body is the mutation the recipient runs to activate the account.
pub fn verification_email(from: &str, to: &str, token: Uuid) -> OutgoingEmail {
    let body = format!(
        r#"
mutation {{
    verifyEmail(token: "{token}") {{
        success
        message
    }}
}}
"#
    );

    OutgoingEmail {
        from: from.to_string(),
        to: to.to_string(),
        subject: "Verify Email Address".to_string(),
        body,
    }
}

/// Something that can deliver an `OutgoingEmail`
pub trait Mailer: Send + Sync {
    fn send(&self, email: &OutgoingEmail) -> impl Future<Output = Result<(), MailError>> + Send;
}

/// SMTP relay mailer
#[derive(Clone)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    pub fn new(settings: &SmtpSettings) -> Result<Self, MailError> {
        let builder = if settings.starttls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&settings.host)
        };
        let mut builder = builder.port(settings.port);

        if let (Some(username), Some(password)) = (&settings.username, &settings.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Self { transport: builder.build() })
    }
}

impl Mailer for SmtpMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError> {
        let message = Email::builder()
            .from(email.from.parse::<Mailbox>()?)
            .to(email.to.parse::<Mailbox>()?)
            .subject(email.subject.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(email.body.clone())?;

        self.transport.send(message).await?;
        Ok(())
    }
}

/// Development mailer that only logs
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

impl Mailer for LogMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError> {
        tracing::info!(
            to = %email.to,
            subject = %email.subject,
            "Email (not sent, SMTP not configured):\n{}",
            email.body
        );
        Ok(())
    }
}

/// Mailer selected at start-up
#[derive(Clone)]
pub enum ConfiguredMailer {
    Smtp(SmtpMailer),
    Log(LogMailer),
}

impl ConfiguredMailer {
    /// SMTP when configured, otherwise the logging mailer
    pub fn from_settings(smtp: Option<&SmtpSettings>) -> Result<Self, MailError> {
        match smtp {
            Some(settings) => {
                tracing::info!("Sending mail through SMTP relay {}:{}", settings.host, settings.port);
                Ok(Self::Smtp(SmtpMailer::new(settings)?))
            }
            None => {
                tracing::warn!("SMTP_HOST not set, emails will only be logged");
                Ok(Self::Log(LogMailer))
            }
        }
    }
}

impl Mailer for ConfiguredMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError> {
        match self {
            Self::Smtp(mailer) => mailer.send(email).await,
            Self::Log(mailer) => mailer.send(email).await,
        }
    }
}
