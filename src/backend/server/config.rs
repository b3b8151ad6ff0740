/**
 * Server Configuration
 *
 * This module loads the typed server settings from environment variables
 * (optionally seeded from a `.env` file) and opens the PostgreSQL pool.
 *
 * # Configuration Sources
 *
 * | Variable                               | Default                  |
 * |----------------------------------------|--------------------------|
 * | `DATABASE_URL`                         | required                 |
 * | `SERVER_PORT`                          | `3000`                   |
 * | `JWT_SECRET`                           | development secret       |
 * | `JWT_ACCESS_TOKEN_EXPIRATION_MINUTES`  | `60`                     |
 * | `JWT_REFRESH_TOKEN_EXPIRATION_DAYS`    | `7`                      |
 * | `VERIFICATION_TOKEN_EXPIRATION_HOURS`  | `24`                     |
 * | `DEFAULT_FROM_EMAIL`                   | `noreply@chatplan.local` |
 * | `SMTP_HOST`                            | unset (log mailer)       |
 * | `SMTP_PORT`                            | `587`                    |
 * | `SMTP_USERNAME` / `SMTP_PASSWORD`      | unset                    |
 * | `SMTP_STARTTLS`                        | `true`                   |
 * | `MAIL_MAX_RETRIES`                     | `3`                      |
 *
 * # Error Handling
 *
 * A missing `DATABASE_URL` or a value that does not parse is a
 * `ConfigError`; the binary refuses to start. Token lifetimes must be
 * positive and small enough to be added to the current time.
 */

use chrono::{Duration, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use thiserror::Error;

const DEV_JWT_SECRET: &str = "chatplan-development-secret-change-me";

/// Configuration errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing value: {0}")]
    MissingValue(&'static str),
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
}

/// SMTP relay settings
#[derive(Debug, Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub starttls: bool,
}

/// Typed server settings
#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub port: u16,
    pub jwt_secret: String,
    pub access_token_ttl: Duration,
    pub refresh_token_ttl: Duration,
    pub verification_token_ttl: Duration,
    pub default_from_email: String,
    /// `None` selects the logging mailer
    pub smtp: Option<SmtpSettings>,
    pub mail_max_retries: u32,
}

impl Settings {
    /// Load settings from the process environment
    ///
    /// Reads `.env` first if one exists; real environment variables win.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load settings through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .filter(|url| !url.trim().is_empty())
            .ok_or(ConfigError::MissingValue("DATABASE_URL"))?;

        let jwt_secret = match lookup("JWT_SECRET").filter(|s| !s.is_empty()) {
            Some(secret) => secret,
            None => {
                tracing::warn!("JWT_SECRET not set, using the development secret");
                DEV_JWT_SECRET.to_string()
            }
        };

        let access_token_ttl =
            parse_ttl(&lookup, "JWT_ACCESS_TOKEN_EXPIRATION_MINUTES", 60, Duration::try_minutes)?;
        let refresh_token_ttl =
            parse_ttl(&lookup, "JWT_REFRESH_TOKEN_EXPIRATION_DAYS", 7, Duration::try_days)?;
        let verification_token_ttl =
            parse_ttl(&lookup, "VERIFICATION_TOKEN_EXPIRATION_HOURS", 24, Duration::try_hours)?;

        let smtp = match lookup("SMTP_HOST").filter(|h| !h.is_empty()) {
            Some(host) => Some(SmtpSettings {
                host,
                port: parse_or(&lookup, "SMTP_PORT", 587)?,
                username: lookup("SMTP_USERNAME").filter(|s| !s.is_empty()),
                password: lookup("SMTP_PASSWORD").filter(|s| !s.is_empty()),
                starttls: parse_or(&lookup, "SMTP_STARTTLS", true)?,
            }),
            None => None,
        };

        Ok(Self {
            database_url,
            port: parse_or(&lookup, "SERVER_PORT", 3000)?,
            jwt_secret,
            access_token_ttl,
            refresh_token_ttl,
            verification_token_ttl,
            default_from_email: lookup("DEFAULT_FROM_EMAIL")
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "noreply@chatplan.local".to_string()),
            smtp,
            mail_max_retries: parse_or(&lookup, "MAIL_MAX_RETRIES", 3)?,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(value) if !value.trim().is_empty() => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { key, value }),
        _ => Ok(default),
    }
}

fn parse_ttl<F>(
    lookup: &F,
    key: &'static str,
    default: i64,
    unit: fn(i64) -> Option<Duration>,
) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let amount: i64 = parse_or(lookup, key, default)?;
    (amount > 0)
        .then(|| unit(amount))
        .flatten()
        .filter(|ttl| Utc::now().checked_add_signed(*ttl).is_some())
        .ok_or_else(|| ConfigError::InvalidValue { key, value: amount.to_string() })
}

/// Connect to PostgreSQL and run pending migrations
///
/// Unlike optional services, the database is required: every API
/// operation reads or writes it.
pub async fn load_database(settings: &Settings) -> Result<PgPool, sqlx::Error> {
    tracing::info!("Connecting to database...");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&settings.database_url)
        .await?;

    tracing::info!("Database connection pool created successfully");

    tracing::info!("Running database migrations...");
    sqlx::migrate!().run(&pool).await?;
    tracing::info!("Database migrations completed successfully");

    Ok(pool)
}
