/**
 * Email Verification Tokens
 *
 * A verification token is an opaque UUID mailed to a new user. It is
 * valid while unused and unexpired, and can be exchanged exactly once:
 * `consume_token` flips `is_used` in the same statement that checks it.
 */

use chrono::{DateTime, Duration, Utc};
use sqlx::PgExecutor;
use uuid::Uuid;

/// Row of `email_verification_tokens`
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct VerificationToken {
    pub id: Uuid,
    pub token: Uuid,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
    pub is_used: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl VerificationToken {
    /// Whether the token can still be exchanged at `now`
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        !self.is_used && now < self.expires_at
    }
}

/// Create a token for `user_id` that expires after `ttl`
pub async fn create_verification_token<'e, E: PgExecutor<'e>>(
    executor: E,
    user_id: Uuid,
    ttl: Duration,
) -> Result<VerificationToken, sqlx::Error> {
    let now = Utc::now();

    sqlx::query_as::<_, VerificationToken>(
        r#"
        INSERT INTO email_verification_tokens (id, token, user_id, expires_at, is_used, created_at, updated_at)
        VALUES ($1, $2, $3, $4, FALSE, $5, $5)
        RETURNING id, token, user_id, expires_at, is_used, created_at, updated_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(now.checked_add_signed(ttl).unwrap_or(DateTime::<Utc>::MAX_UTC))
    .bind(now)
    .fetch_one(executor)
    .await
}

/// Look up a token by its opaque value
pub async fn get_verification_token<'e, E: PgExecutor<'e>>(
    executor: E,
    token: Uuid,
) -> Result<Option<VerificationToken>, sqlx::Error> {
    sqlx::query_as::<_, VerificationToken>(
        r#"
        SELECT id, token, user_id, expires_at, is_used, created_at, updated_at
        FROM email_verification_tokens
        WHERE token = $1
        "#,
    )
    .bind(token)
    .fetch_optional(executor)
    .await
}

/// Mark a token used if it is still valid
///
/// Returns `None` when another request already used it or it expired.
pub async fn consume_token<'e, E: PgExecutor<'e>>(
    executor: E,
    token: Uuid,
) -> Result<Option<VerificationToken>, sqlx::Error> {
    sqlx::query_as::<_, VerificationToken>(
        r#"
        UPDATE email_verification_tokens
        SET is_used = TRUE, updated_at = NOW()
        WHERE token = $1 AND is_used = FALSE AND expires_at > NOW()
        RETURNING id, token, user_id, expires_at, is_used, created_at, updated_at
        "#,
    )
    .bind(token)
    .fetch_optional(executor)
    .await
}
