/**
 * Authentication Service
 *
 * Registration, login, token refresh, email verification and request
 * authentication.
 *
 * # Registration Flow
 *
 * 1. Validate input (see `register` for the order of checks)
 * 2. Hash the password with bcrypt
 * 3. In one transaction: insert the inactive user, subscribe them to the
 *    default plan, create a verification token
 * 4. Queue the verification email
 *
 * # Security
 *
 * - Unknown user, wrong password and inactive account all fail login
 *   with the same message
 * - Refresh tokens never authenticate API calls
 * - Passwords and tokens are never logged
 */

use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::backend::error::{unique_violation, BackendError, BackendResult};
use crate::backend::mail::{MailQueue, VerificationEmailJob};
use crate::backend::subscription::service as subscriptions;
use crate::shared::validation::{
    validate_email, validate_password, validate_person_name, validate_user_name_charset,
    validate_user_name_length,
};

use super::sessions::{SessionKeys, TokenPair};
use super::users::{self, NewUser, User};
use super::verification;

pub const INVALID_CREDENTIALS: &str = "Invalid credentials";
pub const INVALID_VERIFICATION_TOKEN: &str = "Invalid verification token";
pub const EXPIRED_VERIFICATION_TOKEN: &str = "Verification link has expired or already used";
pub const EMAIL_VERIFIED: &str = "Your email has been verified successfully!";

const USER_NAME_TAKEN: &str = "Username already exists";
const EMAIL_TAKEN: &str = "Email already exists";

/// Registration input
#[derive(Debug, Clone, Copy)]
pub struct Registration<'a> {
    pub user_name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
}

/// Successful login
#[derive(Debug, Clone)]
pub struct LoginResult {
    pub token: TokenPair,
    pub user: User,
}

/// Outcome of `verify_email`
#[derive(Debug, Clone)]
pub struct VerifyEmailOutcome {
    pub success: bool,
    pub message: &'static str,
    pub token: Option<TokenPair>,
}

impl VerifyEmailOutcome {
    fn failed(message: &'static str) -> Self {
        Self { success: false, message, token: None }
    }
}

/// Register a new, inactive user
///
/// Checks run in this order, and the first failure is reported:
/// user name length, user name characters, user name taken, email taken,
/// email format, password length, first name, last name.
pub async fn register(
    pool: &PgPool,
    mail: &MailQueue,
    verification_ttl: Duration,
    input: Registration<'_>,
) -> BackendResult<User> {
    validate_user_name_length(input.user_name)?;
    validate_user_name_charset(input.user_name)?;

    if users::get_user_by_user_name(pool, input.user_name).await?.is_some() {
        return Err(BackendError::validation("user_name", USER_NAME_TAKEN));
    }
    if users::get_user_by_email(pool, input.email).await?.is_some() {
        return Err(BackendError::validation("email", EMAIL_TAKEN));
    }

    validate_email(input.email)?;
    validate_password(input.password)?;
    validate_person_name("first_name", "First name", input.first_name)?;
    validate_person_name("last_name", "Last name", input.last_name)?;

    let password_hash = hash(input.password, DEFAULT_COST).map_err(|e| {
        tracing::error!("Failed to hash password: {:?}", e);
        BackendError::from(e)
    })?;

    let mut tx = pool.begin().await?;

    let user = users::create_user(
        &mut *tx,
        NewUser {
            user_name: input.user_name,
            email: input.email,
            first_name: input.first_name,
            last_name: input.last_name,
            password_hash: &password_hash,
        },
    )
    .await
    .map_err(|e| match unique_violation(&e) {
        Some("users_user_name_key") => BackendError::validation("user_name", USER_NAME_TAKEN),
        Some("users_email_key") => BackendError::validation("email", EMAIL_TAKEN),
        _ => BackendError::from(e),
    })?;

    subscriptions::get_or_create_user_subscription(&mut tx, user.id).await?;
    let token = verification::create_verification_token(&mut *tx, user.id, verification_ttl).await?;

    tx.commit().await?;

    mail.enqueue(VerificationEmailJob {
        to: user.email.clone(),
        token: token.token,
    });

    tracing::info!("User registered: {} ({})", user.user_name, user.id);
    Ok(user)
}

/// Log in with user name and password
pub async fn login(
    pool: &PgPool,
    keys: &SessionKeys,
    user_name: &str,
    password: &str,
) -> BackendResult<LoginResult> {
    let user = users::get_user_by_user_name(pool, user_name)
        .await?
        .ok_or_else(|| {
            tracing::warn!("Login failed, user not found: {}", user_name);
            BackendError::unauthenticated(INVALID_CREDENTIALS)
        })?;

    let valid = verify(password, &user.password_hash).map_err(|e| {
        tracing::error!("Password verification error: {:?}", e);
        BackendError::from(e)
    })?;

    if !valid {
        tracing::warn!("Login failed, invalid password for user: {}", user_name);
        return Err(BackendError::unauthenticated(INVALID_CREDENTIALS));
    }
    if !user.is_active {
        tracing::warn!("Login failed, inactive user: {}", user_name);
        return Err(BackendError::unauthenticated(INVALID_CREDENTIALS));
    }

    let token = keys.create_token_pair(user.id).inspect_err(|e| {
        tracing::error!("Failed to create token: {:?}", e);
    })?;

    tracing::info!("User logged in successfully: {}", user.user_name);
    Ok(LoginResult { token, user })
}

/// Exchange a refresh token for a new access token
pub async fn refresh_token(pool: &PgPool, keys: &SessionKeys, refresh: &str) -> BackendResult<String> {
    let claims = keys.verify_token(refresh)?;
    if !claims.refresh {
        tracing::warn!("Access token presented to refreshToken");
        return Err(BackendError::unauthenticated("Invalid token type: not a refresh token"));
    }

    let user_id = claims.user_id()?;
    if users::get_user_by_id(pool, user_id).await?.is_none() {
        return Err(BackendError::unauthenticated("User not found"));
    }

    keys.create_access_token(user_id)
}

/// Exchange a verification token, activating the account
///
/// Failures are reported through the outcome; only infrastructure errors
/// are returned as `Err`.
pub async fn verify_email(
    pool: &PgPool,
    keys: &SessionKeys,
    token: &str,
) -> BackendResult<VerifyEmailOutcome> {
    let Ok(token) = Uuid::parse_str(token.trim()) else {
        return Ok(VerifyEmailOutcome::failed(INVALID_VERIFICATION_TOKEN));
    };
    let Some(stored) = verification::get_verification_token(pool, token).await? else {
        return Ok(VerifyEmailOutcome::failed(INVALID_VERIFICATION_TOKEN));
    };
    if !stored.is_valid(Utc::now()) {
        return Ok(VerifyEmailOutcome::failed(EXPIRED_VERIFICATION_TOKEN));
    }

    let mut tx = pool.begin().await?;
    let Some(consumed) = verification::consume_token(&mut *tx, token).await? else {
        // Used or expired between the lookup and the update
        return Ok(VerifyEmailOutcome::failed(EXPIRED_VERIFICATION_TOKEN));
    };
    let user = users::activate_user(&mut *tx, consumed.user_id).await?;
    tx.commit().await?;

    let pair = keys.create_token_pair(user.id)?;
    tracing::info!("Email verified for user {}", user.user_name);

    Ok(VerifyEmailOutcome {
        success: true,
        message: EMAIL_VERIFIED,
        token: Some(pair),
    })
}

/// Resolve the active user behind a bearer token
///
/// `token` is the value after `Bearer `, or `None` if the request had no
/// usable `Authorization` header.
pub async fn authenticate(
    pool: &PgPool,
    keys: &SessionKeys,
    token: Option<&str>,
) -> BackendResult<User> {
    let token = token.ok_or_else(|| BackendError::unauthenticated("Authentication required"))?;

    let claims = keys.verify_token(token)?;
    if claims.refresh {
        tracing::warn!("Refresh token used for authentication");
        return Err(BackendError::unauthenticated(
            "Cannot use refresh token for authentication",
        ));
    }

    let user = users::get_user_by_id(pool, claims.user_id()?)
        .await?
        .ok_or_else(|| BackendError::unauthenticated("User not found"))?;

    if !user.is_active {
        return Err(BackendError::unauthenticated(
            "Account is not active. Please verify your email first.",
        ));
    }

    Ok(user)
}

/// All users (staff only)
pub async fn list_users(pool: &PgPool, caller: &User) -> BackendResult<Vec<User>> {
    if !caller.is_staff {
        tracing::warn!("User {} tried to list users", caller.id);
        return Err(BackendError::forbidden("Permission denied"));
    }
    Ok(users::list_users(pool).await?)
}
