/**
 * Session Management and JWT Tokens
 *
 * This module issues and validates the HS256 JWTs that make up a session.
 * A session is a pair of tokens:
 *
 * - an **access** token, short-lived, sent as `Authorization: Bearer <token>`
 * - a **refresh** token, long-lived, only accepted by `refreshToken`
 *
 * Both carry the same `Claims`; the `refresh` flag tells them apart.
 */

use async_graphql::SimpleObject;
use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::backend::error::{BackendError, BackendResult};

/// JWT claims structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: String,
    /// Issued at time (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Set only on refresh tokens
    #[serde(default)]
    pub refresh: bool,
}

impl Claims {
    /// Parse the subject as a user id
    pub fn user_id(&self) -> BackendResult<Uuid> {
        Uuid::parse_str(&self.sub)
            .map_err(|_| BackendError::unauthenticated("Invalid token: missing user_id"))
    }
}

/// Access and refresh token issued together at login
#[derive(Debug, Clone, Serialize, SimpleObject)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Signing keys and token lifetimes
#[derive(Clone)]
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl std::fmt::Debug for SessionKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionKeys")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish_non_exhaustive()
    }
}

impl SessionKeys {
    pub fn new(secret: &str, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            access_ttl,
            refresh_ttl,
        }
    }

    fn sign(&self, user_id: Uuid, ttl: Duration, refresh: bool) -> BackendResult<String> {
        let now = Utc::now();
        let expires = now
            .checked_add_signed(ttl)
            .ok_or_else(|| BackendError::internal(format!("token lifetime {ttl} is out of range")))?;
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: expires.timestamp(),
            refresh,
        };
        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?)
    }

    /// Create an access token for a user
    pub fn create_access_token(&self, user_id: Uuid) -> BackendResult<String> {
        self.sign(user_id, self.access_ttl, false)
    }

    /// Create a refresh token for a user
    pub fn create_refresh_token(&self, user_id: Uuid) -> BackendResult<String> {
        self.sign(user_id, self.refresh_ttl, true)
    }

    /// Create both tokens for a fresh session
    pub fn create_token_pair(&self, user_id: Uuid) -> BackendResult<TokenPair> {
        Ok(TokenPair {
            access: self.create_access_token(user_id)?,
            refresh: self.create_refresh_token(user_id)?,
        })
    }

    /// Verify and decode a JWT token
    ///
    /// Expired tokens and every other decode failure are reported with
    /// different messages; the cause is only logged.
    pub fn verify_token(&self, token: &str) -> BackendResult<Claims> {
        // No leeway: a token is dead the second `exp` passes
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => BackendError::unauthenticated("Token has expired"),
                _ => {
                    tracing::warn!("Rejected token: {}", e);
                    BackendError::unauthenticated("Invalid token")
                }
            })
    }
}
