/**
 * Authentication Extraction
 *
 * This module pulls the bearer token out of the `Authorization` header.
 * It never rejects a request: a missing or malformed header yields an
 * empty `BearerToken`, and only resolvers that need a user turn that into
 * "Authentication required".
 */

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use std::convert::Infallible;

/// Bearer token from the request, if one was sent
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BearerToken(pub Option<String>);

impl BearerToken {
    /// Extract the token from `Authorization: Bearer <token>`
    ///
    /// The scheme is matched case-insensitively.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let token = headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|value| value.trim().split_once(' '))
            .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("bearer"))
            .map(|(_, token)| token.trim())
            .filter(|token| !token.is_empty())
            .map(str::to_string);

        if token.is_none() && headers.contains_key(AUTHORIZATION) {
            tracing::debug!("Ignoring malformed Authorization header");
        }

        Self(token)
    }

    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_headers(&parts.headers))
    }
}
