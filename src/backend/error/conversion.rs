/**
 * Error Conversion
 *
 * This module converts backend errors into the two shapes clients see:
 *
 * - HTTP responses (`IntoResponse`) for plain REST routes, as JSON
 *   `{ "error": "...", "status": 400 }`
 * - GraphQL errors (`ErrorExtensions`) with the message and a `code`
 *   extension, e.g. `{ "message": "Access denied", "extensions": { "code": "FORBIDDEN" } }`
 *
 * Internal errors are logged here, once, before their details are dropped.
 */

use async_graphql::ErrorExtensions;
use axum::{
    response::{Response, IntoResponse},
    http::StatusCode,
    body::Body,
};
use crate::backend::error::types::BackendError;

impl BackendError {
    fn log_if_internal(&self) {
        if self.is_internal() {
            tracing::error!("Internal error: {:?}", self);
        }
    }

    /// Convert into a GraphQL error with a `code` extension
    ///
    /// Resolvers use this rather than `?` so the code is never lost:
    /// `service_call().await.map_err(BackendError::into_graphql)?`
    pub fn into_graphql(self) -> async_graphql::Error {
        self.extend()
    }
}

impl ErrorExtensions for BackendError {
    fn extend(&self) -> async_graphql::Error {
        self.log_if_internal();
        let code = self.code();
        async_graphql::Error::new(self.message()).extend_with(|_, e| e.set("code", code))
    }
}

/// Convert any backend-compatible result into a GraphQL result
///
/// `db::get_user_by_id(pool, id).await.graphql()?`
pub trait GraphQLResultExt<T> {
    fn graphql(self) -> async_graphql::Result<T>;
}

impl<T, E: Into<BackendError>> GraphQLResultExt<T> for Result<T, E> {
    fn graphql(self) -> async_graphql::Result<T> {
        self.map_err(|e| e.into().into_graphql())
    }
}

impl IntoResponse for BackendError {
    /// Convert a backend error into an HTTP response
    ///
    /// The response is a JSON object with:
    /// - `error`: The client-facing error message
    /// - `status`: The HTTP status code
    fn into_response(self) -> Response {
        self.log_if_internal();
        let status = self.status_code();
        let message = self.message();

        let body = serde_json::json!({
            "error": message,
            "status": status.as_u16(),
        });

        Response::builder()
            .status(status)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap_or_else(|_| {
                let mut response = Response::new(Body::from("Internal Server Error"));
                *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
                response
            })
    }
}
