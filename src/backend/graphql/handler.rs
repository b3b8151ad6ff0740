/**
 * GraphQL HTTP Handlers
 *
 * `POST /graphql` executes a request against the schema with the caller's
 * bearer token attached as request data. `GET /graphql` serves GraphiQL.
 *
 * Errors are part of the GraphQL response body, so the endpoint answers
 * `200 OK` for every request it could parse.
 */

use async_graphql::http::GraphiQLSource;
use axum::{
    extract::State,
    response::{Html, IntoResponse},
    Json,
};

use crate::backend::middleware::BearerToken;

use super::schema::AppSchema;

/// Execute a GraphQL request
pub async fn graphql_handler(
    State(schema): State<AppSchema>,
    token: BearerToken,
    Json(request): Json<async_graphql::Request>,
) -> Json<async_graphql::Response> {
    Json(schema.execute(request.data(token)).await)
}

/// Serve the GraphiQL explorer
pub async fn graphiql() -> impl IntoResponse {
    Html(GraphiQLSource::build().endpoint("/graphql").finish())
}
