/**
 * Server Initialization
 *
 * Wires settings, the database pool and the mail queue into the GraphQL
 * schema and returns the finished router. The caller owns the runtime
 * pieces (listener, mail worker), which keeps this function usable from
 * integration tests.
 */

use axum::Router;
use sqlx::PgPool;

use crate::backend::auth::SessionKeys;
use crate::backend::graphql::{build_schema, GraphQLContext};
use crate::backend::mail::MailQueue;
use crate::backend::routes::create_router;
use crate::backend::server::config::Settings;
use crate::backend::server::state::AppState;

/// Create and configure the Axum application
pub fn create_app(settings: &Settings, pool: PgPool, mail: MailQueue) -> Router<()> {
    tracing::info!("Initializing chatplan backend server");

    let sessions = SessionKeys::new(
        &settings.jwt_secret,
        settings.access_token_ttl,
        settings.refresh_token_ttl,
    );

    let schema = build_schema(GraphQLContext {
        pool: pool.clone(),
        sessions,
        mail,
        verification_ttl: settings.verification_token_ttl,
    });

    let app = create_router(AppState { pool, schema });
    tracing::info!("Router configured");
    app
}
