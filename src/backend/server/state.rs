/**
 * Application State
 *
 * Everything the HTTP handlers need, cloned into each request. The schema
 * already carries the pool and session keys for the resolvers; the pool
 * is kept here too for plain routes such as the health check.
 *
 * `FromRef` lets a handler extract just the part it uses:
 *
 * ```rust,ignore
 * async fn handler(State(pool): State<PgPool>) { ... }
 * ```
 */

use axum::extract::FromRef;
use sqlx::PgPool;

use crate::backend::graphql::AppSchema;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub schema: AppSchema,
}

impl FromRef<AppState> for PgPool {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.pool.clone()
    }
}

impl FromRef<AppState> for AppSchema {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.schema.clone()
    }
}
