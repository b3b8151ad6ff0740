//! Database test fixtures and utilities
//!
//! Provides a migrated connection pool and a schema wired to it. Tests
//! never truncate tables: every fixture creates uniquely named rows, so
//! tests can share one database and run in parallel.

use async_graphql::{Request, Variables};
use chatplan::backend::auth::SessionKeys;
use chatplan::backend::graphql::{build_schema, AppSchema, GraphQLContext};
use chatplan::backend::mail::{MailQueue, VerificationEmailJob};
use chatplan::backend::middleware::BearerToken;
use chrono::Duration;
use sqlx::postgres::{PgPool, PgPoolOptions};
use tokio::sync::mpsc::UnboundedReceiver;

/// Secret the test schema signs tokens with
pub const TEST_JWT_SECRET: &str = "integration-test-secret";

pub fn test_session_keys() -> SessionKeys {
    SessionKeys::new(TEST_JWT_SECRET, Duration::minutes(60), Duration::days(7))
}

/// Run database migrations for testing
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

/// Test database fixture
///
/// `connect` returns `None` when `DATABASE_URL` is not set; callers
/// return early in that case.
pub struct TestDatabase {
    pool: PgPool,
}

impl TestDatabase {
    pub async fn connect() -> Option<Self> {
        let Ok(database_url) = std::env::var("DATABASE_URL") else {
            eprintln!("DATABASE_URL not set, skipping database test");
            return None;
        };

        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(&database_url)
            .await
            .expect("Failed to create test database pool");
        run_migrations(&pool).await.expect("Failed to run migrations");

        Some(Self { pool })
    }

    /// Get the database pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Schema over this database plus the receiving end of its mail queue
    pub fn api(&self) -> TestApi {
        let (mail, jobs) = MailQueue::new();
        let schema = build_schema(GraphQLContext {
            pool: self.pool.clone(),
            sessions: test_session_keys(),
            mail,
            verification_ttl: Duration::hours(24),
        });
        TestApi { schema, jobs }
    }
}

/// GraphQL schema under test
pub struct TestApi {
    pub schema: AppSchema,
    /// Verification emails queued by `register`
    pub jobs: UnboundedReceiver<VerificationEmailJob>,
}

impl TestApi {
    /// Execute a query and return the response as JSON
    ///
    /// The result has `data` and, when anything failed, `errors`.
    pub async fn execute(
        &self,
        token: Option<&str>,
        query: &str,
        variables: serde_json::Value,
    ) -> serde_json::Value {
        let request = Request::new(query)
            .variables(Variables::from_json(variables))
            .data(BearerToken(token.map(str::to_string)));
        let response = self.schema.execute(request).await;
        serde_json::to_value(&response).expect("GraphQL response serializes")
    }
}

/// First error message of a GraphQL response, if any
pub fn error_message(response: &serde_json::Value) -> Option<&str> {
    response["errors"][0]["message"].as_str()
}

/// `code` extension of the first error
pub fn error_code(response: &serde_json::Value) -> Option<&str> {
    response["errors"][0]["extensions"]["code"].as_str()
}
