/**
 * chatplan Server Entry Point
 *
 * Loads settings, connects to PostgreSQL, starts the verification mail
 * worker and serves the GraphQL API with Axum.
 */

use chatplan::backend::mail::{run_worker, ConfiguredMailer, MailQueue, RetryPolicy};
use chatplan::backend::server::{config::load_database, create_app, Settings};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("chatplan=debug,tower_http=info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    tracing::info!("[STARTUP] Server initialization started");

    let settings = Settings::from_env()?;
    let pool = load_database(&settings).await?;

    let mailer = ConfiguredMailer::from_settings(settings.smtp.as_ref())?;
    let (mail_queue, jobs) = MailQueue::new();
    tokio::spawn(run_worker(
        mailer,
        jobs,
        RetryPolicy::with_max_retries(settings.mail_max_retries),
        settings.default_from_email.clone(),
    ));

    let app = create_app(&settings, pool, mail_queue);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], settings.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on {}", addr);
    tracing::info!("GraphiQL available at http://127.0.0.1:{}/graphql", settings.port);

    axum::serve(listener, app).await?;
    Ok(())
}
