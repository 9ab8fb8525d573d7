use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::info;

use tablebook_api::jobs::{EmailRetryJob, JobScheduler, ReconfirmationSweepJob};
use tablebook_api::{app, config, middleware, services};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let config = config::Config::load()?;

    middleware::logging::init_logging(&config.logging);
    middleware::metrics::init_metrics();

    info!("Starting TableBook API v{}", env!("CARGO_PKG_VERSION"));

    let pool = persistence::db::create_pool(&config.database).await?;

    info!("Running database migrations...");
    sqlx::migrate!("../persistence/src/migrations")
        .run(&pool)
        .await?;
    info!("Migrations completed");

    let gateway = services::payments::gateway_from_config(&config.payments);

    // Background jobs share the same services as the manual trigger routes.
    let mut scheduler = JobScheduler::new();
    scheduler.register(ReconfirmationSweepJob::new(
        pool.clone(),
        Arc::new(config.clone()),
    ));
    scheduler.register(EmailRetryJob::new(pool.clone(), config.email.clone()));
    scheduler.start();

    let addr = config.socket_addr();
    let app = app::create_app(config, pool, gateway);

    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    // ConnectInfo feeds the rate limiter when no proxy header is present.
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    scheduler.shutdown();
    scheduler.wait_for_shutdown(Duration::from_secs(10)).await;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("Shutdown signal received");
}
