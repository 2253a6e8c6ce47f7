use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use ticketing_api::{app, config, middleware, services::TicketMailer};

/// How often connection pool gauges are refreshed.
const POOL_METRICS_INTERVAL: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let config = config::Config::load()?;

    middleware::logging::init_logging(&config.logging);
    middleware::init_metrics()?;

    info!(
        app_name = %config.server.app_name,
        "Starting ticketing API v{}",
        env!("CARGO_PKG_VERSION")
    );

    let pool = persistence::db::create_pool(&(&config.database).into()).await?;

    info!("Running database migrations...");
    persistence::db::run_migrations(&pool).await?;
    info!("Migrations completed");

    let metrics_pool = pool.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(POOL_METRICS_INTERVAL);
        loop {
            interval.tick().await;
            persistence::metrics::record_pool_metrics(&metrics_pool);
        }
    });

    let store = Arc::new(persistence::PgTicketingStore::new(pool));
    let notifier = Arc::new(TicketMailer::new(
        config.email.clone(),
        config.server.app_name.clone(),
    ));
    info!(
        provider = %config.email.provider,
        enabled = config.email.enabled,
        "Ticket email delivery configured"
    );

    let addr = config.socket_addr()?;
    let app = app::create_app(config, store, notifier);

    info!("Server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
