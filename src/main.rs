//! Application entry point for the `roomclimate` service.
//!
//! This binary orchestrates the full startup sequence:
//! - Loading configuration from environment variables or `.env`
//! - Initializing structured logging/tracing
//! - Connecting the PostgreSQL pool and creating the schema, or falling back
//!   to the in-memory store when `DATABASE_URL` is unset
//! - Starting the optional keep-alive pinger
//! - Mounting all routes via the `routes` gateway and serving them with Axum
//!
//! See [`roomclimate::config::load_from_env`] for every recognised variable.
use std::net::SocketAddr;

use anyhow::Result;
use dotenvy::dotenv;
use sqlx::postgres::PgPoolOptions;

use roomclimate::{
    config, keepalive, logging, routes, schema, Config, MemoryReadingStore, PgReadingStore,
    ReadingStore, ReportService,
};

// ---

#[tokio::main]
async fn main() -> Result<()> {
    // ---
    dotenv().ok();
    logging::init_tracing("debug");

    let cfg = config::load_from_env()?;
    cfg.log_config();

    if let Some(url) = &cfg.keepalive_url {
        keepalive::spawn(url.clone(), cfg.keepalive_interval());
    }

    match cfg.db_url.clone() {
        Some(db_url) => {
            tracing::info!("Attempting to connect to database");

            let pool = PgPoolOptions::new()
                .max_connections(cfg.db_pool_max)
                .acquire_timeout(cfg.db_acquire_timeout())
                .connect(&db_url)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to connect to database: {}", e))?;

            tracing::info!("Successfully connected to database");
            schema::create_schema(&pool).await?;

            serve(PgReadingStore::new(pool), cfg).await
        }
        None => {
            tracing::warn!("DATABASE_URL not set, readings are kept in memory only");
            serve(MemoryReadingStore::new(), cfg).await
        }
    }
}

/// Build the app around `store` and serve it until the listener fails.
async fn serve<S: ReadingStore>(store: S, cfg: Config) -> Result<()> {
    // ---
    let service = ReportService::new(store, cfg.aggregator());
    let addr = SocketAddr::from(([0, 0, 0, 0], cfg.port));
    let app = routes::router(service, cfg);

    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
