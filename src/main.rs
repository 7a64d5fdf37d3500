//! Application entry point for the `spoilage-sentinel` aggregation service.
//!
//! This binary orchestrates the full startup sequence for the analytics API,
//! including:
//! - Loading configuration from environment variables or `.env`
//! - Initializing structured logging/tracing
//! - Establishing a PostgreSQL connection pool
//! - Creating the database schema if it does not exist
//! - Restoring the latest threshold document (or seeding the defaults)
//! - Mounting all API routes via the `routes` gateway (EMBP pattern)
//! - Binding the Axum HTTP server and serving requests
//!
//! # Environment Variables
//! - `DATABASE_URL` (**required**) – PostgreSQL connection string
//! - `DB_POOL_MAX` (optional) – maximum number of DB connections (default: 5)
//! - `LISTEN_ADDR` (optional) – bind address (default: `0.0.0.0:8080`)
//! - `HISTORY_QUERY_LIMIT` (optional) – default analytics window (default: 50)
//! - `AXUM_LOG_LEVEL` (optional) – log verbosity (default: `debug`)
//! - `AXUM_SPAN_EVENTS` (optional) – span event mode for tracing
use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use dotenvy::dotenv;
use sqlx::postgres::PgPoolOptions;

use spoilage_sentinel::config::{self, mask_db_url};
use spoilage_sentinel::routes::{self, AppState};
use spoilage_sentinel::schema;
use spoilage_sentinel::storage::{PgStorage, Storage};
use spoilage_sentinel::telemetry;
use spoilage_sentinel::{ThresholdStore, Thresholds};

// ---

#[tokio::main]
async fn main() -> Result<()> {
    // ---
    dotenv().ok();
    telemetry::init_tracing("AXUM_LOG_LEVEL", "debug", "sqlx::query=warn");

    let cfg = config::load_from_env()?;
    cfg.log_config();

    tracing::info!("Attempting to connect to database: {}", mask_db_url(&cfg.db_url));

    let pool = PgPoolOptions::new()
        .max_connections(cfg.db_pool_max)
        .connect(&cfg.db_url)
        .await
        .map_err(|e| {
            anyhow::anyhow!(
                "Failed to connect to database '{}': {}",
                mask_db_url(&cfg.db_url),
                e
            )
        })?;

    tracing::info!("Successfully connected to database");

    schema::create_schema(&pool).await?;

    let storage: Arc<dyn Storage> = Arc::new(PgStorage::new(pool));
    let initial = match storage.load_thresholds().await? {
        Some(stored) => {
            tracing::info!("Restored threshold document v{}", stored.version);
            stored
        }
        None => {
            let defaults = Thresholds::default();
            storage.save_thresholds(&defaults).await?;
            tracing::info!("Seeded default threshold document v{}", defaults.version);
            defaults
        }
    };
    initial.validate()?;

    let state = AppState::new(
        storage,
        Arc::new(ThresholdStore::new(initial)),
        cfg.history_query_limit,
    );

    // Build app from routes gateway (EMBP)
    let app: Router = routes::router(state);

    tracing::info!("Listening on {}", cfg.listen_addr);

    let listener = tokio::net::TcpListener::bind(cfg.listen_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
