//! Runtime configuration for both `spoilage-sentinel` binaries.
//!
//! This module centralizes all runtime configuration values and their
//! defaults, loading from environment variables (with optional `.env` file
//! support provided by the caller). By consolidating configuration logic here
//! we avoid scattering `env::var` calls throughout the codebase.
//!
//! Note this is process configuration (where to listen, where to connect).
//! Risk thresholds live in [`crate::thresholds`] and are distributed at
//! runtime by the aggregation service.
use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{anyhow, Result};

/// Parse an optional environment variable of type `$ty` with a default value.
macro_rules! parse_env {
    ($var_name:expr, $ty:ty, $default:expr) => {
        env::var($var_name)
            .ok()
            .map(|v| v.parse::<$ty>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

/// Parse a required string environment variable.
macro_rules! require_env {
    ($var_name:expr) => {
        env::var($var_name)
            .map_err(|_| anyhow!("{} must be set in .env or environment", $var_name))?
    };
}

/// Aggregation service configuration.
///
/// All fields are immutable after loading, ensuring a consistent configuration
/// snapshot for the lifetime of the application.
#[derive(Debug, Clone)]
pub struct Config {
    // ---
    /// PostgreSQL connection string.
    pub db_url: String,

    /// Maximum number of database connections in the pool.
    pub db_pool_max: u32,

    /// Address the HTTP server binds to.
    pub listen_addr: SocketAddr,

    /// Default number of readings per analytics window.
    pub history_query_limit: usize,
}

/// Hard upper bound on any requested window.
pub const MAX_QUERY_LIMIT: usize = 500;

/// Load aggregation service configuration from environment variables.
///
/// Required:
/// - `DATABASE_URL` – PostgreSQL connection string
///
/// Optional:
/// - `DB_POOL_MAX` – max DB connections (default: 5)
/// - `LISTEN_ADDR` – bind address (default: 0.0.0.0:8080)
/// - `HISTORY_QUERY_LIMIT` – readings per analytics window (default: 50)
///
/// Returns an error if any required variable is missing or invalid.
pub fn load_from_env() -> Result<Config> {
    // ---
    let db_url = require_env!("DATABASE_URL");
    let db_pool_max = parse_env!("DB_POOL_MAX", u32, 5);
    let listen_addr = parse_env!(
        "LISTEN_ADDR",
        SocketAddr,
        SocketAddr::from(([0, 0, 0, 0], 8080))
    );
    let history_query_limit = parse_env!("HISTORY_QUERY_LIMIT", usize, 50);

    if history_query_limit == 0 || history_query_limit > MAX_QUERY_LIMIT {
        return Err(anyhow!("HISTORY_QUERY_LIMIT must be between 1 and {MAX_QUERY_LIMIT}"));
    }

    Ok(Config {
        db_url,
        db_pool_max,
        listen_addr,
        history_query_limit,
    })
}

impl Config {
    /// Log the loaded configuration for debugging purposes.
    ///
    /// Masks sensitive information like database passwords while showing
    /// all configuration values that were loaded.
    pub fn log_config(&self) {
        // ---
        tracing::info!("Configuration loaded:");
        tracing::info!("  DATABASE_URL        : {}", mask_db_url(&self.db_url));
        tracing::info!("  DB_POOL_MAX         : {}", self.db_pool_max);
        tracing::info!("  LISTEN_ADDR         : {}", self.listen_addr);
        tracing::info!("  HISTORY_QUERY_LIMIT : {}", self.history_query_limit);
    }
}

/// Replace the password part of a connection string with `****`.
pub fn mask_db_url(db_url: &str) -> String {
    // ---
    if let Some(at_pos) = db_url.rfind('@') {
        if let Some(colon_pos) = db_url[..at_pos].rfind(':') {
            // `postgres://user@host` has a colon only in the scheme
            let prefix = &db_url[..colon_pos];
            if !prefix.ends_with("postgres") && !prefix.ends_with("postgresql") {
                return format!("{}:****{}", &db_url[..colon_pos], &db_url[at_pos..]);
            }
        }
    }
    db_url.to_string()
}

// ---

/// Edge agent configuration.
#[derive(Debug, Clone)]
pub struct EdgeConfig {
    // ---
    /// Base URL of the aggregation service.
    pub server_url: String,

    /// Identifier reported with every reading.
    pub device_id: String,

    /// How often cached thresholds are refreshed.
    pub config_pull_interval: Duration,

    /// Upper bound on any single network call.
    pub http_timeout: Duration,

    /// Maximum readings waiting for delivery.
    pub outbox_capacity: usize,

    /// Buzzer on/off cycle length.
    pub buzzer_period_ms: i64,
}

/// Load edge agent configuration from environment variables.
///
/// Required:
/// - `SERVER_URL` – aggregation service base URL
/// - `DEVICE_ID` – this unit's identifier
///
/// Optional:
/// - `CONFIG_PULL_SECS` – threshold refresh interval (default: 300)
/// - `HTTP_TIMEOUT_SECS` – network call timeout (default: 10)
/// - `OUTBOX_CAPACITY` – undelivered readings kept (default: 64)
/// - `BUZZER_PERIOD_MS` – buzzer cycle length (default: 1000)
pub fn load_edge_from_env() -> Result<EdgeConfig> {
    // ---
    let server_url = require_env!("SERVER_URL");
    let device_id = require_env!("DEVICE_ID");
    let config_pull_secs = parse_env!("CONFIG_PULL_SECS", u64, 300);
    let http_timeout_secs = parse_env!("HTTP_TIMEOUT_SECS", u64, 10);
    let outbox_capacity = parse_env!("OUTBOX_CAPACITY", usize, 64);
    let buzzer_period_ms = parse_env!("BUZZER_PERIOD_MS", i64, 1000);

    if http_timeout_secs == 0 {
        return Err(anyhow!("HTTP_TIMEOUT_SECS must be at least 1"));
    }

    Ok(EdgeConfig {
        server_url: server_url.trim_end_matches('/').to_string(),
        device_id,
        config_pull_interval: Duration::from_secs(config_pull_secs.max(1)),
        http_timeout: Duration::from_secs(http_timeout_secs),
        outbox_capacity: outbox_capacity.max(1),
        buzzer_period_ms,
    })
}

impl EdgeConfig {
    pub fn log_config(&self) {
        // ---
        tracing::info!("Edge configuration loaded:");
        tracing::info!("  SERVER_URL        : {}", self.server_url);
        tracing::info!("  DEVICE_ID         : {}", self.device_id);
        tracing::info!("  CONFIG_PULL_SECS  : {}", self.config_pull_interval.as_secs());
        tracing::info!("  HTTP_TIMEOUT_SECS : {}", self.http_timeout.as_secs());
        tracing::info!("  OUTBOX_CAPACITY   : {}", self.outbox_capacity);
        tracing::info!("  BUZZER_PERIOD_MS  : {}", self.buzzer_period_ms);
    }
}
