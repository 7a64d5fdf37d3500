//! Database schema management for `spoilage-sentinel`.
//!
//! Ensures required tables and indexes exist before serving requests.
//! Applied once on startup from `main.rs` (EMBP: single gateway call).

use anyhow::Result;
use sqlx::PgPool;

// ---

/// Create or update the database schema (idempotent).
///
/// Creates the `readings` table for derived readings and the
/// `thresholds_config` table holding every accepted threshold document.
/// Safe to call on every startup; no-op if objects already exist.
///
/// Errors are propagated if any SQL execution fails.
pub async fn create_schema(pool: &PgPool) -> Result<()> {
    // ---
    let mut tx = pool.begin().await?;

    // Derived readings as delivered by edge agents
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS readings (
            id                           UUID PRIMARY KEY,
            device_id                    TEXT             NOT NULL,
            recorded_at                  TIMESTAMPTZ      NOT NULL,
            temperature                  DOUBLE PRECISION NOT NULL,
            humidity                     DOUBLE PRECISION NOT NULL,
            gas_level                    DOUBLE PRECISION NOT NULL,
            spoilage_risk                DOUBLE PRECISION NOT NULL,
            health_class                 TEXT             NOT NULL,
            dew_point                    DOUBLE PRECISION NOT NULL,
            absolute_humidity            DOUBLE PRECISION NOT NULL,
            vapor_pressure_deficit       DOUBLE PRECISION NOT NULL,
            equilibrium_moisture_content DOUBLE PRECISION NOT NULL
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    // One row per accepted threshold document version
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS thresholds_config (
            version     INTEGER     PRIMARY KEY,
            document    TEXT        NOT NULL,
            created_at  TIMESTAMPTZ NOT NULL DEFAULT NOW()
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    // History queries are always "latest N for one device"
    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_readings_device_time
            ON readings (device_id, recorded_at DESC);
        "#,
    )
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}
