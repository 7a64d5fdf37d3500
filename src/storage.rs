//! Persistence for readings and threshold documents.
//!
//! The aggregation service only needs "insert a reading", "latest N for a
//! device" and "load/save the threshold document". [`PgStorage`] backs the
//! service in production; [`MemoryStorage`] keeps a bounded window per
//! device and is used by tests and local runs.

use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::engine::risk::HealthClass;
use crate::engine::window::HistoryWindow;
use crate::models::Reading;
use crate::thresholds::Thresholds;

// ---

#[async_trait]
pub trait Storage: Send + Sync {
    // ---
    /// Persist one derived reading, returning its assigned id.
    async fn insert_reading(&self, reading: &Reading) -> Result<Uuid>;

    /// The newest `limit` readings for a device, ordered oldest → newest.
    async fn recent_readings(&self, device_id: &str, limit: usize) -> Result<Vec<Reading>>;

    /// Latest stored threshold document, if any was ever saved.
    async fn load_thresholds(&self) -> Result<Option<Thresholds>>;

    async fn save_thresholds(&self, thresholds: &Thresholds) -> Result<()>;
}

// ---

/// In-process storage with a bounded history per device.
///
/// Single writer per device under the write lock; readers take a snapshot
/// under the read lock and compute on their own copy.
#[derive(Debug)]
pub struct MemoryStorage {
    // ---
    per_device_capacity: usize,
    windows: RwLock<HashMap<String, HistoryWindow<Reading>>>,
    thresholds: RwLock<Option<Thresholds>>,
}

impl MemoryStorage {
    // ---
    pub fn new(per_device_capacity: usize) -> Self {
        // ---
        Self {
            per_device_capacity,
            windows: RwLock::new(HashMap::new()),
            thresholds: RwLock::new(None),
        }
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    // ---
    async fn insert_reading(&self, reading: &Reading) -> Result<Uuid> {
        // ---
        let mut windows = self
            .windows
            .write()
            .map_err(|_| anyhow!("reading store lock poisoned"))?;
        windows
            .entry(reading.device_id.clone())
            .or_insert_with(|| HistoryWindow::new(self.per_device_capacity))
            .push(reading.clone());
        Ok(Uuid::new_v4())
    }

    async fn recent_readings(&self, device_id: &str, limit: usize) -> Result<Vec<Reading>> {
        // ---
        let windows = self
            .windows
            .read()
            .map_err(|_| anyhow!("reading store lock poisoned"))?;
        let Some(window) = windows.get(device_id) else {
            return Ok(Vec::new());
        };
        let snapshot = window.snapshot();
        let skip = snapshot.len().saturating_sub(limit);
        Ok(snapshot.into_iter().skip(skip).collect())
    }

    async fn load_thresholds(&self) -> Result<Option<Thresholds>> {
        // ---
        let stored = self
            .thresholds
            .read()
            .map_err(|_| anyhow!("threshold store lock poisoned"))?;
        Ok(stored.clone())
    }

    async fn save_thresholds(&self, thresholds: &Thresholds) -> Result<()> {
        // ---
        let mut stored = self
            .thresholds
            .write()
            .map_err(|_| anyhow!("threshold store lock poisoned"))?;
        *stored = Some(thresholds.clone());
        Ok(())
    }
}

// ---

/// Postgres-backed storage.
#[derive(Debug, Clone)]
pub struct PgStorage {
    // ---
    pool: PgPool,
}

impl PgStorage {
    // ---
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ReadingRow {
    // ---
    device_id: String,
    recorded_at: DateTime<Utc>,
    temperature: f64,
    humidity: f64,
    gas_level: f64,
    spoilage_risk: f64,
    health_class: String,
    dew_point: f64,
    absolute_humidity: f64,
    vapor_pressure_deficit: f64,
    equilibrium_moisture_content: f64,
}

impl TryFrom<ReadingRow> for Reading {
    type Error = anyhow::Error;

    fn try_from(row: ReadingRow) -> Result<Self> {
        // ---
        let health_class = HealthClass::parse(&row.health_class)
            .ok_or_else(|| anyhow!("unknown health class '{}'", row.health_class))?;

        Ok(Reading {
            device_id: row.device_id,
            timestamp: row.recorded_at,
            temperature: row.temperature,
            humidity: row.humidity,
            gas_level: row.gas_level,
            spoilage_risk: row.spoilage_risk,
            health_class,
            dew_point: row.dew_point,
            absolute_humidity: row.absolute_humidity,
            vapor_pressure_deficit: row.vapor_pressure_deficit,
            equilibrium_moisture_content: row.equilibrium_moisture_content,
        })
    }
}

#[async_trait]
impl Storage for PgStorage {
    // ---
    async fn insert_reading(&self, reading: &Reading) -> Result<Uuid> {
        // ---
        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO readings (
                id, device_id, recorded_at,
                temperature, humidity, gas_level,
                spoilage_risk, health_class,
                dew_point, absolute_humidity,
                vapor_pressure_deficit, equilibrium_moisture_content
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(id)
        .bind(&reading.device_id)
        .bind(reading.timestamp)
        .bind(reading.temperature)
        .bind(reading.humidity)
        .bind(reading.gas_level)
        .bind(reading.spoilage_risk)
        .bind(reading.health_class.as_str())
        .bind(reading.dew_point)
        .bind(reading.absolute_humidity)
        .bind(reading.vapor_pressure_deficit)
        .bind(reading.equilibrium_moisture_content)
        .execute(&self.pool)
        .await?;

        Ok(id)
    }

    async fn recent_readings(&self, device_id: &str, limit: usize) -> Result<Vec<Reading>> {
        // ---
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows: Vec<ReadingRow> = sqlx::query_as(
            r#"
            SELECT device_id, recorded_at, temperature, humidity, gas_level,
                   spoilage_risk, health_class, dew_point, absolute_humidity,
                   vapor_pressure_deficit, equilibrium_moisture_content
            FROM readings
            WHERE device_id = $1
            ORDER BY recorded_at DESC
            LIMIT $2
            "#,
        )
        .bind(device_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        // Newest-first from the index, flip to oldest-first for the engine
        rows.into_iter().rev().map(Reading::try_from).collect()
    }

    async fn load_thresholds(&self) -> Result<Option<Thresholds>> {
        // ---
        let document: Option<(String,)> = sqlx::query_as(
            "SELECT document FROM thresholds_config ORDER BY version DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        document
            .map(|(text,)| serde_json::from_str::<Thresholds>(&text).map_err(anyhow::Error::from))
            .transpose()
    }

    async fn save_thresholds(&self, thresholds: &Thresholds) -> Result<()> {
        // ---
        let document = serde_json::to_string(thresholds)?;
        let version = i32::try_from(thresholds.version)?;

        sqlx::query(
            r#"
            INSERT INTO thresholds_config (version, document)
            VALUES ($1, $2)
            ON CONFLICT (version) DO UPDATE SET
                document = EXCLUDED.document,
                created_at = NOW()
            "#,
        )
        .bind(version)
        .bind(document)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
