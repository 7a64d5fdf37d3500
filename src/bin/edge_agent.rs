//! Entry point for the `edge-agent` binary.
//!
//! Runs the sampling loop for a single storage unit on a current-thread
//! runtime: one evaluation cycle at a time, alarm driven locally, readings
//! delivered to the aggregation service through a bounded outbox.
//!
//! # Environment Variables
//! - `SERVER_URL` (**required**) – aggregation service base URL
//! - `DEVICE_ID` (**required**) – identifier of this unit
//! - `CONFIG_PULL_SECS`, `HTTP_TIMEOUT_SECS`, `OUTBOX_CAPACITY`,
//!   `BUZZER_PERIOD_MS` (optional) – see [`spoilage_sentinel::config`]
//! - `EDGE_LOG_LEVEL` (optional) – log verbosity (default: `info`)
use anyhow::Result;
use dotenvy::dotenv;

use spoilage_sentinel::config;
use spoilage_sentinel::edge::{EdgeAgent, HttpUplink, LogActuator, SimulatedSensor};
use spoilage_sentinel::engine::alarm::BuzzerPattern;
use spoilage_sentinel::telemetry;
use spoilage_sentinel::Thresholds;

// ---

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // ---
    dotenv().ok();
    telemetry::init_tracing("EDGE_LOG_LEVEL", "info", "");

    let cfg = config::load_edge_from_env()?;
    cfg.log_config();

    let uplink = HttpUplink::new(cfg.server_url.clone(), cfg.http_timeout)?;

    // Defaults until the first successful pull replaces them
    let agent = EdgeAgent::new(
        cfg.device_id.clone(),
        SimulatedSensor::default(),
        LogActuator::default(),
        uplink,
        Thresholds::default(),
        cfg.outbox_capacity,
        BuzzerPattern::new(cfg.buzzer_period_ms),
    );

    agent.run(cfg.config_pull_interval).await
}
