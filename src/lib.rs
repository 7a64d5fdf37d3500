//! Spoilage Sentinel: environmental risk analytics for storage units.
//!
//! The crate is organized along the Explicit Module Boundary Pattern (EMBP):
//! - `engine` – pure analytics (derived metrics, risk, trends, prediction,
//!   recommendations, alarm state machine)
//! - `thresholds` – the versioned threshold document and its atomic store
//! - `storage` / `schema` – persistence for the aggregation service
//! - `routes` – HTTP API of the aggregation service
//! - `edge` – sampling loop, actuator and uplink of the edge agent
//! - `config` / `telemetry` – process configuration and logging setup

pub mod config;
pub mod edge;
pub mod engine;
pub mod error;
pub mod models;
pub mod routes;
pub mod schema;
pub mod storage;
pub mod telemetry;
pub mod thresholds;

pub use config::{Config, EdgeConfig};
pub use models::{RawSample, Reading};
pub use thresholds::{ThresholdStore, Thresholds};
