// src/routes/health.rs
//! API health check endpoint for the aggregation service.
//!
//! This module defines the `/health` route used by container orchestrators
//! and edge agents to verify that the service is running. It is a sibling
//! module in the `routes` directory and follows the Explicit Module Boundary
//! Pattern (EMBP):
//! - Internal to this file: endpoint handler(s) and related types
//! - Exports to the gateway (`mod.rs`): a subrouter containing the `/health` route

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use super::AppState;

/// JSON response body for the `/health` endpoint.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    /// Version of the threshold document currently served.
    config_version: u32,
}

/// Handle `GET /health`.
///
/// Reports liveness and the active threshold version. Does not touch the
/// database, so it stays cheap enough for frequent probes.
async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        config_version: state.thresholds.current().version,
    })
}

/// Create a subrouter containing the `/health` route.
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}
