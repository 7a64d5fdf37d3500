//! Per-device analytics views computed on demand.
//!
//! Every request takes its own snapshot of the device window and of the
//! threshold document, then runs the engine without touching shared state.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use super::AppState;
use crate::engine::{self, Analysis};

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new()
        .route("/api/devices/{device_id}/analysis", get(analysis_handler))
        .route("/api/devices/{device_id}/trends", get(trends_handler))
        .route("/api/devices/{device_id}/prediction", get(prediction_handler))
        .route(
            "/api/devices/{device_id}/recommendations",
            get(recommendations_handler),
        )
}

#[derive(Debug, Deserialize)]
pub struct WindowQuery {
    limit: Option<usize>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// Load the window and evaluate it, or produce the error response.
async fn evaluate(
    state: &AppState,
    device_id: &str,
    limit: Option<usize>,
) -> Result<Analysis, Response> {
    // ---
    let limit = state.window_limit(limit);
    let thresholds = state.thresholds.current();

    let window = state
        .storage
        .recent_readings(device_id, limit)
        .await
        .map_err(|e| {
            error!("Failed to load history for {}: {}", device_id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to load history".to_string(),
                }),
            )
                .into_response()
        })?;

    if window.is_empty() {
        return Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("No readings for device '{device_id}'"),
            }),
        )
            .into_response());
    }

    debug!(
        "Evaluating {} readings for {} (config v{})",
        window.len(),
        device_id,
        thresholds.version
    );
    Ok(engine::analyze(&window, &thresholds))
}

async fn analysis_handler(
    Path(device_id): Path<String>,
    Query(params): Query<WindowQuery>,
    State(state): State<AppState>,
) -> Response {
    // ---
    match evaluate(&state, &device_id, params.limit).await {
        Ok(analysis) => Json(analysis).into_response(),
        Err(resp) => resp,
    }
}

async fn trends_handler(
    Path(device_id): Path<String>,
    Query(params): Query<WindowQuery>,
    State(state): State<AppState>,
) -> Response {
    // ---
    match evaluate(&state, &device_id, params.limit).await {
        Ok(analysis) => Json(analysis.trends).into_response(),
        Err(resp) => resp,
    }
}

async fn prediction_handler(
    Path(device_id): Path<String>,
    Query(params): Query<WindowQuery>,
    State(state): State<AppState>,
) -> Response {
    // ---
    match evaluate(&state, &device_id, params.limit).await {
        Ok(analysis) => Json(analysis.prediction).into_response(),
        Err(resp) => resp,
    }
}

async fn recommendations_handler(
    Path(device_id): Path<String>,
    Query(params): Query<WindowQuery>,
    State(state): State<AppState>,
) -> Response {
    // ---
    match evaluate(&state, &device_id, params.limit).await {
        Ok(analysis) => Json(analysis.recommendations).into_response(),
        Err(resp) => resp,
    }
}
