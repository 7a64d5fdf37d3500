//! Reading ingestion and history endpoints.
//!
//! - `POST /api/readings` stores one derived reading sent by an edge agent
//! - `GET /api/readings?device_id=..&limit=..` returns recent history, oldest first

use axum::{
    extract::Query, extract::State, http::StatusCode, response::IntoResponse, routing::get, Json,
    Router,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::AppState;
use crate::Reading;

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new().route("/api/readings", get(list_handler).post(ingest_handler))
}

#[derive(Serialize)]
struct IngestResponse {
    id: Uuid,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

async fn ingest_handler(
    State(state): State<AppState>,
    Json(reading): Json<Reading>,
) -> impl IntoResponse {
    // ---
    debug!("POST /api/readings - device {}", reading.device_id);

    if let Err(reason) = reading.validate() {
        warn!("Rejected reading from {}: {}", reading.device_id, reason);
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ErrorResponse { error: reason }),
        )
            .into_response();
    }

    match state.storage.insert_reading(&reading).await {
        Ok(id) => {
            info!(
                device_id = %reading.device_id,
                risk = reading.spoilage_risk,
                health = reading.health_class.as_str(),
                "Stored reading {}",
                id
            );
            (StatusCode::CREATED, Json(IngestResponse { id })).into_response()
        }
        Err(e) => {
            error!("Failed to store reading: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to store reading".to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// Query parameters for reading history.
#[derive(Debug, Deserialize)]
pub struct ReadingsQuery {
    device_id: Option<String>,
    limit: Option<usize>,
}

async fn list_handler(
    Query(params): Query<ReadingsQuery>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    // ---
    info!("GET /api/readings: {:?}", params);

    let Some(device_id) = params.device_id.filter(|id| !id.is_empty()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "device_id is required".to_string(),
            }),
        )
            .into_response();
    };

    let limit = state.window_limit(params.limit);
    match state.storage.recent_readings(&device_id, limit).await {
        Ok(readings) => {
            debug!("Returning {} readings for {}", readings.len(), device_id);
            (StatusCode::OK, Json(readings)).into_response()
        }
        Err(e) => {
            error!("Failed to query readings for {}: {}", device_id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to query readings".to_string(),
                }),
            )
                .into_response()
        }
    }
}
