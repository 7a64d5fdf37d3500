//! Threshold document distribution.
//!
//! - `GET /api/config` serves the current document
//! - `POST /api/config` accepts a partial document, deep-merges it and
//!   swaps it in atomically, or answers 422 with every violated invariant

use axum::{
    extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router,
};
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info, warn};

use super::AppState;

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new().route("/api/config", get(get_handler).post(publish_handler))
}

#[derive(Serialize)]
struct ValidationResponse {
    errors: Vec<String>,
}

async fn get_handler(State(state): State<AppState>) -> impl IntoResponse {
    // ---
    let current = state.thresholds.current();
    Json((*current).clone())
}

async fn publish_handler(
    State(state): State<AppState>,
    Json(patch): Json<Value>,
) -> impl IntoResponse {
    // ---
    let published = match state.thresholds.publish(&patch) {
        Ok(published) => published,
        Err(e) => {
            warn!("Rejected configuration update: {}", e);
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(ValidationResponse {
                    errors: e.violations,
                }),
            )
                .into_response();
        }
    };

    info!("Threshold document updated to v{}", published.version);

    // The new snapshot is already live; a persistence failure only means it
    // will not survive a restart.
    if let Err(e) = state.storage.save_thresholds(&published).await {
        error!(
            "Failed to persist threshold document v{}: {}",
            published.version, e
        );
    }

    (StatusCode::OK, Json((*published).clone())).into_response()
}
