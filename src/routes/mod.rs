//! HTTP gateway for the aggregation service (EMBP).
//!
//! Each sibling module exports a subrouter; this gateway merges them and
//! attaches the shared [`AppState`], so `main.rs` never needs to know about
//! individual endpoints.

use std::sync::Arc;

use axum::Router;

use crate::storage::Storage;
use crate::thresholds::ThresholdStore;

mod analytics;
mod health;
mod readings;
mod thresholds;

// ---

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    // ---
    pub storage: Arc<dyn Storage>,
    pub thresholds: Arc<ThresholdStore>,
    /// Window size used when a request does not pass `limit`.
    pub history_limit: usize,
}

impl AppState {
    // ---
    pub fn new(
        storage: Arc<dyn Storage>,
        thresholds: Arc<ThresholdStore>,
        history_limit: usize,
    ) -> Self {
        // ---
        Self {
            storage,
            thresholds,
            history_limit,
        }
    }

    /// Requested window size, defaulted and capped.
    pub(crate) fn window_limit(&self, requested: Option<usize>) -> usize {
        // ---
        requested
            .unwrap_or(self.history_limit)
            .clamp(1, crate::config::MAX_QUERY_LIMIT)
    }
}

pub fn router(state: AppState) -> Router {
    // ---
    Router::new()
        .merge(readings::router())
        .merge(analytics::router())
        .merge(thresholds::router())
        .merge(health::router())
        .with_state(state)
}
