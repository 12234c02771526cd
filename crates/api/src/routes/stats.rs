//! Counter endpoint

use alerting::StatsCounters;
use axum::{extract::State, Json};
use std::sync::Arc;

use crate::AppState;

/// Get current counters
pub async fn get_stats(State(state): State<Arc<AppState>>) -> Json<StatsCounters> {
    Json(state.store.stats())
}
