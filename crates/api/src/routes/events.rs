//! Recent event log endpoint

use alerting::EventEntry;
use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::AppState;

/// Query parameters for the event log
#[derive(Debug, Deserialize)]
pub struct EventQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct EventResponse {
    pub data: Vec<EventEntry>,
    pub count: usize,
    pub capacity: usize,
}

/// Get the most recent events, oldest first
pub async fn get_events(
    State(state): State<Arc<AppState>>,
    Query(query): Query<EventQuery>,
) -> Json<EventResponse> {
    let capacity = state.store.capacity();
    let limit = query.limit.unwrap_or(state.recent_events).min(capacity);
    let data = state.store.recent_events(limit);

    Json(EventResponse {
        count: data.len(),
        data,
        capacity,
    })
}
