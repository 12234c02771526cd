//! Server-Sent Events push channel
//!
//! Each snapshot goes out as a `stats` event followed by an `events` event.
//! A new client gets the current snapshot right away.

use alerting::Snapshot;
use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::Stream;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tracing::{debug, info, warn};

use crate::AppState;

const KEEP_ALIVE_SECS: u64 = 15;

pub async fn stream_snapshots(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let mut rx = state.snapshots.subscribe();
    let initial = state.store.snapshot(state.recent_events);
    info!("Dashboard client connected");
    metrics::counter!("dms_stream_connections_total").increment(1);

    let stream = async_stream::stream! {
        for event in snapshot_events(&initial) {
            yield Ok(event);
        }

        loop {
            let snapshot = match rx.recv().await {
                Ok(snapshot) => snapshot,
                Err(RecvError::Lagged(skipped)) => {
                    debug!("SSE client lagged by {} snapshots", skipped);
                    match newest(&mut rx) {
                        Some(snapshot) => snapshot,
                        None => continue,
                    }
                }
                Err(RecvError::Closed) => {
                    info!("Snapshot channel closed, ending SSE stream");
                    break;
                }
            };

            for event in snapshot_events(&snapshot) {
                yield Ok(event);
            }
        }
    };

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(KEEP_ALIVE_SECS))
            .text("keep-alive"),
    )
}

/// Drain whatever is buffered and keep only the last snapshot
fn newest(rx: &mut broadcast::Receiver<Snapshot>) -> Option<Snapshot> {
    let mut latest = None;
    loop {
        match rx.try_recv() {
            Ok(snapshot) => latest = Some(snapshot),
            Err(TryRecvError::Lagged(_)) => continue,
            Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return latest,
        }
    }
}

fn snapshot_events(snapshot: &Snapshot) -> Vec<Event> {
    let stats = Event::default().event("stats").json_data(snapshot.stats);
    let events = Event::default().event("events").json_data(&snapshot.events);

    [stats, events]
        .into_iter()
        .filter_map(|event| match event {
            Ok(event) => Some(event),
            Err(e) => {
                warn!("Failed to serialize snapshot: {}", e);
                None
            }
        })
        .collect()
}
