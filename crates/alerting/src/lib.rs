//! Alerting System
//!
//! Owns the state shared between the detection worker and the dashboard:
//! monotonic alert counters plus a bounded log of recent events, both kept
//! behind one lock so every snapshot is consistent. Snapshots are pushed to
//! subscribers at a throttled cadence.

mod broadcast;
mod store;
mod throttle;

pub use broadcast::{Broadcaster, DEFAULT_RECENT_EVENTS};
pub use store::{AlertKind, EventEntry, EventStore, Snapshot, StatsCounters};
pub use throttle::EmitThrottle;

use ring_buffer::RingBufferError;
use thiserror::Error;

/// Alerting error types
#[derive(Error, Debug)]
pub enum AlertError {
    #[error("Invalid event log capacity: {0}")]
    Capacity(#[from] RingBufferError),

    #[error("Invalid emit interval: {0}")]
    Interval(f64),
}
