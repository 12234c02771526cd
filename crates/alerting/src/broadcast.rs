//! Throttled snapshot broadcaster

use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::{AlertError, EmitThrottle, EventStore, Snapshot};

/// Number of recent event labels carried by each snapshot
pub const DEFAULT_RECENT_EVENTS: usize = 20;

/// Pushes store snapshots to subscribers, at most once per throttle interval.
///
/// Subscribers get whole snapshots, never diffs: a receiver that falls behind
/// can skip straight to the newest one without losing counter values.
pub struct Broadcaster {
    sender: broadcast::Sender<Snapshot>,
    throttle: EmitThrottle,
    recent: usize,
}

impl Broadcaster {
    /// Create a broadcaster emitting every `interval` seconds with the last
    /// `recent` event labels
    pub fn new(interval: f64, recent: usize, channel_capacity: usize) -> Result<Self, AlertError> {
        let (sender, _) = broadcast::channel(channel_capacity.max(1));
        info!(
            "Creating broadcaster: interval={}s, recent_events={}",
            interval, recent
        );
        Ok(Self {
            sender,
            throttle: EmitThrottle::new(interval)?,
            recent,
        })
    }

    /// Subscribe to snapshot pushes
    pub fn subscribe(&self) -> broadcast::Receiver<Snapshot> {
        self.sender.subscribe()
    }

    /// Sender handle, for wiring subscribers on another runtime
    pub fn sender(&self) -> broadcast::Sender<Snapshot> {
        self.sender.clone()
    }

    /// Emit a snapshot if the throttle allows it at `now`.
    ///
    /// Returns whether a snapshot was taken. Having no subscribers is not an
    /// error; the snapshot is simply dropped.
    pub fn maybe_emit(&mut self, store: &EventStore, now: f64) -> bool {
        if !self.throttle.try_acquire(now) {
            return false;
        }

        let snapshot = store.snapshot(self.recent);
        debug!(
            "Emitting stats {:?} with {} events",
            snapshot.stats,
            snapshot.events.len()
        );
        if self.sender.send(snapshot).is_err() {
            debug!("No dashboard subscribers for snapshot");
        }
        true
    }
}
