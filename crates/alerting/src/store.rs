//! Shared event store

use ring_buffer::RingBuffer;
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

use crate::AlertError;

/// Monotonic counters for the process lifetime
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsCounters {
    /// Confirmed yawns
    pub yawns_total: u64,
    /// Prolonged eye closure episodes
    pub eye_closures_total: u64,
    /// Alerts raised (eye closures and yawn series)
    pub alerts_total: u64,
}

/// What kind of event is being recorded; decides which counters move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    /// Prolonged eye closure: one closure and one alert
    EyeClosure,
    /// Confirmed yawn: one yawn, no alert
    Yawn,
    /// Too many yawns inside the window: one alert
    YawnSeries,
}

impl AlertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::EyeClosure => "eye_closure",
            AlertKind::Yawn => "yawn",
            AlertKind::YawnSeries => "yawn_series",
        }
    }

    fn apply(&self, stats: &mut StatsCounters) {
        match self {
            AlertKind::EyeClosure => {
                stats.eye_closures_total += 1;
                stats.alerts_total += 1;
            }
            AlertKind::Yawn => stats.yawns_total += 1,
            AlertKind::YawnSeries => stats.alerts_total += 1,
        }
    }
}

/// One entry of the recent-event log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEntry {
    pub kind: AlertKind,
    pub label: String,
    /// Seconds on the detection worker's clock
    pub timestamp: f64,
}

/// Counters and recent events captured at the same instant
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub stats: StatsCounters,
    /// Most recent event labels, oldest first
    pub events: Vec<String>,
}

struct StoreInner {
    stats: StatsCounters,
    log: RingBuffer<EventEntry>,
}

/// Counters plus bounded event log behind a single lock.
///
/// Written by the detection worker, read by the broadcast and HTTP paths.
/// Every write updates counters and log in one critical section, so a reader
/// never sees an incremented counter without its log entry.
pub struct EventStore {
    inner: Mutex<StoreInner>,
}

impl EventStore {
    /// Create a store whose log keeps the last `capacity` events
    pub fn new(capacity: usize) -> Result<Self, AlertError> {
        info!("Creating event store with log capacity {}", capacity);
        Ok(Self {
            inner: Mutex::new(StoreInner {
                stats: StatsCounters::default(),
                log: RingBuffer::new(capacity)?,
            }),
        })
    }

    // A panicking writer cannot leave the counters half-updated, so a
    // poisoned lock is safe to keep using.
    fn lock(&self) -> MutexGuard<'_, StoreInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record an event: bump its counters and append it to the log
    pub fn record(&self, kind: AlertKind, label: impl Into<String>, timestamp: f64) {
        let label = label.into();
        {
            let mut inner = self.lock();
            kind.apply(&mut inner.stats);
            if let Some(evicted) = inner.log.push(EventEntry {
                kind,
                label: label.clone(),
                timestamp,
            }) {
                debug!("Event log full, evicted '{}'", evicted.label);
            }
        }
        metrics::counter!("dms_events_total", "kind" => kind.as_str()).increment(1);
        debug!("Recorded {} at {:.3}s: {}", kind.as_str(), timestamp, label);
    }

    /// Current counters
    pub fn stats(&self) -> StatsCounters {
        self.lock().stats
    }

    /// The most recent `count` events, oldest first
    pub fn recent_events(&self, count: usize) -> Vec<EventEntry> {
        self.lock().log.recent(count).into_iter().cloned().collect()
    }

    /// Consistent counters + recent labels
    pub fn snapshot(&self, recent: usize) -> Snapshot {
        let inner = self.lock();
        Snapshot {
            stats: inner.stats,
            events: inner
                .log
                .recent(recent)
                .into_iter()
                .map(|entry| entry.label.clone())
                .collect(),
        }
    }

    /// Log capacity
    pub fn capacity(&self) -> usize {
        self.lock().log.capacity()
    }

    /// Events currently held in the log
    pub fn len(&self) -> usize {
        self.lock().log.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
