//! Yawn series aggregation

use std::collections::VecDeque;
use tracing::warn;

use crate::DmsConfig;

/// Sliding-window counter over confirmed yawns.
///
/// Every timestamp held satisfies `now - t <= window`. Reaching `count`
/// yawns fires one series alert and empties the window, so the next alert
/// needs a fresh run of yawns.
#[derive(Debug, Clone)]
pub struct YawnSeriesAggregator {
    count: usize,
    window: f64,
    times: VecDeque<f64>,
}

impl YawnSeriesAggregator {
    pub fn new(config: &DmsConfig) -> Self {
        Self {
            count: config.yawn_series_count,
            window: config.yawn_series_window_secs,
            times: VecDeque::with_capacity(config.yawn_series_count),
        }
    }

    /// Add a confirmed yawn at `at`. Returns the series size when an alert fires.
    pub fn record(&mut self, at: f64) -> Option<usize> {
        self.times.push_back(at);
        self.evict(at);

        if self.times.len() < self.count {
            return None;
        }
        let fired = self.times.len();
        warn!("Too many yawns: {} within {:.1}s", fired, self.window);
        self.times.clear();
        Some(fired)
    }

    fn evict(&mut self, now: f64) {
        while let Some(&oldest) = self.times.front() {
            if now - oldest <= self.window {
                break;
            }
            self.times.pop_front();
        }
    }

    /// Timestamps currently in the window, oldest first
    pub fn window(&self) -> Vec<f64> {
        self.times.iter().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn reset(&mut self) {
        self.times.clear();
    }
}
