//! Yawn detection

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::state::MouthPhase;
use crate::DmsConfig;

/// A mouth-open period long enough to count as a yawn
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfirmedYawn {
    /// When the mouth closed (seconds)
    pub at: f64,
    /// How long it stayed open (seconds)
    pub duration: f64,
}

/// Open/close state machine over per-frame MAR.
///
/// Opening requires `mar >= open_threshold`, closing `mar <= close_threshold`;
/// the gap between them keeps the state from fluttering. A closed period only
/// counts as a yawn when it lasted at least `min_open` seconds.
#[derive(Debug, Clone)]
pub struct YawnDetector {
    open_threshold: f64,
    close_threshold: f64,
    min_open: f64,
    phase: MouthPhase,
}

impl YawnDetector {
    pub fn new(config: &DmsConfig) -> Self {
        Self {
            open_threshold: config.mar_open_threshold,
            close_threshold: config.mar_close_threshold,
            min_open: config.yawn_min_open_secs,
            phase: MouthPhase::Closed,
        }
    }

    /// Feed one frame's MAR observed at `now` (seconds)
    pub fn update(&mut self, mar: f64, now: f64) -> Option<ConfirmedYawn> {
        match self.phase {
            MouthPhase::Closed => {
                if mar >= self.open_threshold {
                    debug!("Mouth open at {:.3}s (MAR {:.3})", now, mar);
                    self.phase = MouthPhase::Open { since: now };
                }
                None
            }
            MouthPhase::Open { since } => {
                if mar > self.close_threshold {
                    return None;
                }
                self.phase = MouthPhase::Closed;
                let duration = now - since;
                if duration < self.min_open {
                    debug!("Mouth open for {:.2}s, too short for a yawn", duration);
                    return None;
                }
                info!("Yawn confirmed (duration: {:.2}s)", duration);
                Some(ConfirmedYawn { at: now, duration })
            }
        }
    }

    pub fn phase(&self) -> MouthPhase {
        self.phase
    }

    pub fn reset(&mut self) {
        self.phase = MouthPhase::Closed;
    }
}
