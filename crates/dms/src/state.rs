//! Detector state types

use serde::{Deserialize, Serialize};

/// Eye closure detector phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EyePhase {
    /// Counting closed frames toward a new episode
    #[default]
    Armed,
    /// Episode reported; waiting for the eyes to open past the hysteresis band
    Tripped,
}

/// Yawn detector phase
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum MouthPhase {
    #[default]
    Closed,
    /// Mouth opened at `since` (seconds)
    Open { since: f64 },
}

impl MouthPhase {
    pub fn is_open(&self) -> bool {
        matches!(self, MouthPhase::Open { .. })
    }
}

/// Read-only view of all detector state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DriverState {
    pub eye_phase: EyePhase,
    /// Consecutive closed frames counted while armed
    pub consecutive_below: u32,
    pub mouth_phase: MouthPhase,
    /// Confirmed-yawn timestamps inside the series window, oldest first
    pub yawn_window: Vec<f64>,
}

impl DriverState {
    /// Whether a closure episode has been reported and not yet cleared
    pub fn episode_active(&self) -> bool {
        self.eye_phase == EyePhase::Tripped
    }
}
