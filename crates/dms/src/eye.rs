//! Prolonged eye closure detection

use tracing::{debug, warn};

use crate::state::EyePhase;
use crate::DmsConfig;

/// Hysteresis + debounce state machine over per-frame EAR.
///
/// While armed, `consec_frames` consecutive frames below the close threshold
/// report one episode and trip the detector. A tripped detector only re-arms
/// once EAR rises above the open threshold, so one closure episode produces
/// exactly one event however long it lasts.
#[derive(Debug, Clone)]
pub struct EyeClosureDetector {
    close_threshold: f64,
    open_threshold: f64,
    consec_frames: u32,
    phase: EyePhase,
    consecutive_below: u32,
}

impl EyeClosureDetector {
    pub fn new(config: &DmsConfig) -> Self {
        Self {
            close_threshold: config.ear_close_threshold,
            open_threshold: config.ear_open_threshold(),
            consec_frames: config.ear_consec_frames,
            phase: EyePhase::Armed,
            consecutive_below: 0,
        }
    }

    /// Feed one frame's EAR. Returns `true` when a prolonged closure fires.
    pub fn update(&mut self, ear: f64) -> bool {
        match self.phase {
            EyePhase::Armed => {
                if ear >= self.close_threshold {
                    self.consecutive_below = 0;
                    return false;
                }
                self.consecutive_below += 1;
                if self.consecutive_below < self.consec_frames {
                    return false;
                }
                warn!("Prolonged eye closure ({} frames, EAR {:.3})", self.consecutive_below, ear);
                self.phase = EyePhase::Tripped;
                self.consecutive_below = 0;
                true
            }
            EyePhase::Tripped => {
                if ear > self.open_threshold {
                    debug!("Eyes reopened (EAR {:.3}), re-arming", ear);
                    self.phase = EyePhase::Armed;
                    self.consecutive_below = 0;
                }
                false
            }
        }
    }

    /// No face this frame: drop any partial count and re-arm
    pub fn reset(&mut self) {
        self.phase = EyePhase::Armed;
        self.consecutive_below = 0;
    }

    pub fn phase(&self) -> EyePhase {
        self.phase
    }

    pub fn consecutive_below(&self) -> u32 {
        self.consecutive_below
    }
}
