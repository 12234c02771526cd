//! DMS configuration

use serde::{Deserialize, Serialize};

use crate::DmsError;

/// Detection thresholds. Fixed for the lifetime of a [`crate::DmsModule`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DmsConfig {
    /// EAR below this counts as a closed-eye frame
    pub ear_close_threshold: f64,

    /// Margin above the close threshold the EAR must exceed to re-arm
    pub ear_hysteresis: f64,

    /// Consecutive closed frames before a prolonged closure is reported
    pub ear_consec_frames: u32,

    /// MAR at or above this opens a yawn candidate
    pub mar_open_threshold: f64,

    /// MAR at or below this closes the candidate
    pub mar_close_threshold: f64,

    /// Minimum open duration for a confirmed yawn (seconds)
    pub yawn_min_open_secs: f64,

    /// Confirmed yawns inside the window that raise a series alert
    pub yawn_series_count: usize,

    /// Sliding window for the series alert (seconds)
    pub yawn_series_window_secs: f64,

    /// Faces considered per frame (largest first)
    pub max_faces: usize,
}

impl Default for DmsConfig {
    fn default() -> Self {
        Self {
            ear_close_threshold: 0.23,
            ear_hysteresis: 0.02,
            ear_consec_frames: 12,
            mar_open_threshold: 0.70,
            mar_close_threshold: 0.55,
            yawn_min_open_secs: 0.5,
            yawn_series_count: 3,
            yawn_series_window_secs: 8.0,
            max_faces: 1,
        }
    }
}

impl DmsConfig {
    /// EAR above which a tripped eye detector re-arms
    pub fn ear_open_threshold(&self) -> f64 {
        self.ear_close_threshold + self.ear_hysteresis
    }

    /// Reject threshold combinations the detectors cannot work with
    pub fn validate(&self) -> Result<(), DmsError> {
        let positive = [
            ("ear_close_threshold", self.ear_close_threshold),
            ("ear_hysteresis", self.ear_hysteresis),
            ("mar_open_threshold", self.mar_open_threshold),
            ("mar_close_threshold", self.mar_close_threshold),
            ("yawn_series_window_secs", self.yawn_series_window_secs),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(DmsError::Config(format!("{} must be positive, got {}", name, value)));
            }
        }
        if !self.yawn_min_open_secs.is_finite() || self.yawn_min_open_secs < 0.0 {
            return Err(DmsError::Config(format!(
                "yawn_min_open_secs must not be negative, got {}",
                self.yawn_min_open_secs
            )));
        }
        if self.mar_close_threshold >= self.mar_open_threshold {
            return Err(DmsError::Config(format!(
                "mar_close_threshold ({}) must be below mar_open_threshold ({})",
                self.mar_close_threshold, self.mar_open_threshold
            )));
        }
        if self.ear_consec_frames == 0 {
            return Err(DmsError::Config("ear_consec_frames must be at least 1".into()));
        }
        if self.yawn_series_count == 0 {
            return Err(DmsError::Config("yawn_series_count must be at least 1".into()));
        }
        if self.max_faces == 0 {
            return Err(DmsError::Config("max_faces must be at least 1".into()));
        }
        Ok(())
    }
}
