//! DMS measurements, events and per-frame results

use alerting::AlertKind;
use serde::{Deserialize, Serialize};

use crate::ratio::FaceRatios;

/// Ratios observed on one frame; both absent when no face was found
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameMeasurement {
    /// Seconds on the worker clock
    pub timestamp: f64,
    pub ear: Option<f64>,
    pub mar: Option<f64>,
}

impl FrameMeasurement {
    pub fn new(timestamp: f64, ear: f64, mar: f64) -> Self {
        Self {
            timestamp,
            ear: Some(ear),
            mar: Some(mar),
        }
    }

    pub fn from_ratios(timestamp: f64, ratios: FaceRatios) -> Self {
        Self::new(timestamp, ratios.ear, ratios.mar)
    }

    pub fn no_face(timestamp: f64) -> Self {
        Self {
            timestamp,
            ear: None,
            mar: None,
        }
    }

    pub fn face_absent(&self) -> bool {
        self.ear.is_none() && self.mar.is_none()
    }
}

/// Discrete events raised by the engine
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DmsEvent {
    /// Eyes stayed closed for the configured number of frames
    ProlongedEyeClosure,

    /// Mouth stayed open long enough to count as a yawn
    YawnConfirmed { duration: f64 },

    /// Too many yawns inside the series window
    YawnSeries { count: usize },
}

impl DmsEvent {
    /// Label shown on the dashboard
    pub fn label(&self) -> &'static str {
        match self {
            DmsEvent::ProlongedEyeClosure => "Prolonged eye closure",
            DmsEvent::YawnConfirmed { .. } => "Yawn confirmed",
            DmsEvent::YawnSeries { .. } => "Too many yawns in a short time",
        }
    }

    pub fn kind(&self) -> AlertKind {
        match self {
            DmsEvent::ProlongedEyeClosure => AlertKind::EyeClosure,
            DmsEvent::YawnConfirmed { .. } => AlertKind::Yawn,
            DmsEvent::YawnSeries { .. } => AlertKind::YawnSeries,
        }
    }
}

/// Result of analyzing one frame
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DmsAnalysis {
    /// Whether a face was detected
    pub face_detected: bool,

    /// Ratios of the selected face
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ratios: Option<FaceRatios>,

    /// Events raised on this frame, in occurrence order
    pub events: Vec<DmsEvent>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_face_measurement() {
        let m = FrameMeasurement::no_face(1.0);
        assert!(m.face_absent());
        assert!(!FrameMeasurement::new(1.0, 0.3, 0.2).face_absent());
    }

    #[test]
    fn test_event_kinds() {
        assert_eq!(DmsEvent::ProlongedEyeClosure.kind(), AlertKind::EyeClosure);
        assert_eq!(DmsEvent::YawnConfirmed { duration: 0.6 }.kind(), AlertKind::Yawn);
        assert_eq!(DmsEvent::YawnSeries { count: 3 }.kind(), AlertKind::YawnSeries);
    }
}
