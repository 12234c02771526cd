//! Driver Monitoring System (DMS)
//!
//! Turns per-frame facial geometry into debounced drowsiness events:
//! - Eye/mouth aspect ratios from facial landmarks
//! - Prolonged eye closure (hysteresis + consecutive-frame debounce)
//! - Confirmed yawns (open/close with minimum duration)
//! - Yawn series (too many yawns inside a sliding window)
//!
//! Every event is recorded in the shared [`alerting::EventStore`].

pub mod analysis;
pub mod config;
pub mod detector;
pub mod eye;
pub mod ratio;
pub mod replay;
pub mod series;
pub mod state;
pub mod worker;
pub mod yawn;

pub use analysis::{DmsAnalysis, DmsEvent, FrameMeasurement};
pub use config::DmsConfig;
pub use detector::{select_largest, FaceBbox, FaceLandmarks, GeometryExtractor, Point};
pub use eye::EyeClosureDetector;
pub use ratio::{eye_aspect_ratio, face_ratios, mouth_aspect_ratio, FaceRatios};
pub use replay::LandmarkReplay;
pub use series::YawnSeriesAggregator;
pub use state::{DriverState, EyePhase, MouthPhase};
pub use worker::{DetectionWorker, WorkerHandle, WorkerSummary};
pub use yawn::{ConfirmedYawn, YawnDetector};

use alerting::EventStore;
use camera_capture::{CameraError, VideoFrame};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// DMS error types
#[derive(Error, Debug)]
pub enum DmsError {
    #[error("Keypoints missing for feature calculation")]
    KeypointsMissing,

    #[error("Landmark recording error: {0}")]
    Recording(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Camera error: {0}")]
    Camera(#[from] CameraError),

    #[error("Detection worker failed: {0}")]
    Worker(String),
}

/// Driver monitoring module
///
/// Owns the detector state and writes events into the shared store. Meant to
/// be driven from a single thread, one frame at a time.
pub struct DmsModule {
    eye: EyeClosureDetector,
    yawn: YawnDetector,
    series: YawnSeriesAggregator,
    store: Arc<EventStore>,
}

impl DmsModule {
    /// Create a new DMS module with configuration
    pub fn new(config: DmsConfig, store: Arc<EventStore>) -> Result<Self, DmsError> {
        config.validate()?;
        Ok(Self {
            eye: EyeClosureDetector::new(&config),
            yawn: YawnDetector::new(&config),
            series: YawnSeriesAggregator::new(&config),
            store,
        })
    }

    /// Run extraction and ratios on a frame, then process the measurement
    pub fn analyze<G>(&mut self, frame: &VideoFrame, extractor: &mut G) -> Result<DmsAnalysis, DmsError>
    where
        G: GeometryExtractor + ?Sized,
    {
        let timestamp = frame.timestamp_secs();
        let ratios = extractor.extract(frame)?.map(|landmarks| face_ratios(&landmarks));

        let measurement = match ratios {
            Some(ratios) => FrameMeasurement::from_ratios(timestamp, ratios),
            None => FrameMeasurement::no_face(timestamp),
        };

        Ok(DmsAnalysis {
            face_detected: ratios.is_some(),
            ratios,
            events: self.process(&measurement),
        })
    }

    /// Feed one measurement through every detector.
    ///
    /// A missing face re-arms the eye detector but leaves the yawn state
    /// untouched: a driver can drop out of frame mid-yawn.
    pub fn process(&mut self, measurement: &FrameMeasurement) -> Vec<DmsEvent> {
        let now = measurement.timestamp;
        let mut events = Vec::new();

        match measurement.ear {
            Some(ear) => {
                if self.eye.update(ear) {
                    events.push(DmsEvent::ProlongedEyeClosure);
                }
            }
            None if measurement.face_absent() => {
                debug!("No face at {:.3}s, resetting eye state", now);
                self.eye.reset();
            }
            None => {}
        }

        if let Some(mar) = measurement.mar {
            if let Some(yawn) = self.yawn.update(mar, now) {
                events.push(DmsEvent::YawnConfirmed {
                    duration: yawn.duration,
                });
                if let Some(count) = self.series.record(yawn.at) {
                    events.push(DmsEvent::YawnSeries { count });
                }
            }
        }

        for event in &events {
            self.store.record(event.kind(), event.label(), now);
        }
        events
    }

    /// Current state of every detector
    pub fn driver_state(&self) -> DriverState {
        DriverState {
            eye_phase: self.eye.phase(),
            consecutive_below: self.eye.consecutive_below(),
            mouth_phase: self.yawn.phase(),
            yawn_window: self.series.window(),
        }
    }

    /// Reset detector state (on driver change). Counters are kept.
    pub fn reset_state(&mut self) {
        self.eye.reset();
        self.yawn.reset();
        self.series.reset();
    }

    pub fn store(&self) -> &Arc<EventStore> {
        &self.store
    }
}
