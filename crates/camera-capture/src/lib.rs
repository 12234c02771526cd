//! Camera Capture Boundary
//!
//! Frame acquisition for the drowsiness monitor. The detection worker pulls
//! frames through the [`FrameSource`] trait and never touches a device
//! directly, so recorded sessions and real cameras are interchangeable.

pub mod frame;
pub mod source;

pub use frame::VideoFrame;
pub use source::PacedSource;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Camera error types
#[derive(Error, Debug)]
pub enum CameraError {
    #[error("Capture timeout")]
    Timeout,
}

/// Anything that yields frames to the detection worker
pub trait FrameSource: Send {
    /// Read the next frame.
    ///
    /// `Ok(None)` marks the end of the stream. An `Err` is a transient
    /// capture failure; callers back off and retry.
    fn next_frame(&mut self) -> Result<Option<VideoFrame>, CameraError>;
}

/// Camera configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraConfig {
    /// Capture width
    pub width: u32,
    /// Capture height
    pub height: u32,
    /// Target FPS
    pub fps: u32,
    /// Stop after this many frames (unbounded when absent)
    #[serde(default)]
    pub max_frames: Option<u64>,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            fps: 15,
            max_frames: None,
        }
    }
}

impl CameraConfig {
    /// Interval between two frames at the target FPS
    pub fn frame_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs_f64(1.0 / self.fps.max(1) as f64)
    }
}
