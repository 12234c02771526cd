//! Paced frame source

use std::time::Instant;
use tracing::{debug, info};

use crate::{CameraConfig, CameraError, FrameSource, VideoFrame};

/// Emits blank frames at the configured FPS.
///
/// Timestamps are monotonic nanoseconds since the source was created. Used to
/// drive landmark replays, where geometry comes from a recording keyed by
/// frame sequence instead of from pixels.
pub struct PacedSource {
    config: CameraConfig,
    started: Instant,
    next_due: Instant,
    sequence: u64,
    paced: bool,
}

impl PacedSource {
    /// Create a real-time paced source
    pub fn new(config: CameraConfig) -> Self {
        info!(
            "Paced source: {}x{} @ {} fps, max_frames={:?}",
            config.width, config.height, config.fps, config.max_frames
        );
        let now = Instant::now();
        Self {
            config,
            started: now,
            next_due: now,
            sequence: 0,
            paced: true,
        }
    }

    /// Create a source that never sleeps; timestamps still advance one frame
    /// interval per frame
    pub fn unpaced(config: CameraConfig) -> Self {
        Self {
            paced: false,
            ..Self::new(config)
        }
    }
}

impl FrameSource for PacedSource {
    fn next_frame(&mut self) -> Result<Option<VideoFrame>, CameraError> {
        if let Some(max) = self.config.max_frames {
            if self.sequence >= max {
                debug!("Paced source exhausted after {} frames", self.sequence);
                return Ok(None);
            }
        }

        let interval = self.config.frame_interval();
        let timestamp_ns = if self.paced {
            let now = Instant::now();
            if self.next_due > now {
                std::thread::sleep(self.next_due - now);
            }
            self.next_due += interval;
            self.started.elapsed().as_nanos() as u64
        } else {
            self.sequence * interval.as_nanos() as u64
        };

        let frame = VideoFrame::blank(
            self.config.width,
            self.config.height,
            timestamp_ns,
            self.sequence,
        );
        self.sequence += 1;
        Ok(Some(frame))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unpaced_source_stops_at_max_frames() {
        let mut source = PacedSource::unpaced(CameraConfig {
            fps: 10,
            max_frames: Some(3),
            ..Default::default()
        });

        let mut sequences = Vec::new();
        while let Some(frame) = source.next_frame().unwrap() {
            sequences.push((frame.sequence, frame.timestamp_ns));
        }

        assert_eq!(
            sequences,
            vec![(0, 0), (1, 100_000_000), (2, 200_000_000)]
        );
        assert!(source.next_frame().unwrap().is_none());
    }

    #[test]
    fn test_paced_source_timestamps_increase() {
        let mut source = PacedSource::new(CameraConfig {
            fps: 200,
            max_frames: Some(3),
            ..Default::default()
        });

        let mut last = None;
        while let Some(frame) = source.next_frame().unwrap() {
            if let Some(prev) = last {
                assert!(frame.timestamp_ns > prev);
            }
            last = Some(frame.timestamp_ns);
        }
    }
}
