//! Detection worker
//!
//! Runs capture → geometry → ratios → detectors → store on one dedicated
//! thread, and asks the broadcaster for a throttled push after every frame.

use alerting::Broadcaster;
use camera_capture::FrameSource;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::{DmsError, DmsModule, GeometryExtractor};

/// Default back-off after a failed capture (milliseconds)
pub const DEFAULT_CAPTURE_BACKOFF_MS: u64 = 50;

/// Counters describing one worker run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WorkerSummary {
    pub frames: u64,
    pub frames_with_face: u64,
    pub capture_errors: u64,
    pub extraction_errors: u64,
    pub events: u64,
}

/// Frame loop owning all detector state
pub struct DetectionWorker<S, G> {
    module: DmsModule,
    source: S,
    extractor: G,
    broadcaster: Broadcaster,
    capture_backoff: Duration,
}

impl<S, G> DetectionWorker<S, G>
where
    S: FrameSource + 'static,
    G: GeometryExtractor + 'static,
{
    pub fn new(module: DmsModule, source: S, extractor: G, broadcaster: Broadcaster) -> Self {
        Self {
            module,
            source,
            extractor,
            broadcaster,
            capture_backoff: Duration::from_millis(DEFAULT_CAPTURE_BACKOFF_MS),
        }
    }

    pub fn with_capture_backoff(mut self, backoff: Duration) -> Self {
        self.capture_backoff = backoff;
        self
    }

    /// Run until the source ends or `stop` is set
    pub fn run(&mut self, stop: &AtomicBool) -> WorkerSummary {
        info!("Detection worker started");
        let mut summary = WorkerSummary::default();

        while !stop.load(Ordering::Relaxed) {
            let frame = match self.source.next_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => {
                    info!("Frame source ended");
                    break;
                }
                Err(e) => {
                    summary.capture_errors += 1;
                    warn!("Capture failed: {}; retrying in {:?}", e, self.capture_backoff);
                    thread::sleep(self.capture_backoff);
                    continue;
                }
            };
            summary.frames += 1;

            match self.module.analyze(&frame, &mut self.extractor) {
                Ok(analysis) => {
                    if analysis.face_detected {
                        summary.frames_with_face += 1;
                    }
                    summary.events += analysis.events.len() as u64;
                    if let Some(ratios) = analysis.ratios {
                        debug!(
                            "Frame {}: EAR {:.3}, MAR {:.3}",
                            frame.sequence, ratios.ear, ratios.mar
                        );
                    }
                }
                Err(e) => {
                    summary.extraction_errors += 1;
                    warn!("Geometry extraction failed on frame {}: {}", frame.sequence, e);
                }
            }

            self.broadcaster
                .maybe_emit(self.module.store(), frame.timestamp_secs());
        }

        info!(
            "Detection worker stopped after {} frames ({} with face, {} events)",
            summary.frames, summary.frames_with_face, summary.events
        );
        summary
    }

    /// Start the loop on a dedicated thread
    pub fn spawn(mut self) -> Result<WorkerHandle, DmsError> {
        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = Arc::clone(&stop);

        let thread = thread::Builder::new()
            .name("dms-worker".into())
            .spawn(move || self.run(&thread_stop))
            .map_err(|e| DmsError::Worker(e.to_string()))?;

        Ok(WorkerHandle { stop, thread })
    }
}

/// Handle to a running detection worker
pub struct WorkerHandle {
    stop: Arc<AtomicBool>,
    thread: JoinHandle<WorkerSummary>,
}

impl WorkerHandle {
    /// Ask the worker to stop after the current frame
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    /// Wait for the worker to exit
    pub fn join(self) -> Result<WorkerSummary, DmsError> {
        self.thread.join().map_err(|_| {
            error!("Detection worker panicked");
            DmsError::Worker("worker thread panicked".into())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DmsConfig, EyePhase, FaceLandmarks, Point};
    use alerting::{EventStore, StatsCounters};
    use camera_capture::{CameraConfig, CameraError, PacedSource, VideoFrame};
    use std::collections::VecDeque;

    fn closed_eyes() -> FaceLandmarks {
        let eye = [
            Point::new(0.0, 0.0),
            Point::new(1.0, -0.1),
            Point::new(2.0, -0.1),
            Point::new(3.0, 0.0),
            Point::new(2.0, 0.1),
            Point::new(1.0, 0.1),
        ];
        FaceLandmarks {
            left_eye: eye,
            right_eye: eye,
            mouth: [Point::default(); 20],
        }
    }

    /// Closed eyes on every frame
    struct ClosedEyes;

    impl GeometryExtractor for ClosedEyes {
        fn extract(&mut self, _frame: &VideoFrame) -> Result<Option<FaceLandmarks>, DmsError> {
            Ok(Some(closed_eyes()))
        }
    }

    /// Closed eyes for the first `frames` frames, then the face leaves the shot
    struct FaceLeaves {
        frames: u64,
    }

    impl GeometryExtractor for FaceLeaves {
        fn extract(&mut self, frame: &VideoFrame) -> Result<Option<FaceLandmarks>, DmsError> {
            Ok((frame.sequence < self.frames).then(closed_eyes))
        }
    }

    /// Fails once, then yields the queued frames
    struct FlakySource {
        frames: VecDeque<VideoFrame>,
        failed: bool,
    }

    impl FrameSource for FlakySource {
        fn next_frame(&mut self) -> Result<Option<VideoFrame>, CameraError> {
            if !self.failed {
                self.failed = true;
                return Err(CameraError::Timeout);
            }
            Ok(self.frames.pop_front())
        }
    }

    fn module() -> DmsModule {
        DmsModule::new(
            DmsConfig::default(),
            Arc::new(EventStore::new(50).unwrap()),
        )
        .unwrap()
    }

    #[test]
    fn test_run_until_source_ends() {
        let source = PacedSource::unpaced(CameraConfig {
            max_frames: Some(30),
            ..Default::default()
        });
        let broadcaster = Broadcaster::new(0.5, 20, 16).unwrap();
        let mut rx = broadcaster.subscribe();
        let mut worker = DetectionWorker::new(module(), source, ClosedEyes, broadcaster);

        let summary = worker.run(&AtomicBool::new(false));
        assert_eq!(summary.frames, 30);
        assert_eq!(summary.frames_with_face, 30);
        assert_eq!(summary.events, 1);

        // 30 frames at 15 fps span ~1.93s: pushes at 0.0, 0.53, 1.07 and 1.6
        let mut pushes = Vec::new();
        while let Ok(snapshot) = rx.try_recv() {
            pushes.push(snapshot);
        }
        assert!(pushes.len() >= 3 && pushes.len() <= 5);
        assert_eq!(pushes.last().unwrap().stats.eye_closures_total, 1);
    }

    #[test]
    fn test_no_face_frames_still_push_and_rearm() {
        let source = PacedSource::unpaced(CameraConfig {
            max_frames: Some(30),
            ..Default::default()
        });
        let broadcaster = Broadcaster::new(0.5, 20, 16).unwrap();
        let mut rx = broadcaster.subscribe();
        let mut worker =
            DetectionWorker::new(module(), source, FaceLeaves { frames: 11 }, broadcaster);

        let summary = worker.run(&AtomicBool::new(false));
        assert_eq!(summary.frames, 30);
        assert_eq!(summary.frames_with_face, 11);
        assert_eq!(summary.events, 0);

        // 11 closed frames then dropout: the partial count is discarded
        let state = worker.module.driver_state();
        assert_eq!(state.eye_phase, EyePhase::Armed);
        assert_eq!(state.consecutive_below, 0);

        // Faceless frames keep the 0.5s cadence: pushes at 0.0, 0.53, 1.07 and 1.6
        let mut pushes = Vec::new();
        while let Ok(snapshot) = rx.try_recv() {
            pushes.push(snapshot);
        }
        assert_eq!(pushes.len(), 4);
        assert!(pushes.iter().all(|s| s.stats == StatsCounters::default()));
    }

    #[test]
    fn test_capture_errors_back_off_and_retry() {
        let frames = (0..3).map(|i| VideoFrame::blank(640, 480, i * 1_000_000, i)).collect();
        let source = FlakySource {
            frames,
            failed: false,
        };
        let broadcaster = Broadcaster::new(0.5, 20, 16).unwrap();
        let mut worker = DetectionWorker::new(module(), source, ClosedEyes, broadcaster)
            .with_capture_backoff(Duration::from_millis(1));

        let summary = worker.run(&AtomicBool::new(false));
        assert_eq!(summary.capture_errors, 1);
        assert_eq!(summary.frames, 3);
    }

    #[test]
    fn test_spawned_worker_stops_on_request() {
        let source = PacedSource::new(CameraConfig {
            fps: 100,
            ..Default::default()
        });
        let broadcaster = Broadcaster::new(0.5, 20, 16).unwrap();
        let handle = DetectionWorker::new(module(), source, ClosedEyes, broadcaster)
            .spawn()
            .unwrap();

        thread::sleep(Duration::from_millis(50));
        handle.stop();
        let summary = handle.join().unwrap();
        assert!(summary.frames > 0);
    }
}
