//! Recorded landmark sessions
//!
//! A recording is JSON lines, one line per frame:
//!
//! ```text
//! {"faces":[{"bbox":{"x":10,"y":20,"width":120,"height":150},"points":[[x,y], ...68 points]}]}
//! {"faces":[]}
//! ```
//!
//! An empty `faces` list is a frame without a face. Blank lines are skipped.

use camera_capture::VideoFrame;
use serde::Deserialize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::info;

use crate::detector::{select_largest, FaceBbox, FaceLandmarks, GeometryExtractor, Point};
use crate::DmsError;

#[derive(Debug, Deserialize)]
struct RecordedFrame {
    #[serde(default)]
    faces: Vec<RecordedFace>,
}

#[derive(Debug, Deserialize)]
struct RecordedFace {
    bbox: FaceBbox,
    points: Vec<[f64; 2]>,
}

/// Geometry extractor replaying a recording, indexed by frame sequence
#[derive(Debug, Clone)]
pub struct LandmarkReplay {
    frames: Vec<Option<FaceLandmarks>>,
}

impl LandmarkReplay {
    /// Load a recording file
    pub fn open<P: AsRef<Path>>(path: P, max_faces: usize) -> Result<Self, DmsError> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| DmsError::Recording(format!("{}: {}", path.display(), e)))?;
        let replay = Self::from_reader(BufReader::new(file), max_faces)?;
        info!("Loaded {} recorded frames from {}", replay.len(), path.display());
        Ok(replay)
    }

    /// Parse a recording; of several faces on a line, the largest is kept
    pub fn from_reader<R: BufRead>(reader: R, max_faces: usize) -> Result<Self, DmsError> {
        let mut frames = Vec::new();
        for (index, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| DmsError::Recording(e.to_string()))?;
            if line.trim().is_empty() {
                continue;
            }
            let recorded: RecordedFrame = serde_json::from_str(&line)
                .map_err(|e| DmsError::Recording(format!("line {}: {}", index + 1, e)))?;

            let candidates = recorded
                .faces
                .into_iter()
                .map(|face| (face.bbox, face.points))
                .collect();
            let landmarks = match select_largest(candidates, max_faces.max(1)).into_iter().next() {
                Some((_, points)) => {
                    let points: Vec<Point> = points.into_iter().map(Point::from).collect();
                    Some(FaceLandmarks::from_68(&points).map_err(|_| {
                        DmsError::Recording(format!(
                            "line {}: expected 68 points, got {}",
                            index + 1,
                            points.len()
                        ))
                    })?)
                }
                None => None,
            };
            frames.push(landmarks);
        }
        Ok(Self { frames })
    }

    /// Number of recorded frames
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl GeometryExtractor for LandmarkReplay {
    fn extract(&mut self, frame: &VideoFrame) -> Result<Option<FaceLandmarks>, DmsError> {
        let index = usize::try_from(frame.sequence).unwrap_or(usize::MAX);
        Ok(self.frames.get(index).cloned().flatten())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};

    fn face_line(width: f64, offset: f64) -> String {
        let points: Vec<[f64; 2]> = (0..68).map(|i| [i as f64 + offset, 1.0]).collect();
        serde_json::json!({
            "bbox": {"x": 0.0, "y": 0.0, "width": width, "height": width},
            "points": points,
        })
        .to_string()
    }

    #[test]
    fn test_replay_indexes_by_sequence() {
        let text = format!(
            "{{\"faces\":[{}]}}\n\n{{\"faces\":[]}}\n",
            face_line(100.0, 0.0)
        );
        let mut replay = LandmarkReplay::from_reader(Cursor::new(text), 1).unwrap();
        assert_eq!(replay.len(), 2);

        let first = replay.extract(&VideoFrame::blank(0, 0, 0, 0)).unwrap();
        assert_eq!(first.unwrap().mouth[0].x, 48.0);
        assert!(replay.extract(&VideoFrame::blank(0, 0, 1, 1)).unwrap().is_none());
        // Past the end of the recording
        assert!(replay.extract(&VideoFrame::blank(0, 0, 2, 7)).unwrap().is_none());
    }

    #[test]
    fn test_replay_picks_largest_face() {
        let text = format!(
            "{{\"faces\":[{},{}]}}\n",
            face_line(50.0, 1000.0),
            face_line(200.0, 0.0)
        );
        let mut replay = LandmarkReplay::from_reader(Cursor::new(text), 1).unwrap();
        let landmarks = replay.extract(&VideoFrame::default()).unwrap().unwrap();
        assert_eq!(landmarks.left_eye[0].x, 42.0);
    }

    #[test]
    fn test_replay_rejects_bad_lines() {
        let err = LandmarkReplay::from_reader(Cursor::new("not json\n"), 1).unwrap_err();
        assert!(matches!(err, DmsError::Recording(_)));

        let short = r#"{"faces":[{"bbox":{"x":0,"y":0,"width":1,"height":1},"points":[[0,0]]}]}"#;
        let err = LandmarkReplay::from_reader(Cursor::new(short), 1).unwrap_err();
        assert!(err.to_string().contains("expected 68 points"));
    }

    #[test]
    fn test_open_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{{\"faces\":[{}]}}", face_line(10.0, 0.0)).unwrap();
        writeln!(file, "{{}}").unwrap();

        let replay = LandmarkReplay::open(file.path(), 1).unwrap();
        assert_eq!(replay.len(), 2);
        assert!(LandmarkReplay::open("/nonexistent/recording.jsonl", 1).is_err());
    }
}
