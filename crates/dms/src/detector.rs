//! Facial geometry boundary
//!
//! Face detection and landmark fitting happen outside this crate. Whatever
//! provides them implements [`GeometryExtractor`] and hands back at most one
//! face per frame as [`FaceLandmarks`].

use camera_capture::VideoFrame;
use serde::{Deserialize, Serialize};

use crate::DmsError;

/// Points in the 68-landmark convention
pub const LANDMARK_COUNT: usize = 68;

const RIGHT_EYE_START: usize = 36;
const LEFT_EYE_START: usize = 42;
const MOUTH_START: usize = 48;

/// 2-D pixel position
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance
    pub fn distance(&self, other: &Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

impl From<[f64; 2]> for Point {
    fn from([x, y]: [f64; 2]) -> Self {
        Self { x, y }
    }
}

/// Face bounding box
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FaceBbox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl FaceBbox {
    pub fn area(&self) -> f64 {
        self.width.max(0.0) * self.height.max(0.0)
    }
}

/// Landmark subsets used by the ratio formulas.
///
/// Eyes are ordered p0..p5 starting at the outer corner and going clockwise;
/// the mouth is the 20-point outer + inner lip contour.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceLandmarks {
    pub left_eye: [Point; 6],
    pub right_eye: [Point; 6],
    pub mouth: [Point; 20],
}

impl FaceLandmarks {
    /// Slice the subsets out of a full 68-point fit
    pub fn from_68(points: &[Point]) -> Result<Self, DmsError> {
        if points.len() < LANDMARK_COUNT {
            return Err(DmsError::KeypointsMissing);
        }
        Ok(Self {
            left_eye: std::array::from_fn(|i| points[LEFT_EYE_START + i]),
            right_eye: std::array::from_fn(|i| points[RIGHT_EYE_START + i]),
            mouth: std::array::from_fn(|i| points[MOUTH_START + i]),
        })
    }
}

/// Keep the `max_faces` largest candidates by bounding-box area, largest first
pub fn select_largest<T>(
    mut candidates: Vec<(FaceBbox, T)>,
    max_faces: usize,
) -> Vec<(FaceBbox, T)> {
    candidates.sort_by(|a, b| b.0.area().total_cmp(&a.0.area()));
    candidates.truncate(max_faces);
    candidates
}

/// Source of per-frame facial geometry
pub trait GeometryExtractor: Send {
    /// Landmarks of the selected face, or `None` when no face is visible
    fn extract(&mut self, frame: &VideoFrame) -> Result<Option<FaceLandmarks>, DmsError>;
}
