//! Eye and mouth aspect ratios

use serde::{Deserialize, Serialize};

use crate::detector::{FaceLandmarks, Point};

/// Keeps the ratios finite on degenerate geometry
pub const RATIO_EPSILON: f64 = 1e-6;

/// Ratios computed from one face
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FaceRatios {
    /// Mean eye-aspect-ratio of both eyes; lower = more closed
    pub ear: f64,
    /// Mouth-aspect-ratio; higher = more open
    pub mar: f64,
}

/// EAR = (|p1-p5| + |p2-p4|) / (2 * |p0-p3|)
pub fn eye_aspect_ratio(eye: &[Point; 6]) -> f64 {
    let vertical = eye[1].distance(&eye[5]) + eye[2].distance(&eye[4]);
    let horizontal = eye[0].distance(&eye[3]);
    vertical / (2.0 * horizontal + RATIO_EPSILON)
}

/// MAR over the 20-point lip contour: two vertical lip gaps over the
/// corner-to-corner width
pub fn mouth_aspect_ratio(mouth: &[Point; 20]) -> f64 {
    let vertical = mouth[2].distance(&mouth[10]) + mouth[4].distance(&mouth[8]);
    let horizontal = mouth[0].distance(&mouth[6]);
    vertical / (2.0 * horizontal + RATIO_EPSILON)
}

pub fn face_ratios(landmarks: &FaceLandmarks) -> FaceRatios {
    let ear = (eye_aspect_ratio(&landmarks.left_eye) + eye_aspect_ratio(&landmarks.right_eye)) / 2.0;
    FaceRatios {
        ear,
        mar: mouth_aspect_ratio(&landmarks.mouth),
    }
}
