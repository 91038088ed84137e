//! 5-point face keypoints as produced by the refine stage of detection.
//!
//! Order is fixed: left eye, right eye, nose, left mouth corner, right
//! mouth corner.

use serde::{Deserialize, Serialize};

pub const LEFT_EYE: usize = 0;
pub const RIGHT_EYE: usize = 1;
pub const NOSE: usize = 2;
pub const LEFT_MOUTH: usize = 3;
pub const RIGHT_MOUTH: usize = 4;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FaceKeypoints {
    points: [(f64, f64); 5],
}

impl FaceKeypoints {
    pub fn new(points: [(f64, f64); 5]) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[(f64, f64); 5] {
        &self.points
    }

    pub fn left_eye(&self) -> (f64, f64) {
        self.points[LEFT_EYE]
    }

    pub fn right_eye(&self) -> (f64, f64) {
        self.points[RIGHT_EYE]
    }

    pub fn nose(&self) -> (f64, f64) {
        self.points[NOSE]
    }

    pub fn left_mouth(&self) -> (f64, f64) {
        self.points[LEFT_MOUTH]
    }

    pub fn right_mouth(&self) -> (f64, f64) {
        self.points[RIGHT_MOUTH]
    }

    pub fn eye_midpoint(&self) -> (f64, f64) {
        let (lx, ly) = self.left_eye();
        let (rx, ry) = self.right_eye();
        ((lx + rx) / 2.0, (ly + ry) / 2.0)
    }

    /// Euclidean distance between the eyes.
    pub fn eye_span(&self) -> f64 {
        let (lx, ly) = self.left_eye();
        let (rx, ry) = self.right_eye();
        ((rx - lx).powi(2) + (ry - ly).powi(2)).sqrt()
    }
}
