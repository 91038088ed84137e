use serde::{Deserialize, Serialize};

use super::face_keypoints::FaceKeypoints;
use crate::shared::frame::Frame;
use crate::shared::geometry::BoundingBox;

/// One detected face: box, confidence and the five keypoints.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FaceCandidate {
    #[serde(rename = "box")]
    pub bbox: BoundingBox,
    #[serde(default = "full_confidence")]
    pub score: f64,
    pub keypoints: FaceKeypoints,
}

fn full_confidence() -> f64 {
    1.0
}

/// Domain interface for face detection.
///
/// Implementations may be stateful, hence `&mut self`.
pub trait FaceDetector: Send {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<FaceCandidate>, Box<dyn std::error::Error>>;
}

/// Fast first pass that proposes face candidates for a frame.
pub trait CandidateProposer: Send {
    fn propose(&mut self, frame: &Frame) -> Result<Vec<FaceCandidate>, Box<dyn std::error::Error>>;
}

/// Second pass that re-scores and re-localises proposed candidates.
pub trait CandidateRefiner: Send {
    fn refine(
        &mut self,
        frame: &Frame,
        candidates: &[FaceCandidate],
    ) -> Result<Vec<FaceCandidate>, Box<dyn std::error::Error>>;
}
