use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::detection::domain::face_detector::{CandidateProposer, FaceCandidate, FaceDetector};
use crate::shared::frame::Frame;

/// Replays pre-computed detection results by frame index.
///
/// Stands in for the inference engine when replaying recorded sessions:
/// frames absent from the script yield no candidates.
pub struct ScriptedFaceDetector {
    script: Arc<HashMap<usize, Vec<FaceCandidate>>>,
}

impl ScriptedFaceDetector {
    pub fn new(script: Arc<HashMap<usize, Vec<FaceCandidate>>>) -> Self {
        Self { script }
    }

    /// Loads a JSON object mapping frame index to a list of candidates.
    pub fn from_json_file(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn from_json(json: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let raw: HashMap<String, Vec<FaceCandidate>> = serde_json::from_str(json)?;
        let mut script = HashMap::with_capacity(raw.len());
        for (key, candidates) in raw {
            let index: usize = key
                .parse()
                .map_err(|_| format!("Frame key '{key}' is not an index"))?;
            script.insert(index, candidates);
        }
        Ok(Self::new(Arc::new(script)))
    }

    fn lookup(&self, frame: &Frame) -> Vec<FaceCandidate> {
        self.script.get(&frame.index()).cloned().unwrap_or_default()
    }
}

impl FaceDetector for ScriptedFaceDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<FaceCandidate>, Box<dyn std::error::Error>> {
        Ok(self.lookup(frame))
    }
}

impl CandidateProposer for ScriptedFaceDetector {
    fn propose(&mut self, frame: &Frame) -> Result<Vec<FaceCandidate>, Box<dyn std::error::Error>> {
        Ok(self.lookup(frame))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::face_keypoints::FaceKeypoints;
    use crate::shared::geometry::BoundingBox;

    fn frame(index: usize) -> Frame {
        Frame::filled(100, 100, [0, 0, 0], index)
    }

    fn candidate(x: f64) -> FaceCandidate {
        FaceCandidate {
            bbox: BoundingBox::new(x, 20.0, x + 50.0, 70.0),
            score: 0.9,
            keypoints: FaceKeypoints::new([(x + 25.0, 40.0); 5]),
        }
    }

    #[test]
    fn test_returns_scripted_candidates_for_known_frame() {
        let script = Arc::new(HashMap::from([(0, vec![candidate(10.0), candidate(60.0)])]));
        let mut detector = ScriptedFaceDetector::new(script);
        assert_eq!(detector.detect(&frame(0)).unwrap().len(), 2);
    }

    #[test]
    fn test_returns_empty_for_unknown_frame() {
        let script = Arc::new(HashMap::from([(0, vec![candidate(10.0)])]));
        let mut detector = ScriptedFaceDetector::new(script);
        assert!(detector.detect(&frame(5)).unwrap().is_empty());
    }

    #[test]
    fn test_from_json_parses_frame_keys() {
        let json = r#"{
            "3": [{"box": {"x1": 1, "y1": 2, "x2": 41, "y2": 52},
                   "keypoints": [[10,20],[30,20],[20,30],[12,40],[28,40]]}]
        }"#;
        let mut detector = ScriptedFaceDetector::from_json(json).unwrap();
        let found = detector.propose(&frame(3)).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].score, 1.0);
        assert_eq!(found[0].bbox.x2, 41.0);
        assert_eq!(found[0].keypoints.nose(), (20.0, 30.0));
    }

    #[test]
    fn test_from_json_rejects_non_numeric_key() {
        assert!(ScriptedFaceDetector::from_json(r#"{"first": []}"#).is_err());
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("script.json");
        std::fs::write(&path, "{}").unwrap();
        let mut detector = ScriptedFaceDetector::from_json_file(&path).unwrap();
        assert!(detector.detect(&frame(0)).unwrap().is_empty());
    }
}
