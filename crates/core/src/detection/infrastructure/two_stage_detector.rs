use serde::{Deserialize, Serialize};

use crate::detection::domain::face_detector::{
    CandidateProposer, CandidateRefiner, FaceCandidate, FaceDetector,
};
use crate::shared::frame::Frame;

/// Score / overlap / count limits applied after one detection stage.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct StageParams {
    pub score_threshold: f64,
    pub nms_threshold: f64,
    pub top_k: usize,
}

impl StageParams {
    pub fn new(score_threshold: f64, nms_threshold: f64, top_k: usize) -> Self {
        Self {
            score_threshold,
            nms_threshold,
            top_k,
        }
    }

    /// Drops low scores, suppresses overlaps (greedy, highest score first)
    /// and keeps at most `top_k` candidates.
    pub fn apply(&self, mut candidates: Vec<FaceCandidate>) -> Vec<FaceCandidate> {
        candidates.retain(|c| c.score >= self.score_threshold);
        candidates.sort_by(|a, b| b.score.total_cmp(&a.score));

        let mut kept: Vec<FaceCandidate> = Vec::with_capacity(candidates.len().min(self.top_k));
        for c in candidates {
            if kept.len() >= self.top_k {
                break;
            }
            let dominated = kept
                .iter()
                .any(|k| k.bbox.iou(&c.bbox) > self.nms_threshold);
            if !dominated {
                kept.push(c);
            }
        }
        kept
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionParams {
    pub coarse: StageParams,
    pub refine: StageParams,
}

impl Default for DetectionParams {
    fn default() -> Self {
        Self {
            coarse: StageParams::new(0.3, 0.3, 10),
            refine: StageParams::new(0.4, 0.3, 10),
        }
    }
}

/// Coarse-then-refine face detection.
///
/// The proposer generates candidates cheaply; the refiner re-scores them.
/// Each stage's output is filtered by its [`StageParams`].
pub struct TwoStageFaceDetector {
    proposer: Box<dyn CandidateProposer>,
    refiner: Box<dyn CandidateRefiner>,
    params: DetectionParams,
}

impl TwoStageFaceDetector {
    pub fn new(
        proposer: Box<dyn CandidateProposer>,
        refiner: Box<dyn CandidateRefiner>,
        params: DetectionParams,
    ) -> Self {
        Self {
            proposer,
            refiner,
            params,
        }
    }
}

impl FaceDetector for TwoStageFaceDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<FaceCandidate>, Box<dyn std::error::Error>> {
        let proposals = self.params.coarse.apply(self.proposer.propose(frame)?);
        if proposals.is_empty() {
            return Ok(proposals);
        }
        let refined = self.refiner.refine(frame, &proposals)?;
        Ok(self.params.refine.apply(refined))
    }
}

/// Refiner that accepts proposals as-is, for proposers that already emit
/// final keypoints.
pub struct PassThroughRefiner;

impl CandidateRefiner for PassThroughRefiner {
    fn refine(
        &mut self,
        _frame: &Frame,
        candidates: &[FaceCandidate],
    ) -> Result<Vec<FaceCandidate>, Box<dyn std::error::Error>> {
        Ok(candidates.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::face_keypoints::FaceKeypoints;
    use crate::shared::geometry::BoundingBox;
    use std::sync::{Arc, Mutex};

    fn candidate(x: f64, score: f64) -> FaceCandidate {
        FaceCandidate {
            bbox: BoundingBox::new(x, 10.0, x + 40.0, 50.0),
            score,
            keypoints: FaceKeypoints::new([(x + 10.0, 20.0); 5]),
        }
    }

    struct FixedProposer(Vec<FaceCandidate>);

    impl CandidateProposer for FixedProposer {
        fn propose(
            &mut self,
            _frame: &Frame,
        ) -> Result<Vec<FaceCandidate>, Box<dyn std::error::Error>> {
            Ok(self.0.clone())
        }
    }

    /// Records how many candidates it saw and lowers every score by `penalty`.
    struct PenaltyRefiner {
        seen: Arc<Mutex<Vec<usize>>>,
        penalty: f64,
    }

    impl CandidateRefiner for PenaltyRefiner {
        fn refine(
            &mut self,
            _frame: &Frame,
            candidates: &[FaceCandidate],
        ) -> Result<Vec<FaceCandidate>, Box<dyn std::error::Error>> {
            self.seen.lock().unwrap().push(candidates.len());
            Ok(candidates
                .iter()
                .cloned()
                .map(|mut c| {
                    c.score -= self.penalty;
                    c
                })
                .collect())
        }
    }

    fn frame() -> Frame {
        Frame::filled(200, 100, [0, 0, 0], 0)
    }

    #[test]
    fn test_stage_drops_low_scores() {
        let kept = StageParams::new(0.5, 0.3, 10).apply(vec![candidate(0.0, 0.4), candidate(100.0, 0.6)]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].score, 0.6);
    }

    #[test]
    fn test_stage_suppresses_overlap_keeping_best() {
        let kept = StageParams::new(0.0, 0.3, 10).apply(vec![candidate(0.0, 0.7), candidate(2.0, 0.9)]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].score, 0.9);
    }

    #[test]
    fn test_stage_limits_top_k() {
        let many = (0..5).map(|i| candidate(i as f64 * 100.0, 0.9)).collect();
        assert_eq!(StageParams::new(0.0, 0.3, 3).apply(many).len(), 3);
    }

    #[test]
    fn test_refiner_not_called_without_proposals() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut detector = TwoStageFaceDetector::new(
            Box::new(FixedProposer(vec![candidate(0.0, 0.1)])),
            Box::new(PenaltyRefiner {
                seen: seen.clone(),
                penalty: 0.0,
            }),
            DetectionParams::default(),
        );
        assert!(detector.detect(&frame()).unwrap().is_empty());
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_refine_stage_filters_with_its_own_threshold() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut detector = TwoStageFaceDetector::new(
            Box::new(FixedProposer(vec![candidate(0.0, 0.5), candidate(100.0, 0.9)])),
            Box::new(PenaltyRefiner {
                seen: seen.clone(),
                penalty: 0.2,
            }),
            DetectionParams::default(),
        );
        let result = detector.detect(&frame()).unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![2]);
        // 0.5 - 0.2 falls below the 0.4 refine threshold
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].bbox.x1, 100.0);
    }

    #[test]
    fn test_pass_through_refiner_keeps_candidates() {
        let mut detector = TwoStageFaceDetector::new(
            Box::new(FixedProposer(vec![candidate(0.0, 0.9)])),
            Box::new(PassThroughRefiner),
            DetectionParams::default(),
        );
        assert_eq!(detector.detect(&frame()).unwrap(), vec![candidate(0.0, 0.9)]);
    }
}
