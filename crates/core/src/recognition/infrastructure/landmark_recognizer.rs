//! Recognizer that matches faces by keypoint geometry.
//!
//! The embedding places nose and mouth corners in an eye-aligned frame
//! (origin at the eye midpoint, x along the eye line, unit = eye span), so
//! it is invariant to translation, scale and in-plane rotation.

use crate::detection::domain::face_keypoints::FaceKeypoints;
use crate::recognition::domain::enrollment_store::{EnrolledIdentity, EnrollmentStore};
use crate::recognition::domain::face_recognizer::{
    FaceRecognizer, RecognitionOutcome, RecognizerError,
};
use crate::recognition::domain::identity_class::IdentityClass;
use crate::shared::frame::Frame;

pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.85;

/// Eye spans below this many pixels cannot be normalised reliably.
const MIN_EYE_SPAN: f64 = 1.0;

pub struct LandmarkRecognizer {
    store: Box<dyn EnrollmentStore>,
    identities: Vec<EnrolledIdentity>,
    threshold: f64,
}

impl LandmarkRecognizer {
    pub fn new(store: Box<dyn EnrollmentStore>, threshold: f64) -> Self {
        Self {
            store,
            identities: Vec::new(),
            threshold,
        }
    }

    fn next_id(&self) -> i32 {
        self.identities.iter().map(|i| i.id).max().unwrap_or(0) + 1
    }

    fn persist(&mut self) -> Result<(), RecognizerError> {
        self.store.save(&self.identities)?;
        Ok(())
    }
}

impl FaceRecognizer for LandmarkRecognizer {
    fn load_enrollments(&mut self) -> Result<usize, RecognizerError> {
        self.identities = self.store.load()?;
        Ok(self.identities.len())
    }

    fn enroll(
        &mut self,
        _frame: &Frame,
        keypoints: &FaceKeypoints,
        class: IdentityClass,
    ) -> Result<i32, RecognizerError> {
        let embedding = embed(keypoints)?;
        let id = self.next_id();
        self.identities.push(EnrolledIdentity {
            id,
            label: class.label().to_string(),
            embedding,
        });
        if let Err(e) = self.persist() {
            self.identities.pop();
            return Err(e);
        }
        Ok(id)
    }

    fn recognize(
        &mut self,
        _frame: &Frame,
        keypoints: &FaceKeypoints,
    ) -> Result<RecognitionOutcome, RecognizerError> {
        let probe = embed(keypoints)?;
        let best = self
            .identities
            .iter()
            .map(|identity| (identity, similarity(&probe, &identity.embedding)))
            .max_by(|a, b| a.1.total_cmp(&b.1));

        Ok(match best {
            None => RecognitionOutcome::unknown(0.0, ""),
            Some((identity, sim)) if sim >= self.threshold => RecognitionOutcome {
                id: identity.id,
                similarity: sim,
                label: identity.label.clone(),
            },
            Some((identity, sim)) => RecognitionOutcome::unknown(sim, identity.label.clone()),
        })
    }

    fn delete_all(&mut self) -> Result<usize, RecognizerError> {
        let previous = std::mem::take(&mut self.identities);
        if let Err(e) = self.persist() {
            self.identities = previous;
            return Err(e);
        }
        Ok(self.identities.len())
    }

    fn enrolled_count(&self) -> usize {
        self.identities.len()
    }
}

/// Nose and mouth corners in eye-aligned, eye-span-normalised coordinates.
fn embed(keypoints: &FaceKeypoints) -> Result<Vec<f32>, RecognizerError> {
    let span = keypoints.eye_span();
    if span < MIN_EYE_SPAN {
        return Err(RecognizerError::Rejected(format!(
            "eye span {span:.1}px too small"
        )));
    }
    let (mx, my) = keypoints.eye_midpoint();
    let (lx, ly) = keypoints.left_eye();
    let (rx, ry) = keypoints.right_eye();
    let (cos, sin) = ((rx - lx) / span, (ry - ly) / span);

    let mut embedding = Vec::with_capacity(6);
    for (px, py) in [keypoints.nose(), keypoints.left_mouth(), keypoints.right_mouth()] {
        let (dx, dy) = (px - mx, py - my);
        embedding.push(((dx * cos + dy * sin) / span) as f32);
        embedding.push(((-dx * sin + dy * cos) / span) as f32);
    }
    Ok(embedding)
}

/// `1 - euclidean distance`, clamped to `[0, 1]`.
fn similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() {
        return 0.0;
    }
    let dist = a
        .iter()
        .zip(b.iter())
        .map(|(x, y)| ((*x - *y) as f64).powi(2))
        .sum::<f64>()
        .sqrt();
    (1.0 - dist).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recognition::domain::enrollment_store::{StoreError, VolatileEnrollmentStore};
    use approx::assert_relative_eq;

    fn frame() -> Frame {
        Frame::filled(8, 8, [0, 0, 0], 0)
    }

    fn face(offset: (f64, f64), scale: f64, nose_drop: f64) -> FaceKeypoints {
        let base = [
            (-50.0, 0.0),
            (50.0, 0.0),
            (0.0, 40.0 + nose_drop),
            (-35.0, 80.0),
            (35.0, 80.0),
        ];
        FaceKeypoints::new(base.map(|(x, y)| (offset.0 + x * scale, offset.1 + y * scale)))
    }

    fn recognizer() -> LandmarkRecognizer {
        LandmarkRecognizer::new(
            Box::new(VolatileEnrollmentStore::default()),
            DEFAULT_SIMILARITY_THRESHOLD,
        )
    }

    struct FailingStore;

    impl EnrollmentStore for FailingStore {
        fn load(&mut self) -> Result<Vec<EnrolledIdentity>, StoreError> {
            Ok(Vec::new())
        }

        fn save(&mut self, _identities: &[EnrolledIdentity]) -> Result<(), StoreError> {
            Err(StoreError::Write {
                path: "/readonly".into(),
                source: std::io::Error::other("read-only"),
            })
        }
    }

    #[test]
    fn test_enroll_assigns_increasing_ids() {
        let mut r = recognizer();
        let a = r.enroll(&frame(), &face((100.0, 100.0), 1.0, 0.0), IdentityClass::Foe).unwrap();
        let b = r.enroll(&frame(), &face((100.0, 100.0), 1.0, 30.0), IdentityClass::Friend).unwrap();
        assert_eq!((a, b), (1, 2));
        assert_eq!(r.enrolled_count(), 2);
    }

    #[test]
    fn test_recognizes_same_face_moved_and_scaled() {
        let mut r = recognizer();
        r.enroll(&frame(), &face((100.0, 100.0), 1.0, 0.0), IdentityClass::Friend).unwrap();

        let outcome = r.recognize(&frame(), &face((300.0, 220.0), 1.7, 0.0)).unwrap();

        assert_eq!(outcome.id, 1);
        assert_eq!(outcome.label, "fr");
        assert_relative_eq!(outcome.similarity, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_different_geometry_is_unknown_with_attempted_label() {
        let mut r = recognizer();
        r.enroll(&frame(), &face((100.0, 100.0), 1.0, 0.0), IdentityClass::Foe).unwrap();

        let outcome = r.recognize(&frame(), &face((100.0, 100.0), 1.0, 35.0)).unwrap();

        assert!(!outcome.is_match());
        assert_eq!(outcome.label, "fo");
        assert!(outcome.similarity < DEFAULT_SIMILARITY_THRESHOLD);
    }

    #[test]
    fn test_recognize_with_empty_database_is_unknown() {
        let mut r = recognizer();
        let outcome = r.recognize(&frame(), &face((0.0, 0.0), 1.0, 0.0)).unwrap();
        assert!(!outcome.is_match());
        assert_eq!(outcome.similarity, 0.0);
    }

    #[test]
    fn test_delete_all_leaves_nothing() {
        let mut r = recognizer();
        r.enroll(&frame(), &face((100.0, 100.0), 1.0, 0.0), IdentityClass::Foe).unwrap();
        assert_eq!(r.delete_all().unwrap(), 0);
        assert_eq!(r.enrolled_count(), 0);
        // Ids restart once the database is empty.
        let id = r.enroll(&frame(), &face((100.0, 100.0), 1.0, 0.0), IdentityClass::Foe).unwrap();
        assert_eq!(id, 1);
    }

    #[test]
    fn test_degenerate_keypoints_are_rejected() {
        let mut r = recognizer();
        let collapsed = FaceKeypoints::new([(10.0, 10.0); 5]);
        assert!(matches!(
            r.enroll(&frame(), &collapsed, IdentityClass::Foe),
            Err(RecognizerError::Rejected(_))
        ));
    }

    #[test]
    fn test_load_enrollments_restores_persisted_ids() {
        let mut first = recognizer();
        first.enroll(&frame(), &face((100.0, 100.0), 1.0, 0.0), IdentityClass::Friend).unwrap();
        let saved = first.identities.clone();

        let mut store = VolatileEnrollmentStore::default();
        store.save(&saved).unwrap();
        let mut second = LandmarkRecognizer::new(Box::new(store), DEFAULT_SIMILARITY_THRESHOLD);

        assert_eq!(second.load_enrollments().unwrap(), 1);
        assert_eq!(second.recognize(&frame(), &face((5.0, 5.0), 0.5, 0.0)).unwrap().id, 1);
    }

    #[test]
    fn test_failed_save_rolls_back_enrollment() {
        let mut r = LandmarkRecognizer::new(Box::new(FailingStore), DEFAULT_SIMILARITY_THRESHOLD);
        let result = r.enroll(&frame(), &face((100.0, 100.0), 1.0, 0.0), IdentityClass::Foe);
        assert!(matches!(result, Err(RecognizerError::Store(_))));
        assert_eq!(r.enrolled_count(), 0);
    }

    /// Accepts a fixed number of saves, then fails.
    struct ExhaustedStore {
        saves_left: usize,
    }

    impl EnrollmentStore for ExhaustedStore {
        fn load(&mut self) -> Result<Vec<EnrolledIdentity>, StoreError> {
            Ok(Vec::new())
        }

        fn save(&mut self, _identities: &[EnrolledIdentity]) -> Result<(), StoreError> {
            if self.saves_left == 0 {
                return Err(StoreError::Write {
                    path: "/full".into(),
                    source: std::io::Error::other("disk full"),
                });
            }
            self.saves_left -= 1;
            Ok(())
        }
    }

    #[test]
    fn test_failed_save_keeps_identities_on_delete() {
        let mut r = LandmarkRecognizer::new(
            Box::new(ExhaustedStore { saves_left: 1 }),
            DEFAULT_SIMILARITY_THRESHOLD,
        );
        let known = face((100.0, 100.0), 1.0, 0.0);
        r.enroll(&frame(), &known, IdentityClass::Friend).unwrap();

        let result = r.delete_all();

        assert!(matches!(result, Err(RecognizerError::Store(_))));
        assert_eq!(r.enrolled_count(), 1);
        assert_eq!(r.recognize(&frame(), &known).unwrap().id, 1);
    }
}
