use thiserror::Error;

use super::enrollment_store::StoreError;
use super::identity_class::IdentityClass;
use crate::detection::domain::face_keypoints::FaceKeypoints;
use crate::shared::frame::Frame;

#[derive(Error, Debug)]
pub enum RecognizerError {
    #[error("enrollment persistence failed: {0}")]
    Store(#[from] StoreError),
    #[error("face rejected: {0}")]
    Rejected(String),
}

/// Result of matching one face against the enrolled identities.
///
/// `id <= 0` means no enrolled identity matched; `similarity` and `label`
/// then describe the closest attempt.
#[derive(Clone, Debug, PartialEq)]
pub struct RecognitionOutcome {
    pub id: i32,
    pub similarity: f64,
    pub label: String,
}

impl RecognitionOutcome {
    pub fn unknown(similarity: f64, label: impl Into<String>) -> Self {
        Self {
            id: -1,
            similarity,
            label: label.into(),
        }
    }

    pub fn is_match(&self) -> bool {
        self.id > 0
    }

    /// Enrolled class of a positive match.
    pub fn matched_class(&self) -> Option<IdentityClass> {
        if self.is_match() {
            IdentityClass::from_label(&self.label)
        } else {
            None
        }
    }
}

/// Domain interface for face enrollment and recognition.
pub trait FaceRecognizer: Send {
    /// Loads the persisted identity database. Returns the enrolled count.
    fn load_enrollments(&mut self) -> Result<usize, RecognizerError>;

    /// Registers the face under `class`. Returns the assigned id.
    fn enroll(
        &mut self,
        frame: &Frame,
        keypoints: &FaceKeypoints,
        class: IdentityClass,
    ) -> Result<i32, RecognizerError>;

    fn recognize(
        &mut self,
        frame: &Frame,
        keypoints: &FaceKeypoints,
    ) -> Result<RecognitionOutcome, RecognizerError>;

    /// Wipes the identity database. Returns the remaining count.
    fn delete_all(&mut self) -> Result<usize, RecognizerError>;

    fn enrolled_count(&self) -> usize;
}
