use serde::{Deserialize, Serialize};

use crate::detection::domain::face_detector::FaceCandidate;
use crate::recognition::domain::identity_class::IdentityClass;
use crate::shared::frame::Frame;
use crate::shared::geometry::to_u16;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Validity {
    #[default]
    None = 0,
    Foe = 1,
    Friend = 2,
}

impl From<IdentityClass> for Validity {
    fn from(class: IdentityClass) -> Self {
        match class {
            IdentityClass::Foe => Validity::Foe,
            IdentityClass::Friend => Validity::Friend,
        }
    }
}

/// Per-frame location of a recognized face, emitted to the result sink.
///
/// Either fully populated from one frame's single face or entirely zero
/// with `valid == Validity::None`; never partially filled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionReport {
    pub valid: Validity,
    pub frame_w: u16,
    pub frame_h: u16,
    pub box_x: u16,
    pub box_y: u16,
    pub box_w: u16,
    pub box_h: u16,
    pub nose_x: u16,
    pub nose_y: u16,
    pub l_eye_x: u16,
    pub l_eye_y: u16,
    pub r_eye_x: u16,
    pub r_eye_y: u16,
    pub l_mouth_x: u16,
    pub l_mouth_y: u16,
    pub r_mouth_x: u16,
    pub r_mouth_y: u16,
}

impl PositionReport {
    /// The all-zero report for frames without a foe/friend outcome.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn located(class: IdentityClass, frame: &Frame, face: &FaceCandidate) -> Self {
        let kp = &face.keypoints;
        let (nose_x, nose_y) = kp.nose();
        let (l_eye_x, l_eye_y) = kp.left_eye();
        let (r_eye_x, r_eye_y) = kp.right_eye();
        let (l_mouth_x, l_mouth_y) = kp.left_mouth();
        let (r_mouth_x, r_mouth_y) = kp.right_mouth();

        Self {
            valid: class.into(),
            frame_w: to_u16(frame.width() as f64),
            frame_h: to_u16(frame.height() as f64),
            box_x: to_u16(face.bbox.x1),
            box_y: to_u16(face.bbox.y1),
            box_w: to_u16(face.bbox.x2 - face.bbox.x1),
            box_h: to_u16(face.bbox.y2 - face.bbox.y1),
            nose_x: to_u16(nose_x),
            nose_y: to_u16(nose_y),
            l_eye_x: to_u16(l_eye_x),
            l_eye_y: to_u16(l_eye_y),
            r_eye_x: to_u16(r_eye_x),
            r_eye_y: to_u16(r_eye_y),
            l_mouth_x: to_u16(l_mouth_x),
            l_mouth_y: to_u16(l_mouth_y),
            r_mouth_x: to_u16(r_mouth_x),
            r_mouth_y: to_u16(r_mouth_y),
        }
    }
}
