use crate::annotation::domain::frame_annotator::OverlayColor;
use crate::recognition::domain::face_recognizer::RecognitionOutcome;
use crate::recognition::domain::identity_class::IdentityClass;

/// Status line describing the last recognizer action.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OverlayMessage {
    pub color: OverlayColor,
    pub text: String,
}

impl OverlayMessage {
    pub fn deleted(remaining: usize) -> Self {
        Self {
            color: OverlayColor::Red,
            text: format!("{remaining} IDs left"),
        }
    }

    pub fn recognized(outcome: &RecognitionOutcome) -> Self {
        if !outcome.is_match() {
            return Self {
                color: OverlayColor::Red,
                text: "who ?".to_string(),
            };
        }
        let class = match outcome.matched_class() {
            Some(class) => class.to_string(),
            None => outcome.label.clone(),
        };
        Self {
            color: OverlayColor::Green,
            text: format!("ID {}, {class}", outcome.id),
        }
    }

    pub fn enrolled(class: IdentityClass, id: i32) -> Self {
        Self {
            color: OverlayColor::Blue,
            text: format!("Enroll {class}: ID {id}"),
        }
    }
}

/// Frame-count timer for the action overlay.
///
/// A message is shown on the frame that sets it and on the following
/// `hold_frames` frames, then clears by itself.
pub struct OverlayTimer {
    message: Option<OverlayMessage>,
    shown: usize,
    hold_frames: usize,
}

impl OverlayTimer {
    pub fn new(hold_frames: usize) -> Self {
        Self {
            message: None,
            shown: 0,
            hold_frames,
        }
    }

    /// Replaces the current message and restarts the count.
    pub fn set(&mut self, message: OverlayMessage) {
        self.message = Some(message);
        self.shown = 0;
    }

    pub fn current(&self) -> Option<&OverlayMessage> {
        self.message.as_ref()
    }

    /// Counts one rendered frame; clears once the hold period has elapsed.
    pub fn advance(&mut self) {
        if self.message.is_none() {
            return;
        }
        self.shown += 1;
        if self.shown > self.hold_frames {
            self.message = None;
            self.shown = 0;
        }
    }
}
