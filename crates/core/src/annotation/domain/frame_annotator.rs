use crate::detection::domain::face_detector::FaceCandidate;
use crate::shared::frame::Frame;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OverlayColor {
    Red,
    Green,
    Blue,
}

impl OverlayColor {
    pub fn rgb(self) -> [u8; 3] {
        match self {
            OverlayColor::Red => [255, 0, 0],
            OverlayColor::Green => [0, 255, 0],
            OverlayColor::Blue => [0, 0, 255],
        }
    }
}

/// Domain interface for drawing on frames in place.
pub trait FrameAnnotator: Send {
    /// Prints one line of status text centred along the top of the frame.
    fn print_text(
        &self,
        frame: &mut Frame,
        color: OverlayColor,
        text: &str,
    ) -> Result<(), Box<dyn std::error::Error>>;

    /// Outlines every candidate box and marks its keypoints.
    fn draw_detections(
        &self,
        frame: &mut Frame,
        candidates: &[FaceCandidate],
    ) -> Result<(), Box<dyn std::error::Error>>;
}
