use crate::annotation::domain::frame_annotator::{FrameAnnotator, OverlayColor};
use crate::detection::domain::face_detector::FaceCandidate;
use crate::shared::constants::{GLYPH_ADVANCE, OVERLAY_TEXT_ROW};
use crate::shared::frame::Frame;
use crate::shared::geometry::BoundingBox;

const GLYPH_WIDTH: u32 = 10;
const GLYPH_HEIGHT: u32 = 14;
const KEYPOINT_RADIUS: f64 = 2.0;
const BOX_COLOR: [u8; 3] = [0, 255, 0];
const KEYPOINT_COLOR: [u8; 3] = [255, 0, 0];

/// Draws annotations directly into RGB frame memory.
///
/// Text is rendered as solid glyph cells on a fixed advance, enough to
/// mark the overlay line without a font rasteriser.
pub struct CpuFrameAnnotator;

impl CpuFrameAnnotator {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CpuFrameAnnotator {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameAnnotator for CpuFrameAnnotator {
    fn print_text(
        &self,
        frame: &mut Frame,
        color: OverlayColor,
        text: &str,
    ) -> Result<(), Box<dyn std::error::Error>> {
        check_rgb(frame)?;
        let glyphs = text.chars().count() as u32;
        let start_x = frame.width().saturating_sub(glyphs * GLYPH_ADVANCE) / 2;
        let rgb = color.rgb();

        for (i, ch) in text.chars().enumerate() {
            if ch.is_whitespace() {
                continue;
            }
            let x = (start_x + i as u32 * GLYPH_ADVANCE) as f64;
            let y = OVERLAY_TEXT_ROW as f64;
            let cell = BoundingBox::new(
                x,
                y,
                x + (GLYPH_WIDTH - 1) as f64,
                y + (GLYPH_HEIGHT - 1) as f64,
            );
            fill_box(frame, &cell, rgb);
        }
        Ok(())
    }

    fn draw_detections(
        &self,
        frame: &mut Frame,
        candidates: &[FaceCandidate],
    ) -> Result<(), Box<dyn std::error::Error>> {
        check_rgb(frame)?;
        for c in candidates {
            outline_box(frame, &c.bbox, BOX_COLOR);
            for &(x, y) in c.keypoints.points() {
                let dot = BoundingBox::new(
                    x - KEYPOINT_RADIUS,
                    y - KEYPOINT_RADIUS,
                    x + KEYPOINT_RADIUS,
                    y + KEYPOINT_RADIUS,
                );
                fill_box(frame, &dot, KEYPOINT_COLOR);
            }
        }
        Ok(())
    }
}

fn check_rgb(frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
    if frame.channels() != 3 {
        return Err(format!("Expected an RGB frame, got {} channels", frame.channels()).into());
    }
    let expected = (frame.width() as usize) * (frame.height() as usize) * 3;
    if frame.data().len() != expected {
        return Err(format!(
            "Frame {} holds {} bytes, expected {expected} for {}x{}",
            frame.index(),
            frame.data().len(),
            frame.width(),
            frame.height()
        )
        .into());
    }
    Ok(())
}

fn fill_box(frame: &mut Frame, bbox: &BoundingBox, rgb: [u8; 3]) {
    let Some((left, top, right, bottom)) = bbox.clamped_pixels(frame.width(), frame.height())
    else {
        return;
    };
    let mut pixels = frame.as_ndarray_mut();
    for row in top..=bottom {
        for col in left..=right {
            for (ch, value) in rgb.iter().enumerate() {
                pixels[[row, col, ch]] = *value;
            }
        }
    }
}

fn outline_box(frame: &mut Frame, bbox: &BoundingBox, rgb: [u8; 3]) {
    let Some((left, top, right, bottom)) = bbox.clamped_pixels(frame.width(), frame.height())
    else {
        return;
    };
    let mut pixels = frame.as_ndarray_mut();
    let mut put = |row: usize, col: usize| {
        for (ch, value) in rgb.iter().enumerate() {
            pixels[[row, col, ch]] = *value;
        }
    };
    for col in left..=right {
        put(top, col);
        put(bottom, col);
    }
    for row in top..=bottom {
        put(row, left);
        put(row, right);
    }
}
