use serde::{Deserialize, Serialize};

/// Axis-aligned face box in frame pixel coordinates, `[x1, y1]` to `[x2, y2]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl BoundingBox {
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn width(&self) -> f64 {
        (self.x2 - self.x1).max(0.0)
    }

    pub fn height(&self) -> f64 {
        (self.y2 - self.y1).max(0.0)
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    pub fn iou(&self, other: &BoundingBox) -> f64 {
        let x1 = self.x1.max(other.x1);
        let y1 = self.y1.max(other.y1);
        let x2 = self.x2.min(other.x2);
        let y2 = self.y2.min(other.y2);

        let inter = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
        if inter == 0.0 {
            return 0.0;
        }

        inter / (self.area() + other.area() - inter)
    }

    /// Pixel bounds clamped to a `width` x `height` frame, as
    /// `(left, top, right, bottom)` with inclusive right/bottom.
    /// Returns `None` when the box lies entirely outside the frame.
    pub fn clamped_pixels(&self, width: u32, height: u32) -> Option<(usize, usize, usize, usize)> {
        if width == 0 || height == 0 {
            return None;
        }
        let max_x = (width - 1) as f64;
        let max_y = (height - 1) as f64;
        if self.x2 < 0.0 || self.y2 < 0.0 || self.x1 > max_x || self.y1 > max_y {
            return None;
        }
        Some((
            self.x1.clamp(0.0, max_x) as usize,
            self.y1.clamp(0.0, max_y) as usize,
            self.x2.clamp(0.0, max_x) as usize,
            self.y2.clamp(0.0, max_y) as usize,
        ))
    }
}

/// Saturating conversion of a pixel coordinate into the 16-bit report range.
pub fn to_u16(value: f64) -> u16 {
    if value.is_nan() {
        return 0;
    }
    value.clamp(0.0, u16::MAX as f64) as u16
}
