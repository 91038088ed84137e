use std::path::PathBuf;

use crate::shared::frame::Frame;

/// Persists annotated frames leaving the pipeline.
pub trait FrameWriter: Send {
    /// Writes one frame and returns where it went.
    fn write(&mut self, frame: &Frame) -> Result<PathBuf, Box<dyn std::error::Error>>;
}
