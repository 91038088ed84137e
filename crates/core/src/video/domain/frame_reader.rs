use std::path::Path;

use crate::shared::frame::Frame;

/// Reads an ordered stream of frames from a capture source.
///
/// Implementations handle decoding; the pipeline only sees [`Frame`]s
/// whose `index` reflects their position in the stream.
pub trait FrameReader: Send {
    /// Opens the source and returns the number of frames it will yield.
    fn open(&mut self, path: &Path) -> Result<usize, Box<dyn std::error::Error>>;

    /// Returns an iterator over frames in capture order.
    fn frames(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_>;

    /// Releases any resources held by the reader.
    fn close(&mut self);
}
