use std::path::{Path, PathBuf};

use crate::shared::frame::Frame;
use crate::video::domain::frame_writer::FrameWriter;

/// Writes each frame to `<dir>/frame_<index>.png` using the `image` crate.
pub struct ImageSequenceWriter {
    dir: PathBuf,
}

impl ImageSequenceWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, frame: &Frame) -> PathBuf {
        self.dir.join(format!("frame_{:06}.png", frame.index()))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl FrameWriter for ImageSequenceWriter {
    fn write(&mut self, frame: &Frame) -> Result<PathBuf, Box<dyn std::error::Error>> {
        if frame.channels() != 3 {
            return Err(format!("Expected an RGB frame, got {} channels", frame.channels()).into());
        }
        std::fs::create_dir_all(&self.dir)?;

        let img = image::RgbImage::from_raw(frame.width(), frame.height(), frame.data().to_vec())
            .ok_or("Failed to create image from frame data")?;
        let path = self.path_for(frame);
        img.save(&path)?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_creates_indexed_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = ImageSequenceWriter::new(dir.path().join("out"));

        let path = writer.write(&Frame::filled(12, 10, [1, 2, 3], 42)).unwrap();

        assert_eq!(path, dir.path().join("out").join("frame_000042.png"));
        assert!(path.exists());
    }

    #[test]
    fn test_written_pixels_survive_reload() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = ImageSequenceWriter::new(dir.path());

        let path = writer.write(&Frame::filled(5, 5, [50, 100, 200], 0)).unwrap();

        let img = image::open(&path).unwrap().to_rgb8();
        assert_eq!(img.dimensions(), (5, 5));
        assert_eq!(img.get_pixel(4, 4).0, [50, 100, 200]);
    }

    #[test]
    fn test_non_rgb_frame_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = ImageSequenceWriter::new(dir.path());
        let gray = Frame::new(vec![0; 16], 4, 4, 1, 0);
        assert!(writer.write(&gray).is_err());
    }
}
