use std::path::{Path, PathBuf};

use crate::shared::constants::IMAGE_EXTENSIONS;
use crate::shared::frame::Frame;
use crate::video::domain::frame_reader::FrameReader;

/// Treats a directory of still images as a camera stream.
///
/// Files with a known image extension are taken in file-name order and
/// decoded lazily to RGB with the `image` crate.
pub struct ImageSequenceReader {
    files: Vec<PathBuf>,
}

impl ImageSequenceReader {
    pub fn new() -> Self {
        Self { files: Vec::new() }
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }
}

impl Default for ImageSequenceReader {
    fn default() -> Self {
        Self::new()
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

fn decode(path: &Path, index: usize) -> Result<Frame, Box<dyn std::error::Error>> {
    let img = image::open(path)
        .map_err(|e| format!("Failed to decode {}: {e}", path.display()))?
        .to_rgb8();
    let (width, height) = img.dimensions();
    Ok(Frame::new(img.into_raw(), width, height, 3, index))
}

impl FrameReader for ImageSequenceReader {
    fn open(&mut self, path: &Path) -> Result<usize, Box<dyn std::error::Error>> {
        let mut files = Vec::new();
        for entry in std::fs::read_dir(path)? {
            let entry_path = entry?.path();
            if entry_path.is_file() && is_image(&entry_path) {
                files.push(entry_path);
            }
        }
        if files.is_empty() {
            return Err(format!("No image frames found in {}", path.display()).into());
        }
        files.sort();
        self.files = files;
        Ok(self.files.len())
    }

    fn frames(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_> {
        if self.files.is_empty() {
            return Box::new(std::iter::once(Err(
                "ImageSequenceReader: not opened".into()
            )));
        }
        Box::new(
            self.files
                .iter()
                .enumerate()
                .map(|(index, path)| decode(path, index)),
        )
    }

    fn close(&mut self) {
        self.files.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_image(dir: &Path, name: &str, rgb: [u8; 3]) {
        let mut img = image::RgbImage::new(8, 6);
        for pixel in img.pixels_mut() {
            *pixel = image::Rgb(rgb);
        }
        img.save(dir.join(name)).unwrap();
    }

    #[test]
    fn test_open_counts_only_images() {
        let dir = tempfile::tempdir().unwrap();
        write_image(dir.path(), "b.png", [0, 0, 0]);
        write_image(dir.path(), "a.png", [0, 0, 0]);
        std::fs::write(dir.path().join("notes.txt"), "skip me").unwrap();

        let mut reader = ImageSequenceReader::new();

        assert_eq!(reader.open(dir.path()).unwrap(), 2);
    }

    #[test]
    fn test_frames_follow_file_name_order() {
        let dir = tempfile::tempdir().unwrap();
        write_image(dir.path(), "frame_002.png", [20, 0, 0]);
        write_image(dir.path(), "frame_001.png", [10, 0, 0]);
        let mut reader = ImageSequenceReader::new();
        reader.open(dir.path()).unwrap();

        let frames: Vec<Frame> = reader.frames().map(|f| f.unwrap()).collect();

        assert_eq!(frames[0].index(), 0);
        assert_eq!(frames[0].data()[0], 10);
        assert_eq!(frames[1].index(), 1);
        assert_eq!(frames[1].data()[0], 20);
        assert_eq!((frames[1].width(), frames[1].height()), (8, 6));
        assert_eq!(frames[1].channels(), 3);
    }

    #[test]
    fn test_empty_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut reader = ImageSequenceReader::new();
        assert!(reader.open(dir.path()).is_err());
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let mut reader = ImageSequenceReader::new();
        assert!(reader.open(Path::new("/nonexistent/frames")).is_err());
    }

    #[test]
    fn test_frames_without_open_returns_error() {
        let mut reader = ImageSequenceReader::new();
        assert!(reader.frames().next().unwrap().is_err());
    }

    #[test]
    fn test_close_forgets_files() {
        let dir = tempfile::tempdir().unwrap();
        write_image(dir.path(), "a.png", [0, 0, 0]);
        let mut reader = ImageSequenceReader::new();
        reader.open(dir.path()).unwrap();
        reader.close();
        reader.close();
        assert!(reader.files().is_empty());
    }
}
