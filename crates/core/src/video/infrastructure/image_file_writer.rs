use std::path::Path;

use crate::shared::frame::Frame;
use crate::video::domain::image_writer::ImageWriter;

/// Writes frames to image files using the `image` crate.
///
/// Single-channel frames are saved as grayscale, three-channel frames as RGB.
pub struct ImageFileWriter;

impl ImageFileWriter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ImageFileWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageWriter for ImageFileWriter {
    fn write(&self, path: &Path, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let data = frame.data().to_vec();
        match frame.channels() {
            1 => image::GrayImage::from_raw(frame.width(), frame.height(), data)
                .ok_or("Failed to create grayscale image from frame data")?
                .save(path)?,
            3 => image::RgbImage::from_raw(frame.width(), frame.height(), data)
                .ok_or("Failed to create RGB image from frame data")?
                .save(path)?,
            n => return Err(format!("Unsupported channel count for image output: {n}").into()),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_frame(width: u32, height: u32, pixel: &[u8]) -> Frame {
        let mut data = Vec::with_capacity((width * height) as usize * pixel.len());
        for _ in 0..(width * height) {
            data.extend_from_slice(pixel);
        }
        Frame::new(data, width, height, pixel.len() as u8, 0)
    }

    #[test]
    fn test_write_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.png");
        ImageFileWriter::new()
            .write(&path, &make_frame(100, 80, &[50, 100, 200]))
            .unwrap();
        assert!(path.exists());
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
    }

    #[test]
    fn test_rgb_roundtrip_preserves_pixels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.png");
        ImageFileWriter::new()
            .write(&path, &make_frame(50, 50, &[50, 100, 200]))
            .unwrap();

        let img = image::open(&path).unwrap().to_rgb8();
        assert_eq!(img.dimensions(), (50, 50));
        assert_eq!(img.get_pixel(0, 0).0, [50, 100, 200]);
    }

    #[test]
    fn test_grayscale_frame_written_as_luma() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("crop.png");
        ImageFileWriter::new()
            .write(&path, &make_frame(20, 10, &[77]))
            .unwrap();

        let img = image::open(&path).unwrap().to_luma8();
        assert_eq!(img.dimensions(), (20, 10));
        assert_eq!(img.get_pixel(5, 5).0, [77]);
    }

    #[test]
    fn test_creates_missing_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deeper/out.png");
        ImageFileWriter::new()
            .write(&path, &make_frame(4, 4, &[1, 2, 3]))
            .unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_unsupported_channel_count_returns_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.png");
        let result = ImageFileWriter::new().write(&path, &make_frame(4, 4, &[1, 2]));
        assert!(result.is_err());
    }
}
