use std::path::Path;

use crate::shared::frame::Frame;

/// Persists a single frame as an image file.
///
/// Implementations accept 1-channel (grayscale) and 3-channel (RGB) frames;
/// the file format follows the path extension.
pub trait ImageWriter: Send {
    fn write(&self, path: &Path, frame: &Frame) -> Result<(), Box<dyn std::error::Error>>;
}
