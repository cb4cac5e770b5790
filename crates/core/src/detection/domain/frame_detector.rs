use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::Frame;

/// Per-frame object detection.
///
/// Implementations may keep state across frames, hence `&mut self`.
pub trait FrameDetector: Send {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<BoundingBox>, Box<dyn std::error::Error>>;
}
