use std::path::Path;

use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::Frame;
use crate::video::domain::image_writer::ImageWriter;

/// Outline color for annotated RGB frames.
const BOX_COLOR: [u8; 3] = [0, 255, 0];

/// Detections found on one frame, together with the frame itself.
#[derive(Clone, Debug)]
pub struct DetectionResult {
    pub frame: Frame,
    pub frame_index: usize,
    pub boxes: Vec<BoundingBox>,
}

impl DetectionResult {
    pub fn new(frame: Frame, boxes: Vec<BoundingBox>) -> Self {
        Self {
            frame_index: frame.index(),
            frame,
            boxes,
        }
    }

    /// Copy of the frame with every box drawn as a one-pixel outline.
    pub fn annotated(&self) -> Frame {
        let width = self.frame.width();
        let height = self.frame.height();
        let channels = self.frame.channels() as usize;
        let mut data = self.frame.data().to_vec();

        if width == 0 || height == 0 {
            return self.frame.clone();
        }

        let mut paint = |x: usize, y: usize| {
            let offset = (y * width as usize + x) * channels;
            if channels >= 3 {
                data[offset..offset + 3].copy_from_slice(&BOX_COLOR);
            } else {
                data[offset..offset + channels].fill(255);
            }
        };

        for bbox in &self.boxes {
            let b = bbox.clamped(width, height);
            let x1 = (b.x1 as usize).min(width as usize - 1);
            let y1 = (b.y1 as usize).min(height as usize - 1);
            let x2 = (b.x2 as usize).min(width as usize - 1);
            let y2 = (b.y2 as usize).min(height as usize - 1);
            for x in x1..=x2 {
                paint(x, y1);
                paint(x, y2);
            }
            for y in y1..=y2 {
                paint(x1, y);
                paint(x2, y);
            }
        }

        Frame::new(
            data,
            width,
            height,
            self.frame.channels(),
            self.frame.index(),
        )
    }

    /// Writes the annotated frame to `path`.
    pub fn save(&self, writer: &dyn ImageWriter, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        writer.write(path, &self.annotated())
    }
}
