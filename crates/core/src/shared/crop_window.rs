use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum CropError {
    #[error("crop window lies outside the {width}x{height} frame")]
    OutsideFrame { width: u32, height: u32 },
    #[error("channel {channel} out of range for a {channels}-channel frame")]
    InvalidChannel { channel: u8, channels: u8 },
}

/// A rectangle centered on `(center_x, center_y)` in pixel coordinates.
///
/// `center_x` is a column, `center_y` a row. The covered range is
/// `[center - size / 2, center - size / 2 + size)` on each axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropWindow {
    pub center_x: u32,
    pub center_y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropWindow {
    pub fn new(center_x: u32, center_y: u32, width: u32, height: u32) -> Self {
        Self {
            center_x,
            center_y,
            width,
            height,
        }
    }

    /// Intersects the window with a `frame_width x frame_height` frame.
    ///
    /// Returns `(x1, y1, x2, y2)` with exclusive upper bounds, or `None` if
    /// nothing of the window is visible.
    pub fn clip(&self, frame_width: u32, frame_height: u32) -> Option<(usize, usize, usize, usize)> {
        let (x1, x2) = clip_axis(self.center_x, self.width, frame_width)?;
        let (y1, y2) = clip_axis(self.center_y, self.height, frame_height)?;
        Some((x1, y1, x2, y2))
    }
}

fn clip_axis(center: u32, size: u32, limit: u32) -> Option<(usize, usize)> {
    let start = center as i64 - (size / 2) as i64;
    let end = start + size as i64;
    let lo = start.max(0);
    let hi = end.min(limit as i64);
    if lo >= hi {
        return None;
    }
    Some((lo as usize, hi as usize))
}
