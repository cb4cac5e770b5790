use ndarray::{s, ArrayView3};

use crate::shared::crop_window::{CropError, CropWindow};

/// One decoded video frame: contiguous bytes in row-major `H x W x C` order.
///
/// `index` is the position of this frame in its stream (0-based). Frames are
/// handed to the caller by value; readers keep no reference once yielded.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
    index: usize,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            channels,
            index,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// `(height, width, channels)`, matching [`Frame::as_ndarray`].
    pub fn shape(&self) -> (usize, usize, usize) {
        (
            self.height as usize,
            self.width as usize,
            self.channels as usize,
        )
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("Frame data length must match dimensions")
    }

    /// Copies a single channel of the whole frame into a 1-channel frame.
    pub fn select_channel(&self, channel: u8) -> Result<Frame, CropError> {
        if channel >= self.channels {
            return Err(CropError::InvalidChannel {
                channel,
                channels: self.channels,
            });
        }
        let plane = self.as_ndarray().slice_move(s![.., .., channel as usize]);
        Ok(Frame::new(
            plane.iter().copied().collect(),
            self.width,
            self.height,
            1,
            self.index,
        ))
    }

    /// Copies the part of the frame covered by `window`.
    ///
    /// The window is clipped to the frame bounds. With `channel` set, only
    /// that channel is kept and the result is single-channel.
    pub fn crop(&self, window: &CropWindow, channel: Option<u8>) -> Result<Frame, CropError> {
        if let Some(c) = channel {
            if c >= self.channels {
                return Err(CropError::InvalidChannel {
                    channel: c,
                    channels: self.channels,
                });
            }
        }

        let (x1, y1, x2, y2) = window
            .clip(self.width, self.height)
            .ok_or(CropError::OutsideFrame {
                width: self.width,
                height: self.height,
            })?;

        let view = self.as_ndarray();
        let (data, channels) = match channel {
            Some(c) => {
                let plane = view.slice(s![y1..y2, x1..x2, c as usize]);
                (plane.iter().copied().collect::<Vec<u8>>(), 1)
            }
            None => {
                let block = view.slice(s![y1..y2, x1..x2, ..]);
                (block.iter().copied().collect::<Vec<u8>>(), self.channels)
            }
        };

        Ok(Frame::new(
            data,
            (x2 - x1) as u32,
            (y2 - y1) as u32,
            channels,
            self.index,
        ))
    }
}
