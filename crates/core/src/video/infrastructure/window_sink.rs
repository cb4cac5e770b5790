use crossbeam_channel::Sender;
use minifb::{Key, Window, WindowOptions};

use crate::shared::frame::Frame;
use crate::video::domain::frame_sink::FrameSink;

/// Shows frames in a desktop window for live inspection.
///
/// The window opens on the first frame. Pressing Esc or closing the window
/// sends one request on `cancel`, which the playback loop observes at its
/// next cancellation poll.
pub struct WindowSink {
    title: String,
    window: Option<Window>,
    buffer: Vec<u32>,
    cancel: Sender<()>,
    cancel_sent: bool,
}

impl WindowSink {
    pub fn new(title: impl Into<String>, cancel: Sender<()>) -> Self {
        Self {
            title: title.into(),
            window: None,
            buffer: Vec::new(),
            cancel,
            cancel_sent: false,
        }
    }

    fn open_window(&self, width: usize, height: usize) -> Result<Window, minifb::Error> {
        log::info!("Opening {width}x{height} window, press Esc to stop");
        Window::new(
            &self.title,
            width,
            height,
            WindowOptions {
                resize: true,
                ..WindowOptions::default()
            },
        )
    }

    fn request_cancel(&mut self) {
        if !self.cancel_sent {
            log::info!("Window closed or Esc pressed");
            let _ = self.cancel.send(());
            self.cancel_sent = true;
        }
    }
}

impl FrameSink for WindowSink {
    fn show(&mut self, frame: &Frame, _position: usize) -> Result<(), Box<dyn std::error::Error>> {
        pack_rgb(frame, &mut self.buffer)?;
        let (width, height) = (frame.width() as usize, frame.height() as usize);

        let window = match self.window.take() {
            Some(window) => window,
            None => self.open_window(width, height)?,
        };
        let window = self.window.insert(window);
        window.update_with_buffer(&self.buffer, width, height)?;

        if !window.is_open() || window.is_key_down(Key::Escape) {
            self.request_cancel();
        }
        Ok(())
    }
}

/// Packs a grayscale or RGB frame into `0RGB` pixels, one `u32` each.
fn pack_rgb(frame: &Frame, out: &mut Vec<u32>) -> Result<(), String> {
    out.clear();
    match frame.channels() {
        1 => out.extend(frame.data().iter().map(|&v| {
            let v = v as u32;
            (v << 16) | (v << 8) | v
        })),
        3 => out.extend(
            frame
                .data()
                .chunks_exact(3)
                .map(|px| ((px[0] as u32) << 16) | ((px[1] as u32) << 8) | px[2] as u32),
        ),
        n => return Err(format!("cannot display a {n}-channel frame")),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_rgb_frame() {
        let frame = Frame::new(vec![255, 0, 0, 0, 128, 255], 2, 1, 3, 0);
        let mut out = Vec::new();
        pack_rgb(&frame, &mut out).unwrap();
        assert_eq!(out, vec![0x00FF_0000, 0x0000_80FF]);
    }

    #[test]
    fn test_pack_gray_frame_replicates_value() {
        let frame = Frame::new(vec![0x12, 0xFF], 1, 2, 1, 0);
        let mut out = vec![7; 10];
        pack_rgb(&frame, &mut out).unwrap();
        assert_eq!(out, vec![0x0012_1212, 0x00FF_FFFF]);
    }

    #[test]
    fn test_pack_rejects_two_channels() {
        let frame = Frame::new(vec![0; 4], 2, 1, 2, 0);
        assert!(pack_rgb(&frame, &mut Vec::new()).is_err());
    }

    #[test]
    fn test_window_opens_lazily_and_cancels_once() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let mut sink = WindowSink::new("test", tx);
        assert!(sink.window.is_none());

        sink.request_cancel();
        sink.request_cancel();
        assert_eq!(rx.try_iter().count(), 1);
    }
}
