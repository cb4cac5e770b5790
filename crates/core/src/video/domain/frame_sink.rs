use crate::shared::frame::Frame;

/// Display surface for frames pulled by a playback loop.
///
/// `position` follows the reader's post-read convention: it is the index of
/// the frame after `frame`. Sinks may own a window and stay on the thread
/// that created them.
pub trait FrameSink {
    fn show(&mut self, frame: &Frame, position: usize) -> Result<(), Box<dyn std::error::Error>>;
}
