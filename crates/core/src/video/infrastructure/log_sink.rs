use crate::shared::frame::Frame;
use crate::video::domain::frame_sink::FrameSink;

/// Headless sink: logs the shape of every frame it is shown.
#[derive(Default)]
pub struct LogSink {
    shown: usize,
}

impl LogSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shown(&self) -> usize {
        self.shown
    }
}

impl FrameSink for LogSink {
    fn show(&mut self, frame: &Frame, position: usize) -> Result<(), Box<dyn std::error::Error>> {
        let (h, w, c) = frame.shape();
        log::info!("Frame {} shape ({h}, {w}, {c}), position {position}", frame.index());
        self.shown += 1;
        Ok(())
    }
}
