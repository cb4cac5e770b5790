use crate::shared::frame::Frame;

/// Result of one [`FrameReader::next`](super::frame_reader::FrameReader::next) call.
///
/// Positions use the post-read convention: `position` is the source cursor
/// *after* the read attempt, i.e. the index of the frame that would be read
/// next. For a decoded frame that is `frame.index() + 1`. A frame that stalls
/// reports the same position on every `NotReady` as on its eventual `Decoded`.
#[derive(Debug)]
pub enum ReadOutcome {
    Decoded { frame: Frame, position: usize },
    /// The frame could not be decoded yet; the cursor was rewound so the
    /// next call retries it.
    NotReady { position: usize },
    EndOfStream,
}

impl ReadOutcome {
    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, ReadOutcome::EndOfStream)
    }
}
