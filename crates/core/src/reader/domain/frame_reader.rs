use std::time::Duration;

use crate::reader::domain::read_outcome::ReadOutcome;
use crate::reader::domain::reader_error::ReaderError;
use crate::reader::domain::retry_policy::RetryPolicy;
use crate::video::domain::video_source::VideoSource;

/// Pulls frames from an opened [`VideoSource`], absorbing transient
/// not-ready conditions.
///
/// A failed decode rewinds the source cursor by one so the same frame is
/// retried on the next call; the caller decides how long to wait in between
/// (see [`FrameReader::retry_delay`]). The reader never sleeps itself.
pub struct FrameReader {
    source: Box<dyn VideoSource>,
    policy: RetryPolicy,
    not_ready_streak: u32,
}

impl FrameReader {
    /// `source` must already be open.
    pub fn new(source: Box<dyn VideoSource>, policy: RetryPolicy) -> Self {
        Self {
            source,
            policy,
            not_ready_streak: 0,
        }
    }

    /// Reads the next frame.
    ///
    /// Returns `EndOfStream` once the cursor has reached a known frame count;
    /// further calls keep returning it without touching the source.
    pub fn next(&mut self) -> Result<ReadOutcome, ReaderError> {
        if self.is_exhausted() {
            return Ok(ReadOutcome::EndOfStream);
        }

        if let Some(frame) = self.source.read()? {
            self.not_ready_streak = 0;
            return Ok(ReadOutcome::Decoded {
                frame,
                position: self.source.position(),
            });
        }

        let position = self.source.position();
        self.source.set_position(position.saturating_sub(1))?;
        self.not_ready_streak = self.not_ready_streak.saturating_add(1);

        if !self.policy.allows(self.not_ready_streak + 1) {
            return Err(ReaderError::ReadTimeout {
                position,
                attempts: self.not_ready_streak,
            });
        }
        Ok(ReadOutcome::NotReady { position })
    }

    /// How long to wait before retrying after a `NotReady`.
    pub fn retry_delay(&self) -> Duration {
        self.policy.delay_for(self.not_ready_streak.max(1))
    }

    /// Consecutive `NotReady` outcomes for the current frame.
    pub fn not_ready_streak(&self) -> u32 {
        self.not_ready_streak
    }

    pub fn is_exhausted(&self) -> bool {
        let count = self.source.frame_count();
        count > 0 && self.source.position() >= count
    }

    pub fn position(&self) -> usize {
        self.source.position()
    }

    pub fn frame_count(&self) -> usize {
        self.source.frame_count()
    }

    pub fn close(&mut self) {
        self.source.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::path::Path;
    use std::sync::{Arc, Mutex};

    use crate::shared::frame::Frame;
    use crate::shared::video_metadata::VideoMetadata;
    use crate::video::domain::video_source::SourceError;

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum CursorEvent {
        Read { from: usize, decoded: bool },
        Seek { from: usize, to: usize },
    }

    /// Source that stalls given positions a fixed number of times and
    /// records every cursor movement.
    struct StubSource {
        frame_count: usize,
        stalls: HashMap<usize, u32>,
        position: usize,
        events: Arc<Mutex<Vec<CursorEvent>>>,
    }

    impl StubSource {
        fn new(frame_count: usize, stalls: &[(usize, u32)]) -> Self {
            Self {
                frame_count,
                stalls: stalls.iter().copied().collect(),
                position: 0,
                events: Arc::new(Mutex::new(Vec::new())),
            }
        }
    }

    impl VideoSource for StubSource {
        fn open(&mut self, _path: &Path) -> Result<VideoMetadata, SourceError> {
            unreachable!("reader expects an opened source")
        }

        fn is_open(&self) -> bool {
            true
        }

        fn read(&mut self) -> Result<Option<Frame>, SourceError> {
            let index = self.position;
            self.position += 1;
            let stalled = match self.stalls.get_mut(&index) {
                Some(n) if *n > 0 => {
                    *n -= 1;
                    true
                }
                _ => false,
            };
            self.events.lock().unwrap().push(CursorEvent::Read {
                from: index,
                decoded: !stalled,
            });
            if stalled {
                Ok(None)
            } else {
                Ok(Some(Frame::new(vec![index as u8; 3], 1, 1, 3, index)))
            }
        }

        fn position(&self) -> usize {
            self.position
        }

        fn set_position(&mut self, position: usize) -> Result<(), SourceError> {
            self.events.lock().unwrap().push(CursorEvent::Seek {
                from: self.position,
                to: position,
            });
            self.position = position;
            Ok(())
        }

        fn frame_count(&self) -> usize {
            self.frame_count
        }

        fn close(&mut self) {}
    }

    fn reader_for(source: StubSource) -> (FrameReader, Arc<Mutex<Vec<CursorEvent>>>) {
        let events = source.events.clone();
        let reader = FrameReader::new(Box::new(source), RetryPolicy::fixed(Duration::ZERO));
        (reader, events)
    }

    /// Calls `next` until end of stream, collecting `(kind, position)` pairs.
    fn drain(reader: &mut FrameReader) -> Vec<(&'static str, usize)> {
        let mut seen = Vec::new();
        loop {
            match reader.next().unwrap() {
                ReadOutcome::Decoded { position, .. } => seen.push(("decoded", position)),
                ReadOutcome::NotReady { position } => seen.push(("not_ready", position)),
                ReadOutcome::EndOfStream => return seen,
            }
        }
    }

    #[test]
    fn test_five_frames_yield_post_read_positions() {
        let (mut reader, events) = reader_for(StubSource::new(5, &[]));

        let outcomes = drain(&mut reader);
        let positions: Vec<usize> = outcomes.iter().map(|(_, p)| *p).collect();
        assert_eq!(positions, vec![1, 2, 3, 4, 5]);
        assert!(outcomes.iter().all(|(kind, _)| *kind == "decoded"));
        assert_eq!(events.lock().unwrap().len(), 5);
    }

    #[test]
    fn test_decoded_frame_index_is_one_behind_position() {
        let (mut reader, _) = reader_for(StubSource::new(3, &[]));
        for expected in 1..=3 {
            match reader.next().unwrap() {
                ReadOutcome::Decoded { frame, position } => {
                    assert_eq!(position, expected);
                    assert_eq!(frame.index(), position - 1);
                }
                other => panic!("expected a decoded frame, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_k_stalls_then_decode_at_same_position() {
        let k = 3;
        let (mut reader, _) = reader_for(StubSource::new(5, &[(2, k)]));

        let outcomes = drain(&mut reader);
        let expected: Vec<(&str, usize)> = vec![
            ("decoded", 1),
            ("decoded", 2),
            ("not_ready", 3),
            ("not_ready", 3),
            ("not_ready", 3),
            ("decoded", 3),
            ("decoded", 4),
            ("decoded", 5),
        ];
        assert_eq!(outcomes, expected);
    }

    #[test]
    fn test_cursor_moves_back_exactly_once_per_not_ready() {
        let (mut reader, events) = reader_for(StubSource::new(6, &[(0, 2), (3, 1), (5, 4)]));
        let outcomes = drain(&mut reader);
        let not_ready = outcomes.iter().filter(|(k, _)| *k == "not_ready").count();
        assert_eq!(not_ready, 7);

        let events = events.lock().unwrap();
        let mut cursor = 0usize;
        let mut rewinds = 0;
        for event in events.iter() {
            match *event {
                CursorEvent::Read { from, .. } => {
                    assert_eq!(from, cursor, "read must start at the cursor");
                    cursor += 1;
                }
                CursorEvent::Seek { from, to } => {
                    assert_eq!(from, cursor);
                    assert_eq!(to + 1, from, "only one-step rewinds are allowed");
                    rewinds += 1;
                    cursor = to;
                }
            }
        }
        assert_eq!(rewinds, not_ready);
        assert_eq!(cursor, 6);
    }

    #[test]
    fn test_decoded_positions_have_no_gaps_or_duplicates() {
        let (mut reader, _) = reader_for(StubSource::new(8, &[(1, 1), (4, 2), (7, 1)]));
        let decoded: Vec<usize> = drain(&mut reader)
            .into_iter()
            .filter(|(k, _)| *k == "decoded")
            .map(|(_, p)| p)
            .collect();
        assert_eq!(decoded, (1..=8).collect::<Vec<_>>());
    }

    #[test]
    fn test_end_of_stream_is_idempotent() {
        let (mut reader, events) = reader_for(StubSource::new(2, &[]));
        drain(&mut reader);
        let reads_at_end = events.lock().unwrap().len();

        for _ in 0..5 {
            assert!(reader.next().unwrap().is_end_of_stream());
            assert_eq!(reader.position(), 2);
        }
        assert_eq!(events.lock().unwrap().len(), reads_at_end);
    }

    #[test]
    fn test_unknown_length_never_reports_end() {
        // frame_count = 0: exhaustion cannot be detected, reads keep going
        let (mut reader, _) = reader_for(StubSource::new(0, &[]));
        for _ in 0..10 {
            assert!(!reader.next().unwrap().is_end_of_stream());
        }
    }

    #[test]
    fn test_bounded_policy_times_out() {
        let source = StubSource::new(5, &[(1, 10)]);
        let policy = RetryPolicy::bounded_exponential(3, Duration::ZERO, Duration::ZERO);
        let mut reader = FrameReader::new(Box::new(source), policy);

        assert!(matches!(reader.next().unwrap(), ReadOutcome::Decoded { .. }));
        assert!(matches!(
            reader.next().unwrap(),
            ReadOutcome::NotReady { position: 2 }
        ));
        assert!(matches!(
            reader.next().unwrap(),
            ReadOutcome::NotReady { position: 2 }
        ));
        match reader.next() {
            Err(ReaderError::ReadTimeout { position, attempts }) => {
                assert_eq!(position, 2);
                assert_eq!(attempts, 3);
            }
            other => panic!("expected ReadTimeout, got {other:?}"),
        }
        // the cursor was still rewound, so the frame can be retried later
        assert_eq!(reader.position(), 1);
    }

    #[test]
    fn test_streak_resets_after_decode() {
        let source = StubSource::new(5, &[(1, 2), (3, 2)]);
        let policy = RetryPolicy::bounded_exponential(3, Duration::ZERO, Duration::ZERO);
        let mut reader = FrameReader::new(Box::new(source), policy);

        let outcomes = drain(&mut reader);
        assert_eq!(outcomes.len(), 9);
        assert_eq!(reader.not_ready_streak(), 0);
    }

    #[test]
    fn test_retry_delay_follows_streak() {
        let source = StubSource::new(3, &[(0, 3)]);
        let policy = RetryPolicy::bounded_exponential(
            10,
            Duration::from_millis(100),
            Duration::from_millis(1000),
        );
        let mut reader = FrameReader::new(Box::new(source), policy);

        assert_eq!(reader.retry_delay(), Duration::from_millis(100));
        reader.next().unwrap();
        assert_eq!(reader.retry_delay(), Duration::from_millis(100));
        reader.next().unwrap();
        reader.next().unwrap();
        assert_eq!(reader.not_ready_streak(), 3);
        assert!(reader.retry_delay() > Duration::from_millis(300));
    }
}
