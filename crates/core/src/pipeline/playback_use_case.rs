use std::fmt;
use std::path::Path;
use std::time::{Duration, Instant};

use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::reader::domain::cancellation::CancellationSignal;
use crate::reader::domain::frame_reader::FrameReader;
use crate::reader::domain::read_outcome::ReadOutcome;
use crate::reader::domain::reader_error::ReaderError;
use crate::reader::domain::retry_policy::RetryPolicy;
use crate::reader::domain::source_opener::open_with_retry;
use crate::shared::constants::{
    DEFAULT_CANCEL_POLL_MS, DEFAULT_MAX_RETRY_INTERVAL_MS, DEFAULT_OPEN_ATTEMPTS,
    DEFAULT_READ_ATTEMPTS, DEFAULT_RETRY_INTERVAL_MS,
};
use crate::shared::crop_window::CropWindow;
use crate::video::domain::frame_sink::FrameSink;
use crate::video::domain::video_source::VideoSource;

/// Knobs of a playback run.
#[derive(Clone, Debug, PartialEq)]
pub struct PlaybackSettings {
    pub crop: Option<CropWindow>,
    pub channel: Option<u8>,
    pub open_policy: RetryPolicy,
    pub read_policy: RetryPolicy,
    /// Bounded wait of the per-iteration cancellation check.
    pub cancel_poll: Duration,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        let initial = Duration::from_millis(DEFAULT_RETRY_INTERVAL_MS);
        let max = Duration::from_millis(DEFAULT_MAX_RETRY_INTERVAL_MS);
        Self {
            crop: None,
            channel: None,
            open_policy: RetryPolicy::bounded_exponential(DEFAULT_OPEN_ATTEMPTS, initial, max),
            read_policy: RetryPolicy::bounded_exponential(DEFAULT_READ_ATTEMPTS, initial, max),
            cancel_poll: Duration::from_millis(DEFAULT_CANCEL_POLL_MS),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    EndOfStream,
    Cancelled,
    /// A stream of unknown length stopped producing frames.
    Stalled,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StopReason::EndOfStream => "end of stream",
            StopReason::Cancelled => "cancelled",
            StopReason::Stalled => "stalled",
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlaybackReport {
    pub decoded: usize,
    pub not_ready: usize,
    pub last_position: usize,
    pub stop_reason: StopReason,
}

impl PlaybackReport {
    fn new(stop_reason: StopReason) -> Self {
        Self {
            decoded: 0,
            not_ready: 0,
            last_position: 0,
            stop_reason,
        }
    }
}

/// Opens a video once it is readable and plays it into a [`FrameSink`].
///
/// Each iteration reads one frame, shows it (cropped if configured), then
/// polls the cancellation signal. A frame that is not ready yet is waited
/// for through the same signal, so a cancel request also interrupts the wait.
pub struct PlaybackUseCase {
    sink: Box<dyn FrameSink>,
    cancellation: Box<dyn CancellationSignal>,
    logger: Box<dyn PipelineLogger>,
    settings: PlaybackSettings,
}

impl PlaybackUseCase {
    pub fn new(
        sink: Box<dyn FrameSink>,
        cancellation: Box<dyn CancellationSignal>,
        logger: Box<dyn PipelineLogger>,
        settings: PlaybackSettings,
    ) -> Self {
        Self {
            sink,
            cancellation,
            logger,
            settings,
        }
    }

    pub fn execute(
        &mut self,
        mut source: Box<dyn VideoSource>,
        path: &Path,
    ) -> Result<PlaybackReport, Box<dyn std::error::Error>> {
        let metadata = match open_with_retry(
            source.as_mut(),
            path,
            &self.settings.open_policy,
            self.cancellation.as_mut(),
        ) {
            Ok(metadata) => metadata,
            Err(ReaderError::Cancelled) => {
                self.logger.info("Cancelled while waiting for the source");
                return Ok(PlaybackReport::new(StopReason::Cancelled));
            }
            Err(e) => return Err(e.into()),
        };
        self.logger.info(&format!(
            "Opened {} ({}x{}, {:.2} fps, {} frames, {})",
            path.display(),
            metadata.width,
            metadata.height,
            metadata.fps,
            metadata.total_frames,
            metadata.codec
        ));
        if !metadata.has_known_length() {
            self.logger
                .info("No frame count declared; playback ends when reads stall");
        }

        let mut reader = FrameReader::new(source, self.settings.read_policy.clone());
        let mut report = PlaybackReport::new(StopReason::EndOfStream);
        let result = self.run(&mut reader, &mut report);
        reader.close();

        result?;
        self.logger.summary();
        Ok(report)
    }

    fn run(
        &mut self,
        reader: &mut FrameReader,
        report: &mut PlaybackReport,
    ) -> Result<(), Box<dyn std::error::Error>> {
        loop {
            let outcome = match reader.next() {
                Ok(outcome) => outcome,
                Err(ReaderError::ReadTimeout { position, attempts }) if reader.frame_count() == 0 => {
                    self.logger.info(&format!(
                        "No frame at position {position} after {attempts} attempts, stopping"
                    ));
                    report.stop_reason = StopReason::Stalled;
                    return Ok(());
                }
                Err(e) => return Err(e.into()),
            };

            match outcome {
                ReadOutcome::Decoded { frame, position } => {
                    let shown = match (&self.settings.crop, self.settings.channel) {
                        (Some(window), channel) => frame.crop(window, channel)?,
                        (None, Some(channel)) => frame.select_channel(channel)?,
                        (None, None) => frame,
                    };
                    let start = Instant::now();
                    self.sink.show(&shown, position)?;
                    self.logger
                        .timing("show", start.elapsed().as_secs_f64() * 1000.0);
                    self.logger.progress(position, reader.frame_count());
                    report.decoded += 1;
                    report.last_position = position;
                }
                ReadOutcome::NotReady { position } => {
                    self.logger.not_ready(position, reader.not_ready_streak());
                    report.not_ready += 1;
                    report.last_position = position;
                    if self.cancellation.wait(reader.retry_delay()) {
                        report.stop_reason = StopReason::Cancelled;
                        return Ok(());
                    }
                }
                ReadOutcome::EndOfStream => {
                    report.last_position = reader.position();
                    report.stop_reason = StopReason::EndOfStream;
                    return Ok(());
                }
            }

            if self.cancellation.poll(self.settings.cancel_poll) {
                self.logger.info("Playback cancelled");
                report.stop_reason = StopReason::Cancelled;
                return Ok(());
            }
        }
    }
}
