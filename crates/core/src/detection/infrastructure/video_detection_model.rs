use std::path::{Path, PathBuf};

use crate::detection::domain::detection_model::{DetectionModel, ResultHandler};
use crate::detection::domain::detection_result::DetectionResult;
use crate::detection::domain::export_format::ExportFormat;
use crate::detection::domain::frame_detector::FrameDetector;
use crate::detection::domain::model_error::ModelError;
use crate::reader::domain::cancellation::{CancellationSignal, NeverCancel};
use crate::reader::domain::frame_reader::FrameReader;
use crate::reader::domain::read_outcome::ReadOutcome;
use crate::reader::domain::reader_error::ReaderError;
use crate::reader::domain::retry_policy::RetryPolicy;
use crate::reader::domain::source_opener::open_with_retry;
use crate::video::domain::video_source::VideoSource;

/// Builds a fresh, unopened source for each `detect` call.
pub type SourceFactory = Box<dyn FnMut() -> Box<dyn VideoSource> + Send>;

/// [`DetectionModel`] that runs a per-frame detector over a whole video,
/// reading it through the polling [`FrameReader`].
pub struct VideoDetectionModel {
    detector: Box<dyn FrameDetector>,
    model_path: PathBuf,
    source_factory: SourceFactory,
    open_policy: RetryPolicy,
    read_policy: RetryPolicy,
}

impl VideoDetectionModel {
    pub fn new(
        detector: Box<dyn FrameDetector>,
        model_path: PathBuf,
        source_factory: SourceFactory,
        open_policy: RetryPolicy,
        read_policy: RetryPolicy,
    ) -> Self {
        Self {
            detector,
            model_path,
            source_factory,
            open_policy,
            read_policy,
        }
    }

    fn run(
        &mut self,
        reader: &mut FrameReader,
        waiter: &mut dyn CancellationSignal,
        on_result: ResultHandler<'_>,
    ) -> Result<usize, Box<dyn std::error::Error>> {
        let mut analysed = 0;
        loop {
            match reader.next() {
                Ok(ReadOutcome::Decoded { frame, .. }) => {
                    let boxes = self.detector.detect(&frame)?;
                    log::debug!("Frame {}: {} detections", frame.index(), boxes.len());
                    on_result(DetectionResult::new(frame, boxes))?;
                    analysed += 1;
                }
                Ok(ReadOutcome::NotReady { position }) => {
                    log::debug!("Frame at {position} not ready, retrying");
                    waiter.wait(reader.retry_delay());
                }
                Ok(ReadOutcome::EndOfStream) => return Ok(analysed),
                // Without a frame count the end of the stream looks like a stall.
                Err(ReaderError::ReadTimeout { position, .. }) if reader.frame_count() == 0 => {
                    log::info!("No further frames after position {position}, treating as end");
                    return Ok(analysed);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

impl DetectionModel for VideoDetectionModel {
    fn detect(
        &mut self,
        source: &Path,
        on_result: ResultHandler<'_>,
    ) -> Result<usize, Box<dyn std::error::Error>> {
        let mut waiter = NeverCancel;
        let mut video = (self.source_factory)();
        let metadata = open_with_retry(video.as_mut(), source, &self.open_policy, &mut waiter)?;
        log::info!(
            "Detecting on {} ({}x{}, {} frames)",
            source.display(),
            metadata.width,
            metadata.height,
            metadata.total_frames
        );
        if !metadata.has_known_length() {
            log::warn!("{} declares no frame count; a stalled read ends detection", source.display());
        }

        let mut reader = FrameReader::new(video, self.read_policy.clone());
        let result = self.run(&mut reader, &mut waiter, on_result);
        reader.close();
        result
    }

    fn export(&self, format: ExportFormat, output_dir: &Path) -> Result<PathBuf, ModelError> {
        if format != ExportFormat::Onnx {
            return Err(ModelError::UnsupportedExport(format));
        }
        if !self.model_path.is_file() {
            return Err(ModelError::MissingArtifact(self.model_path.clone()));
        }

        std::fs::create_dir_all(output_dir).map_err(|source| ModelError::Io {
            path: output_dir.to_path_buf(),
            source,
        })?;
        let stem = self
            .model_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "model".to_string());
        let dest = output_dir.join(format!("{stem}.{}", format.extension()));

        let same_file = match (dest.canonicalize(), self.model_path.canonicalize()) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        };
        if !same_file {
            std::fs::copy(&self.model_path, &dest).map_err(|source| ModelError::Io {
                path: dest.clone(),
                source,
            })?;
        }
        log::info!("Exported {} to {}", self.model_path.display(), dest.display());
        Ok(dest)
    }
}
