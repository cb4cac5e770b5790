use std::path::{Path, PathBuf};

use crate::detection::domain::detection_result::DetectionResult;
use crate::detection::domain::export_format::ExportFormat;
use crate::detection::domain::model_error::ModelError;

/// Receives each detection result as soon as its frame has been analysed.
/// An error stops the detection run.
pub type ResultHandler<'a> =
    &'a mut dyn FnMut(DetectionResult) -> Result<(), Box<dyn std::error::Error>>;

/// Capability interface of a detection model backend.
pub trait DetectionModel: Send {
    /// Runs detection over every frame of the video at `source`, handing
    /// results to `on_result` in frame order. Returns the number of frames
    /// analysed.
    fn detect(
        &mut self,
        source: &Path,
        on_result: ResultHandler<'_>,
    ) -> Result<usize, Box<dyn std::error::Error>>;

    /// Serializes the model into `output_dir` and returns the artifact path.
    fn export(&self, format: ExportFormat, output_dir: &Path) -> Result<PathBuf, ModelError>;
}
