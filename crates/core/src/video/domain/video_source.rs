use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("video source not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("video source not ready: {0}")]
    NotReady(String),
    #[error("video source is not open")]
    NotOpen,
    #[error("video backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl SourceError {
    /// Whether an `open` that failed this way is worth polling again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SourceError::NotFound(_) | SourceError::NotReady(_))
    }

    pub fn backend<E>(err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        SourceError::Backend(err.into())
    }
}

/// A sequential, finite stream of frames behind a read cursor.
///
/// Cursor contract: every [`read`](VideoSource::read) attempt advances
/// [`position`](VideoSource::position) by one, whether or not a frame was
/// decoded. A caller retrying a frame rewinds with
/// [`set_position`](VideoSource::set_position).
pub trait VideoSource: Send {
    /// Opens the named resource and returns its metadata.
    ///
    /// `NotFound` and `NotReady` are transient: the resource may appear or
    /// finish its header later.
    fn open(&mut self, path: &Path) -> Result<VideoMetadata, SourceError>;

    fn is_open(&self) -> bool;

    /// Decodes the frame at the cursor. `Ok(None)` means the frame is not
    /// available yet.
    fn read(&mut self) -> Result<Option<Frame>, SourceError>;

    /// Index of the next frame to be read.
    fn position(&self) -> usize;

    fn set_position(&mut self, position: usize) -> Result<(), SourceError>;

    /// Total frames in the stream, or 0 if unknown.
    fn frame_count(&self) -> usize;

    /// Releases any resources held by the source. Idempotent.
    fn close(&mut self);
}
