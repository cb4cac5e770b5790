use std::path::PathBuf;

use thiserror::Error;

use crate::video::domain::video_source::SourceError;

#[derive(Error, Debug)]
pub enum ReaderError {
    #[error("video source {} unavailable after {attempts} attempt(s)", path.display())]
    SourceUnavailable { path: PathBuf, attempts: u32 },
    #[error("read at position {position} still not ready after {attempts} attempt(s)")]
    ReadTimeout { position: usize, attempts: u32 },
    #[error("cancelled")]
    Cancelled,
    #[error(transparent)]
    Source(#[from] SourceError),
}
