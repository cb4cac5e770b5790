use std::path::PathBuf;

use thiserror::Error;

use crate::detection::domain::export_format::ExportFormat;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("this model backend cannot export to {0}")]
    UnsupportedExport(ExportFormat),
    #[error("model artifact missing: {}", .0.display())]
    MissingArtifact(PathBuf),
    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
