use std::path::PathBuf;

use renderflow_types::{FigureFormat, InvalidFigureFormat};
use thiserror::Error;

/// Failures while writing reports or figure files.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    InvalidFormat(#[from] InvalidFigureFormat),

    #[error("exporting {format} figures requires an image engine; set RENDERFLOW_IMAGE_ENGINE or configure image_engine.command")]
    ImageEngineUnavailable { format: FigureFormat },

    #[error("image engine failed to write {}: {reason}", path.display())]
    ImageEngine { path: PathBuf, reason: String },

    #[error("failed to write {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize figure")]
    Serialize(#[from] serde_json::Error),
}

impl ExportError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> ExportError {
        let path = path.into();
        move |source| ExportError::Io { path, source }
    }
}
