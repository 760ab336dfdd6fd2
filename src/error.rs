use std::path::PathBuf;

use thiserror::Error;

use crate::grid::GridKey;

pub type Result<T> = std::result::Result<T, IceError>;

/// Failures raised while decoding sources, caching grids or aggregating them.
#[derive(Error, Debug)]
pub enum IceError {
    /// Upstream file is not on disk (yet).
    #[error("source file missing: {}", path.display())]
    SourceMissing { path: PathBuf },

    /// Source content could not be interpreted.
    #[error("failed to decode source: {0}")]
    Decode(String),

    /// Polygon label outside the fixed ice code mapping.
    #[error("unknown ice category label: {0:?}")]
    UnknownCategory(String),

    /// A cached artifact exists but cannot be read back.
    #[error("corrupt cache artifact {}: {reason}", path.display())]
    CacheCorruption { path: PathBuf, reason: String },

    #[error("no cached grid for {0}")]
    NotFound(GridKey),

    #[error("no valid dates to aggregate")]
    EmptyRange,

    #[error("precondition violated: {0}")]
    Precondition(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("GDAL error: {0}")]
    Gdal(#[from] gdal::errors::GdalError),
}

impl IceError {
    /// Whether a later run over the same date could succeed without anyone fixing the data.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            IceError::SourceMissing { .. }
                | IceError::CacheCorruption { .. }
                | IceError::NotFound(_)
                | IceError::Io(_)
        )
    }
}
