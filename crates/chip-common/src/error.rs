//! Error types for the geochip pipeline.

use thiserror::Error;

/// Result type alias using ChipError.
pub type ChipResult<T> = Result<T, ChipError>;

/// Primary error type for pipeline operations.
#[derive(Debug, Error)]
pub enum ChipError {
    // === Fetch errors ===
    #[error("Fetch failed: {message}")]
    Fetch { message: String, retryable: bool },

    // === Compositing errors ===
    #[error("Bands do not geographically overlap")]
    BandMismatch,

    #[error("Required band missing from input set: {0}")]
    MissingBand(String),

    // === Normalization errors ===
    #[error("Raster has no valid (non-nodata) pixels")]
    EmptyRaster,

    // === Tiling errors ===
    #[error("Raster {width}x{height} is smaller than one {tile_size}px tile and padding is disabled")]
    RasterTooSmall {
        width: usize,
        height: usize,
        tile_size: usize,
    },

    // === Manifest errors ===
    #[error("Failed to write manifest: {0}")]
    ManifestWrite(#[source] std::io::Error),

    // === Decoding errors ===
    #[error("Failed to decode raster: {0}")]
    Decode(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ChipError {
    /// Short stable name for error classification in run summaries.
    pub fn kind(&self) -> &'static str {
        match self {
            ChipError::Fetch { .. } => "fetch",
            ChipError::BandMismatch => "band-mismatch",
            ChipError::MissingBand(_) => "missing-band",
            ChipError::EmptyRaster => "empty-raster",
            ChipError::RasterTooSmall { .. } => "raster-too-small",
            ChipError::ManifestWrite(_) => "manifest-write",
            ChipError::Decode(_) => "decode",
            ChipError::Io(_) => "io",
        }
    }

    /// Whether retrying the operation could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ChipError::Fetch { retryable: true, .. })
    }

    pub fn fetch_transient(message: impl Into<String>) -> Self {
        ChipError::Fetch {
            message: message.into(),
            retryable: true,
        }
    }

    pub fn fetch_permanent(message: impl Into<String>) -> Self {
        ChipError::Fetch {
            message: message.into(),
            retryable: false,
        }
    }
}

impl From<serde_json::Error> for ChipError {
    fn from(err: serde_json::Error) -> Self {
        ChipError::Decode(format!("JSON error: {}", err))
    }
}
