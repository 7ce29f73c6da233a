//! Error types for the steganalysis engine
//!
//! Two families:
//!
//! - [`AnalysisError`] is fatal to a single analysis call. The caller gets the
//!   error instead of a report.
//! - [`DetectorError`] is local to one detector. The orchestrator absorbs it
//!   into a negative, annotated [`DetectionResult`](crate::DetectionResult) so
//!   sibling detectors still report.

use thiserror::Error;

/// Failures that abort a whole analysis call
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Buffer is missing required metadata or its shape does not match it
    #[error("decode error: {0}")]
    Decode(String),

    /// Media kind is not covered by the dispatch table
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Reading the source file failed (loader only, never the engine)
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<image::ImageError> for AnalysisError {
    fn from(e: image::ImageError) -> Self {
        match e {
            image::ImageError::Unsupported(u) => AnalysisError::UnsupportedFormat(u.to_string()),
            image::ImageError::IoError(io) => AnalysisError::Io(io),
            other => AnalysisError::Decode(other.to_string()),
        }
    }
}

impl From<symphonia::core::errors::Error> for AnalysisError {
    fn from(e: symphonia::core::errors::Error) -> Self {
        use symphonia::core::errors::Error as SymphoniaError;
        match e {
            SymphoniaError::IoError(io) => AnalysisError::Io(io),
            SymphoniaError::Unsupported(what) => AnalysisError::UnsupportedFormat(what.to_string()),
            other => AnalysisError::Decode(other.to_string()),
        }
    }
}

/// Failures local to one detector
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DetectorError {
    /// Too few samples for the statistic to mean anything
    #[error("insufficient data: need at least {needed} samples, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// The computation itself broke down (degenerate transform, bad shape, ...)
    #[error("detector failure: {0}")]
    Failure(String),
}

pub type Result<T, E = AnalysisError> = std::result::Result<T, E>;
