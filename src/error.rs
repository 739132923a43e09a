use std::path::PathBuf;

/// Run-level failures. Any of these aborts the analysis and produces a
/// failure report.
#[derive(thiserror::Error, Debug)]
pub enum AnalysisError {
    #[error("Could not load image from {}", path.display())]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error(transparent)]
    Detector(#[from] DetectorError),
    #[error("Could not write processed image to {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("debug output failed: {0}")]
    Debug(#[from] std::io::Error),
}

/// Errors raised by a tooth detector.
#[derive(thiserror::Error, Debug)]
pub enum DetectorError {
    #[error("mask directory {} is not readable: {source}", path.display())]
    MaskDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode instance mask {}: {source}", path.display())]
    MaskDecode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("detector failed: {0}")]
    Failed(String),
}

/// Why a single instance was left out of the results.
///
/// These never abort a run; the instance is logged and skipped.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum SkipReason {
    #[error("instance mask has no foreground pixels")]
    EmptyMask,
    #[error("bounding box is degenerate")]
    DegenerateBox,
    #[error("mask shapes differ: {tooth:?} vs {coverage:?}")]
    ShapeMismatch {
        tooth: (u32, u32),
        coverage: (u32, u32),
    },
    #[error("coverage model failed: {0}")]
    Model(String),
}
