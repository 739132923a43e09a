pub mod config;
pub mod coverage;
pub mod coverage_model;
pub mod detection;
pub mod error;
pub mod geometry;
pub mod io;
pub mod models;
pub mod overlay;
pub mod pipeline;

pub use config::{AnalysisConfig, ConfigError};
pub use coverage::estimate_coverage;
pub use coverage_model::{CoverageModel, DiscolorationModel, EmptyCoverageModel};
pub use detection::{MaskDirectoryDetector, PrecomputedDetector, ThresholdDetector, ToothDetector};
pub use error::{AnalysisError, DetectorError, SkipReason};
pub use models::{AnalysisReport, BoundingBox, FailureReport, PipelineReport, ToothResult};
pub use pipeline::{Annotation, AnnotatedTooth, CalculusPipeline, DebugConfig};
