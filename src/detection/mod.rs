//! Tooth detectors: sources of per-tooth instance masks.
//!
//! The pipeline only sees the [`ToothDetector`] trait, so a segmentation
//! model can replace the built-in detectors without touching geometry,
//! rendering or aggregation.

pub mod contours;
pub mod masks;
pub mod preprocessing;

use image::{GrayImage, RgbImage};

use crate::config::ThresholdDetectorConfig;
use crate::error::DetectorError;

pub use masks::{MaskDirectoryDetector, PrecomputedDetector};

/// Produces one binary mask per detected tooth, in detection order.
///
/// Masks should match the image resolution; masks of another size are
/// resampled by the pipeline. An empty list is a valid result.
pub trait ToothDetector: Send + Sync {
    fn detect(&self, image: &RgbImage) -> Result<Vec<GrayImage>, DetectorError>;

    /// Human-readable name (used in log output).
    fn name(&self) -> &str;
}

/// Finds bright, compact regions: blur, threshold, then label connected
/// components. A stand-in for a trained instance segmenter.
pub struct ThresholdDetector {
    config: ThresholdDetectorConfig,
}

impl ThresholdDetector {
    pub fn new(config: ThresholdDetectorConfig) -> Self {
        Self { config }
    }
}

impl Default for ThresholdDetector {
    fn default() -> Self {
        Self::new(ThresholdDetectorConfig::default())
    }
}

impl ToothDetector for ThresholdDetector {
    fn detect(&self, image: &RgbImage) -> Result<Vec<GrayImage>, DetectorError> {
        let gray = preprocessing::to_grayscale(image);
        let blurred = preprocessing::apply_blur(&gray, self.config.blur_sigma);
        let level = self
            .config
            .threshold
            .unwrap_or_else(|| preprocessing::otsu_threshold(&blurred));
        log::debug!("threshold detector: luma level {level}");

        let binary = preprocessing::binarize(&blurred, level);
        let regions = contours::find_regions(&binary, self.config.min_area);
        log::debug!("threshold detector: {} regions kept", regions.len());

        Ok(contours::region_masks(&regions))
    }

    fn name(&self) -> &str {
        "Threshold Detector"
    }
}
