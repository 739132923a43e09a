//! Coverage models: per-crop estimates of where calculus is present.

use image::imageops::{self, FilterType};
use image::{GrayImage, Luma, RgbImage};

use crate::config::DiscolorationConfig;

/// Produces a binary coverage mask for a normalized tooth crop.
///
/// The returned mask is expected at the crop's resolution; the pipeline
/// resamples whatever comes back to the tooth's native crop size.
pub trait CoverageModel: Send + Sync {
    fn predict(&self, crop: &RgbImage) -> anyhow::Result<GrayImage>;

    /// Human-readable name (used in log output).
    fn name(&self) -> &str;
}

/// Resize a tooth crop to the `size x size` input expected by a model.
pub fn normalize_crop(crop: &RgbImage, size: u32) -> RgbImage {
    imageops::resize(crop, size, size, FilterType::Triangle)
}

/// Colour heuristic: flags yellow-brown pixels within a luma window.
///
/// This is a deterministic placeholder for a trained segmentation model.
pub struct DiscolorationModel {
    config: DiscolorationConfig,
}

impl DiscolorationModel {
    pub fn new(config: DiscolorationConfig) -> Self {
        Self { config }
    }

    fn is_discolored(&self, [r, g, b]: [u8; 3]) -> bool {
        let (r, g, b) = (r as f32, g as f32, b as f32);
        let yellowness = (r + g) / 2.0 - b;
        let luma = 0.299 * r + 0.587 * g + 0.114 * b;
        yellowness >= self.config.yellowness
            && luma >= self.config.min_luma as f32
            && luma <= self.config.max_luma as f32
    }
}

impl Default for DiscolorationModel {
    fn default() -> Self {
        Self::new(DiscolorationConfig::default())
    }
}

impl CoverageModel for DiscolorationModel {
    fn predict(&self, crop: &RgbImage) -> anyhow::Result<GrayImage> {
        Ok(GrayImage::from_fn(crop.width(), crop.height(), |x, y| {
            if self.is_discolored(crop.get_pixel(x, y).0) {
                Luma([255])
            } else {
                Luma([0])
            }
        }))
    }

    fn name(&self) -> &str {
        "Discoloration Heuristic"
    }
}

/// Never flags anything.
pub struct EmptyCoverageModel;

impl CoverageModel for EmptyCoverageModel {
    fn predict(&self, crop: &RgbImage) -> anyhow::Result<GrayImage> {
        Ok(GrayImage::new(crop.width(), crop.height()))
    }

    fn name(&self) -> &str {
        "Empty"
    }
}
