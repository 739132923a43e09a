//! Coverage ratio of a condition mask over a tooth mask.

use image::GrayImage;

use crate::error::SkipReason;

const EPSILON: f64 = 1e-6;

/// Percentage of tooth pixels that are also flagged in `coverage`.
///
/// Both masks are crop-local and must have identical dimensions; resample
/// first with [`crate::geometry::resample_mask_if_needed`]. An empty tooth
/// mask yields `0.0`. The result is clamped to `[0, 100]` and left
/// unrounded.
pub fn estimate_coverage(tooth: &GrayImage, coverage: &GrayImage) -> Result<f64, SkipReason> {
    if tooth.dimensions() != coverage.dimensions() {
        return Err(SkipReason::ShapeMismatch {
            tooth: tooth.dimensions(),
            coverage: coverage.dimensions(),
        });
    }

    let mut tooth_area: u64 = 0;
    let mut overlap: u64 = 0;
    for (t, c) in tooth.pixels().zip(coverage.pixels()) {
        if t[0] > 0 {
            tooth_area += 1;
            if c[0] > 0 {
                overlap += 1;
            }
        }
    }

    let percent = 100.0 * overlap as f64 / (tooth_area as f64 + EPSILON);
    Ok(percent.clamp(0.0, 100.0))
}
