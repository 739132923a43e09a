//! Geometry helpers: mask extents, crops and frame conversions.

use image::imageops::{self, FilterType};
use image::{GrayImage, RgbImage};
use std::borrow::Cow;

use crate::models::BoundingBox;

/// Padded bounding box of the nonzero pixels of `mask`, clamped to an
/// `height x width` image.
///
/// Returns `None` when the mask has no foreground pixel or when the clamped
/// box would be empty (mask entirely outside the image).
pub fn bounding_box_from_mask(
    mask: &GrayImage,
    padding: u32,
    height: u32,
    width: u32,
) -> Option<BoundingBox> {
    let mut min_x = u32::MAX;
    let mut min_y = u32::MAX;
    let mut max_x = 0;
    let mut max_y = 0;
    let mut has_content = false;

    for (x, y, pixel) in mask.enumerate_pixels() {
        if pixel[0] > 0 {
            has_content = true;
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
    }

    if !has_content {
        return None;
    }

    let x1 = min_x.saturating_sub(padding);
    let y1 = min_y.saturating_sub(padding);
    let x2 = max_x.saturating_add(1).saturating_add(padding).min(width);
    let y2 = max_y.saturating_add(1).saturating_add(padding).min(height);

    BoundingBox::new(x1, y1, x2, y2)
}

/// Resize `mask` to `(width, height)` with nearest-neighbour sampling if its
/// dimensions differ, so the result stays binary.
pub fn resample_mask_if_needed(mask: &GrayImage, target: (u32, u32)) -> Cow<'_, GrayImage> {
    if mask.dimensions() == target {
        Cow::Borrowed(mask)
    } else {
        Cow::Owned(imageops::resize(mask, target.0, target.1, FilterType::Nearest))
    }
}

/// Mean position of the nonzero pixels, in the mask's own (crop-local)
/// frame. An empty mask yields the geometric centre.
pub fn center_of_mass(mask: &GrayImage) -> (u32, u32) {
    let mut sum_x: u64 = 0;
    let mut sum_y: u64 = 0;
    let mut count: u64 = 0;

    for (x, y, pixel) in mask.enumerate_pixels() {
        if pixel[0] > 0 {
            sum_x += x as u64;
            sum_y += y as u64;
            count += 1;
        }
    }

    if count == 0 {
        (mask.width() / 2, mask.height() / 2)
    } else {
        ((sum_x / count) as u32, (sum_y / count) as u32)
    }
}

/// Copy the box region out of a colour image.
pub fn crop_rgb(image: &RgbImage, bbox: &BoundingBox) -> RgbImage {
    imageops::crop_imm(image, bbox.x1, bbox.y1, bbox.width(), bbox.height()).to_image()
}

/// Copy the box region out of a mask.
pub fn crop_mask(mask: &GrayImage, bbox: &BoundingBox) -> GrayImage {
    imageops::crop_imm(mask, bbox.x1, bbox.y1, bbox.width(), bbox.height()).to_image()
}

/// Number of nonzero pixels.
pub fn count_nonzero(mask: &GrayImage) -> u64 {
    mask.pixels().filter(|p| p[0] > 0).count() as u64
}
