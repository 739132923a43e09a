use image::{GrayImage, Luma, Rgb, RgbImage};
use std::path::PathBuf;
use tempfile::TempDir;

/// Creates a 200x200 gradient test image.
pub fn gradient_image() -> RgbImage {
    RgbImage::from_fn(200, 200, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 128]))
}

/// Full-image mask with the half-open rectangle `x0..x1, y0..y1` set.
pub fn rect_mask(x0: u32, y0: u32, x1: u32, y1: u32) -> GrayImage {
    GrayImage::from_fn(200, 200, |x, y| {
        Luma([if (x0..x1).contains(&x) && (y0..y1).contains(&y) { 255 } else { 0 }])
    })
}

/// Mask whose padded box is exactly (10, 10, 110, 110) with the default
/// 20 px padding.
pub fn tooth_at_10_10_110_110() -> GrayImage {
    rect_mask(30, 30, 90, 90)
}

/// Writes `image` as PNG into a fresh temp directory.
/// Returns the directory (which must be kept alive) and the image path.
pub fn write_png(image: &RgbImage, name: &str) -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("Failed to create temp directory");
    let path = dir.path().join(name);
    image.save(&path).expect("Failed to save test image");
    (dir, path)
}
