//! Detectors backed by masks produced elsewhere.

use image::{GrayImage, ImageReader, RgbImage};
use std::path::{Path, PathBuf};

use super::ToothDetector;
use crate::error::DetectorError;

/// Reads instance masks written by an external segmentation model.
///
/// Every `.png` file in the directory is one instance; files are used in
/// file-name order. Any nonzero pixel is foreground.
pub struct MaskDirectoryDetector {
    dir: PathBuf,
}

impl MaskDirectoryDetector {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn mask_paths(&self) -> Result<Vec<PathBuf>, DetectorError> {
        let entries = std::fs::read_dir(&self.dir).map_err(|source| {
            DetectorError::MaskDirectory {
                path: self.dir.clone(),
                source,
            }
        })?;

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| DetectorError::MaskDirectory {
                path: self.dir.clone(),
                source,
            })?;
            let path = entry.path();
            if path.is_file() && is_png(&path) {
                paths.push(path);
            }
        }
        paths.sort();
        Ok(paths)
    }
}

fn is_png(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("png"))
}

fn load_mask(path: &Path) -> Result<GrayImage, DetectorError> {
    let decoded = ImageReader::open(path)
        .map_err(image::ImageError::IoError)
        .and_then(|reader| reader.decode())
        .map_err(|source| DetectorError::MaskDecode {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(decoded.to_luma8())
}

impl ToothDetector for MaskDirectoryDetector {
    fn detect(&self, _image: &RgbImage) -> Result<Vec<GrayImage>, DetectorError> {
        let paths = self.mask_paths()?;
        log::debug!("loading {} instance masks from {}", paths.len(), self.dir.display());
        paths.iter().map(|p| load_mask(p)).collect()
    }

    fn name(&self) -> &str {
        "Mask Directory"
    }
}

/// Returns a fixed list of masks regardless of the image.
///
/// Useful when masks were computed in-process by another component.
pub struct PrecomputedDetector {
    masks: Vec<GrayImage>,
}

impl PrecomputedDetector {
    pub fn new(masks: Vec<GrayImage>) -> Self {
        Self { masks }
    }
}

impl ToothDetector for PrecomputedDetector {
    fn detect(&self, _image: &RgbImage) -> Result<Vec<GrayImage>, DetectorError> {
        Ok(self.masks.clone())
    }

    fn name(&self) -> &str {
        "Precomputed Masks"
    }
}
