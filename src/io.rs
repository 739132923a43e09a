//! Reading the source image and persisting the annotated copy.

use image::{ImageReader, RgbImage};
use std::path::{Path, PathBuf};

use crate::error::AnalysisError;

/// Load an image from disk as 8-bit RGB.
pub fn load_image(path: &Path) -> Result<RgbImage, AnalysisError> {
    let img = ImageReader::open(path)
        .map_err(image::ImageError::IoError)
        .and_then(|reader| reader.with_guessed_format().map_err(image::ImageError::IoError))
        .and_then(|reader| reader.decode())
        .map_err(|source| AnalysisError::ImageLoad {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(img.to_rgb8())
}

/// `<dir>/<stem><suffix><.ext>` for a source path `<dir>/<stem><.ext>`.
pub fn processed_path(source: &Path, suffix: &str) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = source
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    source.with_file_name(format!("{stem}{suffix}{ext}"))
}

/// Write the annotated image; the format follows the file extension.
pub fn save_image(image: &RgbImage, path: &Path) -> Result<(), AnalysisError> {
    image.save(path).map_err(|source| AnalysisError::Write {
        path: path.to_path_buf(),
        source,
    })
}
