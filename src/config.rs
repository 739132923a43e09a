//! Analysis configuration.
//!
//! Every tunable of the pipeline lives in [`AnalysisConfig`], which is passed
//! to the pipeline at construction. Values can be loaded from a JSON file;
//! missing keys fall back to the defaults.

use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Pixels added on every side of a tooth's mask extent.
    pub padding: u32,
    /// Side length of the square crop handed to the coverage model.
    pub normalize_size: u32,
    /// Suffix inserted before the extension of the processed image.
    pub output_suffix: String,
    pub label: LabelConfig,
    pub detector: ThresholdDetectorConfig,
    pub discoloration: DiscolorationConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            padding: 20,
            normalize_size: 256,
            output_suffix: "_processed".to_string(),
            label: LabelConfig::default(),
            detector: ThresholdDetectorConfig::default(),
            discoloration: DiscolorationConfig::default(),
        }
    }
}

/// Font sizing for the per-tooth percentage label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelConfig {
    /// `min(box_width, box_height) / scale_divisor` gives the raw font scale.
    pub scale_divisor: f32,
    pub min_scale: f32,
    pub max_scale: f32,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            scale_divisor: 80.0,
            min_scale: 1.0,
            max_scale: 3.0,
        }
    }
}

/// Parameters of the built-in threshold detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdDetectorConfig {
    pub blur_sigma: f32,
    /// Fixed luma threshold; Otsu's level is used when unset.
    pub threshold: Option<u8>,
    /// Components smaller than this many pixels are ignored.
    pub min_area: u32,
}

impl Default for ThresholdDetectorConfig {
    fn default() -> Self {
        Self {
            blur_sigma: 1.5,
            threshold: None,
            min_area: 400,
        }
    }
}

/// Parameters of the colour heuristic coverage model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscolorationConfig {
    /// Minimum `(r + g) / 2 - b` for a pixel to count as discoloured.
    pub yellowness: f32,
    pub min_luma: u8,
    pub max_luma: u8,
}

impl Default for DiscolorationConfig {
    fn default() -> Self {
        Self {
            yellowness: 40.0,
            min_luma: 60,
            max_luma: 230,
        }
    }
}

impl AnalysisConfig {
    /// Load a JSON config file and validate it.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config: AnalysisConfig =
            serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
                path: path.display().to_string(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.normalize_size == 0 {
            return Err(ConfigError::Invalid("normalize_size must be > 0".into()));
        }
        if self.output_suffix.is_empty() {
            return Err(ConfigError::Invalid(
                "output_suffix must not be empty, it would overwrite the source".into(),
            ));
        }
        let label = &self.label;
        if !(label.scale_divisor > 0.0) {
            return Err(ConfigError::Invalid("label.scale_divisor must be > 0".into()));
        }
        if !(label.min_scale > 0.0) || label.min_scale > label.max_scale {
            return Err(ConfigError::Invalid(format!(
                "label scale range [{}, {}] is invalid",
                label.min_scale, label.max_scale
            )));
        }
        if self.discoloration.min_luma > self.discoloration.max_luma {
            return Err(ConfigError::Invalid(
                "discoloration.min_luma > discoloration.max_luma".into(),
            ));
        }
        if self.detector.blur_sigma < 0.0 {
            return Err(ConfigError::Invalid("detector.blur_sigma must be >= 0".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = AnalysisConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.padding, 20);
        assert_eq!(config.normalize_size, 256);
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: AnalysisConfig =
            serde_json::from_str(r#"{"padding": 5, "label": {"max_scale": 2.0}}"#).unwrap();
        assert_eq!(config.padding, 5);
        assert_eq!(config.label.max_scale, 2.0);
        assert_eq!(config.label.min_scale, 1.0);
        assert_eq!(config.output_suffix, "_processed");
    }

    #[test]
    fn inverted_scale_range_is_rejected() {
        let mut config = AnalysisConfig::default();
        config.label.min_scale = 4.0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn empty_suffix_is_rejected() {
        let config = AnalysisConfig {
            output_suffix: String::new(),
            ..AnalysisConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"normalize_size": 128}"#).unwrap();
        let config = AnalysisConfig::from_json_file(&path).unwrap();
        assert_eq!(config.normalize_size, 128);

        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            AnalysisConfig::from_json_file(&path),
            Err(ConfigError::Parse { .. })
        ));
    }
}
