use image::{GrayImage, RgbImage};
use std::path::{Path, PathBuf};

use crate::config::AnalysisConfig;
use crate::coverage::estimate_coverage;
use crate::coverage_model::{normalize_crop, CoverageModel, DiscolorationModel};
use crate::detection::{ThresholdDetector, ToothDetector};
use crate::error::{AnalysisError, SkipReason};
use crate::geometry::{
    bounding_box_from_mask, center_of_mass, count_nonzero, crop_mask, crop_rgb,
    resample_mask_if_needed,
};
use crate::io;
use crate::models::{
    round2, AnalysisReport, FailureReport, PipelineReport, ToothResult,
};
use crate::overlay::{LabelLayout, OverlayRenderer, ToothOverlay};

/// Debug configuration for pipeline execution
#[derive(Clone, Debug)]
pub struct DebugConfig {
    /// Root directory for debug outputs
    pub output_dir: PathBuf,
}

const DEBUG_CROPS: &str = "01_crops";
const DEBUG_TOOTH_MASKS: &str = "02_tooth_masks";
const DEBUG_COVERAGE_MASKS: &str = "03_coverage_masks";

/// One annotated tooth.
#[derive(Debug, Clone)]
pub struct AnnotatedTooth {
    /// Percentage is unrounded here; rounding happens in the report.
    pub result: ToothResult,
    /// `None` when no legible label fits inside the tooth's box.
    pub label: Option<LabelLayout>,
}

/// Output of annotating one image.
#[derive(Debug, Clone)]
pub struct Annotation {
    pub image: RgbImage,
    pub teeth: Vec<AnnotatedTooth>,
    /// Mean of the unrounded per-tooth percentages, `0` without teeth.
    pub average_coverage: f64,
}

/// Intermediates of one successfully processed instance.
struct Processed {
    tooth: AnnotatedTooth,
    crop: RgbImage,
    tooth_mask: GrayImage,
    coverage: GrayImage,
}

/// Detection-to-annotation pipeline.
///
/// Owns its collaborators and configuration; nothing is shared between
/// pipeline values, so differently configured pipelines can coexist.
pub struct CalculusPipeline {
    config: AnalysisConfig,
    detector: Box<dyn ToothDetector>,
    model: Box<dyn CoverageModel>,
    renderer: OverlayRenderer,
    debug: Option<DebugConfig>,
}

impl CalculusPipeline {
    /// Pipeline with the built-in threshold detector and colour heuristic.
    pub fn new(config: AnalysisConfig) -> Self {
        let detector = Box::new(ThresholdDetector::new(config.detector.clone()));
        let model = Box::new(DiscolorationModel::new(config.discoloration.clone()));
        let renderer = OverlayRenderer::new(config.label.clone());
        Self {
            config,
            detector,
            model,
            renderer,
            debug: None,
        }
    }

    pub fn with_detector(mut self, detector: Box<dyn ToothDetector>) -> Self {
        self.detector = detector;
        self
    }

    pub fn with_coverage_model(mut self, model: Box<dyn CoverageModel>) -> Self {
        self.model = model;
        self
    }

    /// Enable debug mode with output directory
    /// The directory must be empty or non-existent
    pub fn with_debug(mut self, output_dir: PathBuf) -> Result<Self, AnalysisError> {
        if output_dir.exists() {
            let entries = std::fs::read_dir(&output_dir)?;
            if entries.count() > 0 {
                return Err(AnalysisError::Debug(std::io::Error::other(format!(
                    "debug directory is not empty: {}",
                    output_dir.display()
                ))));
            }
        } else {
            std::fs::create_dir_all(&output_dir)?;
        }

        self.debug = Some(DebugConfig { output_dir });
        Ok(self)
    }

    /// Run the pipeline on an image file and wrap the outcome in a report.
    ///
    /// Never fails: run-level errors become a failure report.
    pub fn run(&self, path: &Path) -> PipelineReport {
        match self.analyze(path) {
            Ok(report) => PipelineReport::Success(report),
            Err(e) => {
                log::error!("analysis of {} failed: {e}", path.display());
                if let Some(source) = std::error::Error::source(&e) {
                    log::debug!("caused by: {source}");
                }
                PipelineReport::Failure(FailureReport::new(e.to_string()))
            }
        }
    }

    /// Load, detect, annotate and persist; returns the success report.
    pub fn analyze(&self, path: &Path) -> Result<AnalysisReport, AnalysisError> {
        log::info!("loading image {}", path.display());
        let source = io::load_image(path)?;
        log::debug!("image loaded: {}x{}", source.width(), source.height());

        log::info!("running {}", self.detector.name());
        let masks = self.detector.detect(&source)?;
        log::info!("{} tooth instances detected", masks.len());

        let annotation = self.annotate(&source, &masks)?;

        let output_path = io::processed_path(path, &self.config.output_suffix);
        io::save_image(&annotation.image, &output_path)?;
        log::info!("processed image written to {}", output_path.display());

        Ok(AnalysisReport {
            success: true,
            teeth_detected: annotation.teeth.len(),
            average_calculus_coverage: round2(annotation.average_coverage),
            individual_results: annotation
                .teeth
                .into_iter()
                .map(|t| ToothResult {
                    calculus_percentage: round2(t.result.calculus_percentage),
                    ..t.result
                })
                .collect(),
            processed_image_path: output_path.display().to_string(),
            original_image_path: path.display().to_string(),
        })
    }

    /// Annotate a copy of `source` with one overlay per instance mask.
    ///
    /// Instances are processed in the given order; a later tooth overwrites
    /// an earlier one where their boxes overlap. That can erase part or all of
    /// an earlier label, whose `label` layout still records where it was
    /// drawn. Instances that cannot be
    /// processed are skipped and do not count towards the average.
    pub fn annotate(
        &self,
        source: &RgbImage,
        masks: &[GrayImage],
    ) -> Result<Annotation, AnalysisError> {
        let mut output = source.clone();
        let mut teeth: Vec<AnnotatedTooth> = Vec::new();

        for (index, mask) in masks.iter().enumerate() {
            let tooth_id = teeth.len() + 1;
            match self.process_instance(source, mask, tooth_id, &mut output) {
                Ok(processed) => {
                    log::debug!(
                        "instance {}: tooth {} covers {:.2}%",
                        index + 1,
                        tooth_id,
                        processed.tooth.result.calculus_percentage
                    );
                    self.save_debug_output(&processed)?;
                    teeth.push(processed.tooth);
                }
                Err(reason) => log::warn!("instance {} skipped: {reason}", index + 1),
            }
        }

        let average_coverage = if teeth.is_empty() {
            0.0
        } else {
            teeth
                .iter()
                .map(|t| t.result.calculus_percentage)
                .sum::<f64>()
                / teeth.len() as f64
        };

        Ok(Annotation {
            image: output,
            teeth,
            average_coverage,
        })
    }

    fn process_instance(
        &self,
        source: &RgbImage,
        mask: &GrayImage,
        tooth_id: usize,
        output: &mut RgbImage,
    ) -> Result<Processed, SkipReason> {
        let (width, height) = source.dimensions();
        let mask = resample_mask_if_needed(mask, (width, height));

        let bbox = bounding_box_from_mask(&mask, self.config.padding, height, width).ok_or_else(
            || {
                if count_nonzero(&mask) == 0 {
                    SkipReason::EmptyMask
                } else {
                    SkipReason::DegenerateBox
                }
            },
        )?;

        let crop = crop_rgb(source, &bbox);
        let tooth_mask = crop_mask(&mask, &bbox);

        let normalized = normalize_crop(&crop, self.config.normalize_size);
        let predicted = self
            .model
            .predict(&normalized)
            .map_err(|e| SkipReason::Model(format!("{e:#}")))?;
        let coverage = resample_mask_if_needed(&predicted, crop.dimensions()).into_owned();

        let percent = estimate_coverage(&tooth_mask, &coverage)?;
        let anchor = bbox.to_global(center_of_mass(&tooth_mask));

        let label = self.renderer.render(
            output,
            &ToothOverlay {
                bbox,
                source_crop: &crop,
                coverage: &coverage,
                percent,
                anchor,
            },
        );

        Ok(Processed {
            tooth: AnnotatedTooth {
                result: ToothResult {
                    tooth_id,
                    calculus_percentage: percent,
                    bounding_box: bbox,
                },
                label,
            },
            crop,
            tooth_mask,
            coverage,
        })
    }

    /// Save per-tooth intermediates if debug mode is enabled
    fn save_debug_output(&self, processed: &Processed) -> Result<(), AnalysisError> {
        let Some(debug_config) = &self.debug else {
            return Ok(());
        };

        let root = &debug_config.output_dir;
        let filename = format!("{:02}.png", processed.tooth.result.tooth_id);

        let path = debug_path(root, DEBUG_CROPS, &filename)?;
        processed.crop.save(&path).map_err(|e| debug_save_error(&path, e))?;
        let path = debug_path(root, DEBUG_TOOTH_MASKS, &filename)?;
        processed.tooth_mask.save(&path).map_err(|e| debug_save_error(&path, e))?;
        let path = debug_path(root, DEBUG_COVERAGE_MASKS, &filename)?;
        processed.coverage.save(&path).map_err(|e| debug_save_error(&path, e))?;

        log::debug!("debug: saved {filename} for tooth {}", processed.tooth.result.tooth_id);
        Ok(())
    }
}

/// Create the step directory and return the file path inside it.
fn debug_path(root: &Path, step: &str, filename: &str) -> Result<PathBuf, AnalysisError> {
    let step_dir = root.join(step);
    std::fs::create_dir_all(&step_dir)?;
    Ok(step_dir.join(filename))
}

fn debug_save_error(path: &Path, e: image::ImageError) -> AnalysisError {
    AnalysisError::Debug(std::io::Error::other(format!(
        "failed to save debug image {}: {e}",
        path.display()
    )))
}

impl Default for CalculusPipeline {
    fn default() -> Self {
        Self::new(AnalysisConfig::default())
    }
}
