mod common;

use approx::assert_abs_diff_eq;
use common::*;
use image::{GrayImage, Luma, Rgb, RgbImage};
use toothscan::{
    BoundingBox, CalculusPipeline, CoverageModel, DetectorError, EmptyCoverageModel,
    PipelineReport, PrecomputedDetector, ToothDetector,
};

/// Flags the top-left quadrant of every crop.
struct QuadrantModel;

impl CoverageModel for QuadrantModel {
    fn predict(&self, crop: &RgbImage) -> anyhow::Result<GrayImage> {
        let (w, h) = crop.dimensions();
        Ok(GrayImage::from_fn(w, h, |x, y| {
            Luma([if x < w / 2 && y < h / 2 { 255 } else { 0 }])
        }))
    }

    fn name(&self) -> &str {
        "Quadrant"
    }
}

/// Always fails, as a broken segmentation backend would.
struct BrokenDetector;

impl ToothDetector for BrokenDetector {
    fn detect(&self, _image: &RgbImage) -> Result<Vec<GrayImage>, DetectorError> {
        Err(DetectorError::Failed("backend unavailable".into()))
    }

    fn name(&self) -> &str {
        "Broken"
    }
}

fn pipeline_with(masks: Vec<GrayImage>, model: Box<dyn CoverageModel>) -> CalculusPipeline {
    CalculusPipeline::default()
        .with_detector(Box::new(PrecomputedDetector::new(masks)))
        .with_coverage_model(model)
}

#[test]
fn no_teeth_is_a_successful_empty_report() -> anyhow::Result<()> {
    let source = gradient_image();
    let (dir, path) = write_png(&source, "mouth.png");

    let report = pipeline_with(vec![], Box::new(EmptyCoverageModel)).run(&path);
    let PipelineReport::Success(report) = report else {
        panic!("expected a success report");
    };
    assert_eq!(report.teeth_detected, 0);
    assert_eq!(report.average_calculus_coverage, 0.0);
    assert!(report.individual_results.is_empty());

    let processed_path = dir.path().join("mouth_processed.png");
    assert_eq!(report.processed_image_path, processed_path.display().to_string());
    assert_eq!(report.original_image_path, path.display().to_string());
    assert_eq!(image::open(&processed_path)?.to_rgb8(), source);
    Ok(())
}

#[test]
fn single_tooth_without_coverage_reads_zero() -> anyhow::Result<()> {
    let source = gradient_image();
    let (_dir, path) = write_png(&source, "one.png");

    let pipeline = pipeline_with(vec![tooth_at_10_10_110_110()], Box::new(EmptyCoverageModel));
    let report = pipeline.analyze(&path)?;
    assert_eq!(report.teeth_detected, 1);
    let tooth = &report.individual_results[0];
    assert_eq!(tooth.tooth_id, 1);
    assert_eq!(tooth.calculus_percentage, 0.0);
    let b = tooth.bounding_box;
    assert_eq!([b.x1, b.y1, b.x2, b.y2], [10, 10, 110, 110]);

    // The label "0.0%" is drawn inside the tooth's box.
    let annotation = pipeline.annotate(&source, &[tooth_at_10_10_110_110()])?;
    let label = annotation.teeth[0].label.as_ref().expect("label should fit");
    assert!(b.contains_box(&label.rect));
    let yellow = Rgb([255, 255, 0]);
    let yellow_pixels: Vec<(u32, u32)> = annotation
        .image
        .enumerate_pixels()
        .filter(|(_, _, p)| **p == yellow)
        .map(|(x, y, _)| (x, y))
        .collect();
    assert!(!yellow_pixels.is_empty());
    assert!(yellow_pixels.iter().all(|&(x, y)| label.rect.contains_point(x, y)));
    Ok(())
}

#[test]
fn missing_image_produces_failure_report() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("absent.png");
    let report = CalculusPipeline::default().run(&path);
    let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
    assert_eq!(json["success"], false);
    assert_eq!(
        json["error"],
        format!("Could not load image from {}", path.display())
    );
    assert!(json.get("individual_results").is_none());
    assert!(!dir.path().join("absent_processed.png").exists());
}

#[test]
fn output_matches_source_outside_boxes() -> anyhow::Result<()> {
    let source = gradient_image();
    let masks = vec![
        rect_mask(30, 30, 90, 90),
        rect_mask(120, 40, 170, 160),
        GrayImage::new(200, 200),
    ];
    let pipeline = pipeline_with(masks.clone(), Box::new(QuadrantModel));
    let annotation = pipeline.annotate(&source, &masks)?;
    assert_eq!(annotation.teeth.len(), 2);

    let boxes: Vec<_> = annotation.teeth.iter().map(|t| t.result.bounding_box).collect();
    for (x, y, p) in annotation.image.enumerate_pixels() {
        if !boxes.iter().any(|b| b.contains_point(x, y)) {
            assert_eq!(p, source.get_pixel(x, y), "pixel ({x}, {y}) changed");
        }
    }
    // The coverage actually painted something inside the boxes.
    assert_ne!(annotation.image, source);
    Ok(())
}

#[test]
fn labels_stay_inside_their_own_boxes() -> anyhow::Result<()> {
    let source = gradient_image();
    let masks = vec![
        rect_mask(0, 0, 12, 12),
        rect_mask(30, 30, 90, 90),
        rect_mask(150, 150, 200, 200),
        rect_mask(100, 5, 103, 8),
    ];
    let annotation = pipeline_with(masks.clone(), Box::new(QuadrantModel)).annotate(&source, &masks)?;
    assert_eq!(annotation.teeth.len(), 4);
    for tooth in &annotation.teeth {
        if let Some(label) = &tooth.label {
            assert!(tooth.result.bounding_box.contains_box(&label.rect));
        }
    }

    // The 100x100 box around the 60x60 tooth has room for its label.
    let large = annotation
        .teeth
        .iter()
        .find(|t| t.result.bounding_box == BoundingBox::new(10, 10, 110, 110).unwrap())
        .expect("tooth at 30..90 should be annotated");
    assert!(large.label.is_some());
    Ok(())
}

#[test]
fn unwritable_output_produces_failure_report() {
    let (dir, path) = write_png(&gradient_image(), "blocked.png");
    let processed_path = dir.path().join("blocked_processed.png");
    std::fs::create_dir(&processed_path).unwrap();

    let report = pipeline_with(vec![tooth_at_10_10_110_110()], Box::new(EmptyCoverageModel))
        .run(&path);
    assert!(!report.is_success());

    let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
    assert_eq!(json["success"], false);
    let error = json["error"].as_str().unwrap();
    assert!(
        error.starts_with(&format!(
            "Could not write processed image to {}",
            processed_path.display()
        )),
        "{error}"
    );
    assert!(json.get("individual_results").is_none());
}

#[test]
fn detector_failure_produces_failure_report() {
    let (dir, path) = write_png(&gradient_image(), "mouth.png");

    let report = CalculusPipeline::default()
        .with_detector(Box::new(BrokenDetector))
        .run(&path);
    let PipelineReport::Failure(failure) = &report else {
        panic!("expected a failure report");
    };
    assert!(!failure.success);
    assert_eq!(failure.error, "detector failed: backend unavailable");

    let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
    assert!(json.get("teeth_detected").is_none());
    assert!(!dir.path().join("mouth_processed.png").exists());
}

#[test]
fn report_average_is_mean_of_results() -> anyhow::Result<()> {
    let source = gradient_image();
    let (_dir, path) = write_png(&source, "avg.png");
    let masks = vec![
        rect_mask(20, 20, 70, 90),
        rect_mask(110, 30, 180, 60),
        rect_mask(100, 120, 190, 190),
    ];
    let report = pipeline_with(masks, Box::new(QuadrantModel)).analyze(&path)?;
    assert_eq!(report.teeth_detected, 3);

    let mean = report
        .individual_results
        .iter()
        .map(|t| t.calculus_percentage)
        .sum::<f64>()
        / report.teeth_detected as f64;
    assert_abs_diff_eq!(report.average_calculus_coverage, mean, epsilon = 0.011);
    for tooth in &report.individual_results {
        assert!(tooth.calculus_percentage > 0.0 && tooth.calculus_percentage <= 100.0);
        // Two decimals at most.
        let scaled = tooth.calculus_percentage * 100.0;
        assert_abs_diff_eq!(scaled, scaled.round(), epsilon = 1e-6);
    }
    Ok(())
}

#[test]
fn later_instances_win_in_overlaps() -> anyhow::Result<()> {
    let source = gradient_image();
    let first = rect_mask(30, 30, 90, 90);
    let second = rect_mask(60, 60, 120, 120);

    let pipeline = pipeline_with(vec![], Box::new(QuadrantModel));
    let both = pipeline.annotate(&source, &[first.clone(), second.clone()])?;
    let only_second = pipeline.annotate(&source, &[second])?;

    let b = only_second.teeth[0].result.bounding_box;
    for y in b.y1..b.y2 {
        for x in b.x1..b.x2 {
            assert_eq!(both.image.get_pixel(x, y), only_second.image.get_pixel(x, y));
        }
    }

    // The first label sits where the second box was redrawn, yet its layout
    // is still reported.
    let first_label = both.teeth[0].label.as_ref().expect("first label should fit");
    assert!(b.contains_point(first_label.rect.x2 - 1, first_label.rect.y2 - 1));
    Ok(())
}
