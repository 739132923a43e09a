//! Per-tooth annotation: coverage tint and percentage label.

pub mod glyphs;

use image::{GrayImage, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut};
use imageproc::pixelops::weighted_sum;
use imageproc::rect::Rect;

use crate::config::LabelConfig;
use crate::geometry::resample_mask_if_needed;
use crate::models::BoundingBox;
use glyphs::{GLYPH_HEIGHT, GLYPH_SPACING, GLYPH_WIDTH};

const RED: Rgb<u8> = Rgb([255, 0, 0]);
const PURPLE: Rgb<u8> = Rgb([255, 0, 127]);
/// (source weight, tint weight) of the red pass.
const RED_BLEND: (f32, f32) = (0.6, 0.9);
/// (previous weight, tint weight) of the purple pass.
const PURPLE_BLEND: (f32, f32) = (0.7, 0.3);

const LABEL_BACKGROUND: Rgb<u8> = Rgb([0, 0, 0]);
const LABEL_BORDER: Rgb<u8> = Rgb([255, 255, 255]);
const LABEL_TEXT: Rgb<u8> = Rgb([255, 255, 0]);

/// Glyph cell size in pixels per unit of font scale.
const PIXELS_PER_SCALE: f32 = 3.0;

/// Everything needed to annotate one tooth.
pub struct ToothOverlay<'a> {
    pub bbox: BoundingBox,
    /// Box region of the unmodified source image.
    pub source_crop: &'a RgbImage,
    /// Crop-local coverage mask.
    pub coverage: &'a GrayImage,
    pub percent: f64,
    /// Preferred label centre, image-global.
    pub anchor: (u32, u32),
}

/// Where and how large a label is drawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelLayout {
    /// Outer extent of the label, border included, image-global.
    pub rect: BoundingBox,
    /// Glyph cell size in pixels.
    pub unit: u32,
    pub padding: u32,
    pub border: u32,
}

pub struct OverlayRenderer {
    label: LabelConfig,
}

impl OverlayRenderer {
    pub fn new(label: LabelConfig) -> Self {
        Self { label }
    }

    /// Annotate one tooth on `output`.
    ///
    /// The whole box region of `output` is rewritten from the source crop,
    /// so re-rendering the same tooth gives the same pixels and a later tooth
    /// overwrites an earlier one where their boxes overlap. Nothing outside
    /// `overlay.bbox` is touched.
    ///
    /// Returns the label layout, or `None` when no label fits in the box.
    pub fn render(&self, output: &mut RgbImage, overlay: &ToothOverlay<'_>) -> Option<LabelLayout> {
        let bbox = overlay.bbox;
        let crop_dims = (bbox.width(), bbox.height());
        let coverage = resample_mask_if_needed(overlay.coverage, crop_dims);

        let tinted = tint(overlay.source_crop, &coverage);
        image::imageops::replace(output, &tinted, bbox.x1.into(), bbox.y1.into());

        let text = format_label(overlay.percent);
        let layout = self.layout_label(&text, &bbox, overlay.anchor);
        match &layout {
            Some(layout) => draw_label(output, &text, layout),
            None => log::debug!(
                "label {text} does not fit in {}x{} box at ({}, {})",
                bbox.width(),
                bbox.height(),
                bbox.x1,
                bbox.y1
            ),
        }
        layout
    }

    /// Font scale for a tooth box: proportional to its shorter side,
    /// clamped to the configured range.
    pub fn font_scale(&self, bbox: &BoundingBox) -> f32 {
        let side = bbox.width().min(bbox.height()) as f32;
        (side / self.label.scale_divisor).clamp(self.label.min_scale, self.label.max_scale)
    }

    /// Size and position a label so that its full extent stays inside `bbox`.
    ///
    /// The label is centred on `anchor` and then shifted into the box. If it
    /// is too large at the preferred scale, the glyph unit shrinks until it
    /// fits.
    pub fn layout_label(
        &self,
        text: &str,
        bbox: &BoundingBox,
        anchor: (u32, u32),
    ) -> Option<LabelLayout> {
        let preferred = (self.font_scale(bbox) * PIXELS_PER_SCALE).round().max(1.0) as u32;
        let text_cells = glyphs::text_width_cells(text);

        for unit in (1..=preferred).rev() {
            let padding = (unit * 8 / 3).max(2);
            let border = unit.div_ceil(2);
            let margin = padding + border;
            let width = text_cells * unit + 2 * margin;
            let height = GLYPH_HEIGHT * unit + 2 * margin;
            if width > bbox.width() || height > bbox.height() {
                continue;
            }

            let left = anchor
                .0
                .saturating_sub(width / 2)
                .clamp(bbox.x1, bbox.x2 - width);
            let top = anchor
                .1
                .saturating_sub(height / 2)
                .clamp(bbox.y1, bbox.y2 - height);
            let rect = BoundingBox::new(left, top, left + width, top + height)?;
            return Some(LabelLayout {
                rect,
                unit,
                padding,
                border,
            });
        }
        None
    }
}

/// Label text for a coverage percentage.
pub fn format_label(percent: f64) -> String {
    format!("{percent:.1}%")
}

/// Blend the red and purple tints into flagged pixels of `crop`.
///
/// `coverage` must have the crop's dimensions. Unflagged pixels are copied
/// unchanged.
pub fn tint(crop: &RgbImage, coverage: &GrayImage) -> RgbImage {
    let mut out = crop.clone();
    for (pixel, flag) in out.pixels_mut().zip(coverage.pixels()) {
        if flag[0] == 0 {
            continue;
        }
        let red = weighted_sum(*pixel, RED, RED_BLEND.0, RED_BLEND.1);
        *pixel = weighted_sum(red, PURPLE, PURPLE_BLEND.0, PURPLE_BLEND.1);
    }
    out
}

fn draw_label(output: &mut RgbImage, text: &str, layout: &LabelLayout) {
    let rect = &layout.rect;
    draw_filled_rect_mut(
        output,
        Rect::at(rect.x1 as i32, rect.y1 as i32).of_size(rect.width(), rect.height()),
        LABEL_BACKGROUND,
    );
    for t in 0..layout.border {
        let w = rect.width().saturating_sub(2 * t);
        let h = rect.height().saturating_sub(2 * t);
        if w == 0 || h == 0 {
            break;
        }
        draw_hollow_rect_mut(
            output,
            Rect::at((rect.x1 + t) as i32, (rect.y1 + t) as i32).of_size(w, h),
            LABEL_BORDER,
        );
    }

    let unit = layout.unit;
    let origin_x = rect.x1 + layout.border + layout.padding;
    let origin_y = rect.y1 + layout.border + layout.padding;
    for (i, c) in text.chars().enumerate() {
        let glyph_x = origin_x + i as u32 * (GLYPH_WIDTH + GLYPH_SPACING) * unit;
        for row in 0..GLYPH_HEIGHT {
            for col in 0..GLYPH_WIDTH {
                if glyphs::is_set(c, col, row) {
                    draw_filled_rect_mut(
                        output,
                        Rect::at((glyph_x + col * unit) as i32, (origin_y + row * unit) as i32)
                            .of_size(unit, unit),
                        LABEL_TEXT,
                    );
                }
            }
        }
    }
}
