use image::{GrayImage, ImageBuffer, Luma};
use imageproc::region_labelling::{connected_components, Connectivity};
use std::collections::HashMap;

/// One 8-connected foreground region of a binary image.
#[derive(Debug, Clone)]
pub struct Region {
    pub label: u32,
    /// Raster position of the first pixel seen, used for ordering.
    pub first: (u32, u32),
    pub pixel_count: u32,
    labels: std::sync::Arc<ImageBuffer<Luma<u32>, Vec<u32>>>,
}

impl Region {
    /// Full-resolution binary mask of this region.
    pub fn mask(&self) -> GrayImage {
        GrayImage::from_fn(self.labels.width(), self.labels.height(), |x, y| {
            if self.labels.get_pixel(x, y)[0] == self.label {
                Luma([255])
            } else {
                Luma([0])
            }
        })
    }
}

/// Label connected components of `binary` and keep those with at least
/// `min_area` pixels, ordered by their first pixel in raster order.
pub fn find_regions(binary: &GrayImage, min_area: u32) -> Vec<Region> {
    let labeled = std::sync::Arc::new(connected_components(
        binary,
        Connectivity::Eight,
        Luma([0]),
    ));

    // label -> (first_x, first_y, count)
    let mut regions: HashMap<u32, (u32, u32, u32)> = HashMap::new();
    for (x, y, label) in labeled.enumerate_pixels() {
        let label_val = label[0];
        if label_val == 0 {
            continue; // Skip background
        }
        regions
            .entry(label_val)
            .and_modify(|(_, _, count)| *count += 1)
            .or_insert((x, y, 1));
    }

    let mut kept: Vec<Region> = regions
        .into_iter()
        .filter(|(_, (_, _, count))| *count >= min_area)
        .map(|(label, (x, y, count))| Region {
            label,
            first: (x, y),
            pixel_count: count,
            labels: labeled.clone(),
        })
        .collect();
    kept.sort_by_key(|r| (r.first.1, r.first.0));
    kept
}

pub fn region_masks(regions: &[Region]) -> Vec<GrayImage> {
    regions.iter().map(Region::mask).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regions_are_counted_and_ordered() {
        let binary = GrayImage::from_fn(20, 20, |x, y| {
            let a = (12..16).contains(&x) && (2..5).contains(&y);
            let b = (1..4).contains(&x) && (10..18).contains(&y);
            let speck = x == 8 && y == 8;
            Luma([if a || b || speck { 255 } else { 0 }])
        });
        let regions = find_regions(&binary, 2);
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0].first, (12, 2));
        assert_eq!(regions[0].pixel_count, 12);
        assert_eq!(regions[1].pixel_count, 24);

        let mask = regions[1].mask();
        assert_eq!(mask.get_pixel(2, 12)[0], 255);
        assert_eq!(mask.get_pixel(13, 3)[0], 0);
    }
}
