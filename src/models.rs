use serde::{Deserialize, Serialize};

/// Axis-aligned box in image-global pixel coordinates.
///
/// Ends are exclusive: the box covers columns `x1..x2` and rows `y1..y2`.
/// A well-formed box satisfies `x1 < x2` and `y1 < y2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "[u32; 4]", try_from = "[u32; 4]")]
pub struct BoundingBox {
    pub x1: u32,
    pub y1: u32,
    pub x2: u32,
    pub y2: u32,
}

impl BoundingBox {
    /// Build a box, rejecting empty extents.
    pub fn new(x1: u32, y1: u32, x2: u32, y2: u32) -> Option<Self> {
        if x1 < x2 && y1 < y2 {
            Some(Self { x1, y1, x2, y2 })
        } else {
            None
        }
    }

    pub fn width(&self) -> u32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> u32 {
        self.y2 - self.y1
    }

    /// Geometric centre, in image-global coordinates.
    pub fn center(&self) -> (u32, u32) {
        ((self.x1 + self.x2) / 2, (self.y1 + self.y2) / 2)
    }

    /// True if `other` lies entirely inside `self`.
    pub fn contains_box(&self, other: &BoundingBox) -> bool {
        other.x1 >= self.x1 && other.y1 >= self.y1 && other.x2 <= self.x2 && other.y2 <= self.y2
    }

    pub fn contains_point(&self, x: u32, y: u32) -> bool {
        x >= self.x1 && x < self.x2 && y >= self.y1 && y < self.y2
    }

    /// Convert a crop-local point to image-global coordinates.
    pub fn to_global(&self, (x, y): (u32, u32)) -> (u32, u32) {
        (self.x1 + x, self.y1 + y)
    }

    /// Convert an image-global point to crop-local coordinates.
    ///
    /// Returns `None` for points outside the box.
    pub fn to_local(&self, (x, y): (u32, u32)) -> Option<(u32, u32)> {
        if self.contains_point(x, y) {
            Some((x - self.x1, y - self.y1))
        } else {
            None
        }
    }
}

impl From<BoundingBox> for [u32; 4] {
    fn from(b: BoundingBox) -> Self {
        [b.x1, b.y1, b.x2, b.y2]
    }
}

impl TryFrom<[u32; 4]> for BoundingBox {
    type Error = String;

    fn try_from([x1, y1, x2, y2]: [u32; 4]) -> Result<Self, Self::Error> {
        BoundingBox::new(x1, y1, x2, y2)
            .ok_or_else(|| format!("empty bounding box [{x1}, {y1}, {x2}, {y2}]"))
    }
}

/// Per-tooth outcome, one per successfully processed instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToothResult {
    pub tooth_id: usize,
    pub calculus_percentage: f64,
    pub bounding_box: BoundingBox,
}

/// Report of a completed analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub success: bool,
    pub teeth_detected: usize,
    pub average_calculus_coverage: f64,
    pub individual_results: Vec<ToothResult>,
    pub processed_image_path: String,
    pub original_image_path: String,
}

/// Report of a run that aborted before producing results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureReport {
    pub success: bool,
    pub error: String,
}

impl FailureReport {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
        }
    }
}

/// The single externally visible result of one invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PipelineReport {
    Success(AnalysisReport),
    Failure(FailureReport),
}

impl PipelineReport {
    pub fn is_success(&self) -> bool {
        matches!(self, PipelineReport::Success(_))
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Round to two decimal places, the precision used in reports.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
