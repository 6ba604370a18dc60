//! Builder for creating Detection objects from various input formats.

use crate::error::InputError;
use crate::tracker::Detection;

/// Builder for creating `Detection` objects from various input formats.
#[derive(Debug, Clone, Default)]
pub struct DetectionBuilder {
    x1: f32,
    y1: f32,
    x2: f32,
    y2: f32,
    score: f32,
    class_id: u32,
    feature: Option<Vec<f32>>,
}

impl DetectionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set bounding box corners (x1, y1, x2, y2).
    pub fn tlbr(mut self, x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        self.x1 = x1;
        self.y1 = y1;
        self.x2 = x2;
        self.y2 = y2;
        self
    }

    /// Set bounding box from center and size.
    pub fn xywh(self, cx: f32, cy: f32, w: f32, h: f32) -> Self {
        self.tlbr(cx - w / 2.0, cy - h / 2.0, cx + w / 2.0, cy + h / 2.0)
    }

    /// Set bounding box from top-left corner and size.
    pub fn tlwh(self, x: f32, y: f32, w: f32, h: f32) -> Self {
        self.tlbr(x, y, x + w, y + h)
    }

    pub fn score(mut self, score: f32) -> Self {
        self.score = score;
        self
    }

    pub fn class_id(mut self, class_id: u32) -> Self {
        self.class_id = class_id;
        self
    }

    pub fn feature(mut self, feature: Vec<f32>) -> Self {
        self.feature = Some(feature);
        self
    }

    /// Build without validation. The tracker drops malformed detections.
    pub fn build(self) -> Detection {
        let det = Detection::new(self.x1, self.y1, self.x2, self.y2, self.score)
            .with_class(self.class_id);
        match self.feature {
            Some(feature) => det.with_feature(feature),
            None => det,
        }
    }

    /// Build and validate.
    pub fn try_build(self) -> Result<Detection, InputError> {
        let det = self.build();
        det.validate()?;
        Ok(det)
    }
}
