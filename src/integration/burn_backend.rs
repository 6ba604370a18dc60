//! Burn inference backend acting as the detection adapter.
//!
//! # Example
//!
//! ```ignore
//! use robovision_track::{BurnDetector, BurnModel, RawDetection};
//! use burn::backend::NdArray;
//!
//! struct MyYoloModel { /* ... */ }
//!
//! impl BurnModel<NdArray> for MyYoloModel {
//!     fn forward(&self, input: burn::tensor::Tensor<NdArray, 4>) -> Vec<RawDetection> {
//!         // Run inference
//!     }
//! }
//!
//! let detector = BurnDetector::new(MyYoloModel::load("best.bin"), Default::default())
//!     .with_conf_threshold(0.5);
//! ```

use burn::prelude::*;
use burn::tensor::Tensor;
use thiserror::Error;
use tracing::trace;

use super::{DetectionBuilder, DetectionSource, Frame};
use crate::tracker::Detection;

/// Error type for Burn detection failures.
#[derive(Debug, Clone, Error)]
pub enum BurnDetectorError {
    #[error("invalid input dimensions: expected {expected:?}, got {got:?}")]
    InvalidInputDimensions {
        expected: (u32, u32, u32),
        got: (u32, u32, u32),
    },
    #[error("preprocessing error: {0}")]
    PreprocessingError(String),
}

/// Raw detection output from the model after its own NMS.
#[derive(Debug, Clone)]
pub struct RawDetection {
    /// `[x1, y1, x2, y2]` or `[cx, cy, w, h]` depending on the model
    pub bbox: [f32; 4],
    pub score: f32,
    pub class_id: Option<usize>,
    /// Appearance embedding, for models with a re-identification head
    pub embedding: Option<Vec<f32>>,
}

/// Trait for Burn-based detection models.
pub trait BurnModel<B: Backend>: Send + Sync {
    /// Run forward pass on a `[batch, channels, height, width]` tensor.
    fn forward(&self, input: Tensor<B, 4>) -> Vec<RawDetection>;

    /// Expected input size (channels, height, width).
    fn input_size(&self) -> (u32, u32, u32) {
        (3, 640, 640)
    }

    /// Whether bbox output is center/size (vs corners).
    fn bbox_is_xywh(&self) -> bool {
        true
    }
}

/// Burn-based object detector implementing `DetectionSource`.
pub struct BurnDetector<B: Backend, M: BurnModel<B>> {
    model: M,
    device: B::Device,
    conf_threshold: f32,
}

impl<B: Backend, M: BurnModel<B>> BurnDetector<B, M> {
    pub fn new(model: M, device: B::Device) -> Self {
        Self {
            model,
            device,
            conf_threshold: 0.5,
        }
    }

    /// Detections below this confidence never reach the tracker.
    pub fn with_conf_threshold(mut self, threshold: f32) -> Self {
        self.conf_threshold = threshold;
        self
    }

    /// Convert an RGB8 frame into a normalized `[1, C, H, W]` tensor.
    pub fn preprocess(&self, frame: &Frame) -> Result<Tensor<B, 4>, BurnDetectorError> {
        let (channels, target_h, target_w) = self.model.input_size();
        let (width, height) = (frame.width, frame.height);
        let row_len = height as usize * channels as usize;
        let expected_len = row_len * width as usize;

        if frame.data.len() != expected_len {
            let got_width = frame.data.len() / row_len.max(1);
            return Err(BurnDetectorError::InvalidInputDimensions {
                expected: (channels, height, width),
                got: (channels, height, u32::try_from(got_width).unwrap_or(u32::MAX)),
            });
        }
        if height != target_h || width != target_w {
            return Err(BurnDetectorError::PreprocessingError(format!(
                "frame {}x{} does not match model input {}x{}",
                width, height, target_w, target_h
            )));
        }

        // Interleaved HWC bytes to planar CHW floats in [0, 1].
        let (h, w, c) = (height as usize, width as usize, channels as usize);
        let mut planar = vec![0f32; frame.data.len()];
        for (i, &byte) in frame.data.iter().enumerate() {
            let (pixel, ch) = (i / c, i % c);
            planar[ch * h * w + pixel] = byte as f32 / 255.0;
        }

        Ok(Tensor::<B, 1>::from_floats(planar.as_slice(), &self.device).reshape([1, c, h, w]))
    }

    fn postprocess(&self, raw_detections: Vec<RawDetection>) -> Vec<Detection> {
        raw_detections
            .into_iter()
            .filter(|d| d.score >= self.conf_threshold)
            .map(|d| {
                let [a, b, c, e] = d.bbox;
                let mut builder = DetectionBuilder::new()
                    .score(d.score)
                    .class_id(d.class_id.unwrap_or(0) as u32);
                builder = if self.model.bbox_is_xywh() {
                    builder.xywh(a, b, c, e)
                } else {
                    builder.tlbr(a, b, c, e)
                };
                if let Some(embedding) = d.embedding {
                    builder = builder.feature(embedding);
                }
                builder.build()
            })
            .collect()
    }
}

impl<B: Backend, M: BurnModel<B>> DetectionSource for BurnDetector<B, M> {
    type Error = BurnDetectorError;

    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>, Self::Error> {
        let tensor = self.preprocess(frame)?;
        let raw_detections = self.model.forward(tensor);
        let detections = self.postprocess(raw_detections);
        trace!(count = detections.len(), "burn detections");
        Ok(detections)
    }
}
