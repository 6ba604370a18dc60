//! Integration with the collaborators around the perception core.
//!
//! This module provides the traits the pipeline pulls frames, detections
//! and region coefficients through, a reference red-region extractor, and
//! the owned [`PerceptionPipeline`] context.

mod builder;
mod detector;
mod pipeline;
mod region;

pub use builder::DetectionBuilder;
pub use detector::{DetectionSource, Frame, FrameInput, FrameSource, RegionSignalSource};
pub use pipeline::{FrameReport, PerceptionCore, PerceptionPipeline, PipelineConfig};
pub use region::{RedRegionConfig, RedRegionExtractor, RegionError, Roi};

#[cfg(feature = "burn-backend")]
mod burn_backend;

#[cfg(feature = "burn-backend")]
pub use burn_backend::{BurnDetector, BurnDetectorError, BurnModel, RawDetection};
