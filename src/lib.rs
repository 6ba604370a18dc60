//! Perception core for a mobile robot's vision pipeline.
//!
//! Two decoupled state machines share one frame-ordering contract:
//!
//! - [`tracker`]: turns per-frame detections into stable track identities
//!   (constant-velocity Kalman prediction, gated minimum-cost assignment,
//!   Tentative/Confirmed/Deleted lifecycle) and a cumulative unique-ID count.
//! - [`debounce`]: turns a noisy region coefficient into discrete
//!   Pressed/Released events with hysteresis and a cooldown.
//!
//! [`integration`] wires both behind collaborator traits into an owned
//! [`PerceptionPipeline`].

pub mod debounce;
pub mod error;
pub mod integration;
pub mod tracker;

pub use debounce::{ButtonState, DebounceConfig, DebounceEvent, EventDebouncer, RegionSample};
pub use error::{ConfigError, InputError, PipelineError, StateInvariantViolation};
pub use integration::{
    DetectionBuilder, DetectionSource, Frame, FrameInput, FrameReport, FrameSource,
    PerceptionCore, PerceptionPipeline, PipelineConfig, RedRegionConfig, RedRegionExtractor,
    RegionError, RegionSignalSource,
};
pub use tracker::{
    Detection, FrameUpdate, IdentityCounter, Rect, TentativeMissPolicy, Track, TrackManager,
    TrackSnapshot, TrackState, TrackerConfig,
};

#[cfg(feature = "burn-backend")]
pub use integration::{BurnDetector, BurnDetectorError, BurnModel, RawDetection};
