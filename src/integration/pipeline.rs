//! Owned per-session pipeline context combining detection, tracking,
//! identity counting, and button debouncing.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{DetectionSource, Frame, FrameInput, FrameSource, RegionSignalSource};
use crate::debounce::{DebounceConfig, DebounceEvent, EventDebouncer, RegionSample};
use crate::error::{ConfigError, PipelineError, StateInvariantViolation};
use crate::tracker::{Detection, IdentityCounter, TrackManager, TrackSnapshot, TrackerConfig};

/// Initialization-time configuration for the whole pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub tracker: TrackerConfig,
    pub debounce: DebounceConfig,
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.tracker.validate()?;
        self.debounce.validate()
    }
}

/// Everything the consumer sees for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport {
    pub frame_id: u64,
    /// No detection batch was available; tracks aged by one miss.
    pub skipped: bool,
    /// Currently Confirmed tracks, ascending by ID.
    pub confirmed: Vec<TrackSnapshot>,
    pub newly_confirmed: Vec<u64>,
    pub deleted: Vec<u64>,
    /// Cumulative number of distinct confirmed IDs.
    pub unique_count: usize,
    pub rejected_detections: usize,
    /// Debounce transition emitted this frame, if any.
    pub event: Option<DebounceEvent>,
    pub pressed: bool,
}

/// The frame-synchronous core: tracker, identity counter, debouncer.
///
/// Frames must be fed in strict arrival order. Nothing here is shared or
/// locked; the caller's loop owns it.
pub struct PerceptionCore {
    tracker: TrackManager,
    counter: IdentityCounter,
    debouncer: EventDebouncer,
}

impl PerceptionCore {
    pub fn new(config: PipelineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            tracker: TrackManager::new(config.tracker)?,
            counter: IdentityCounter::new(),
            debouncer: EventDebouncer::new(config.debounce)?,
        })
    }

    /// Process one frame slot. `None` detections means the batch was
    /// unavailable; `None` sample means no coefficient this frame.
    pub fn step(
        &mut self,
        detections: Option<Vec<Detection>>,
        sample: Option<RegionSample>,
    ) -> Result<FrameReport, StateInvariantViolation> {
        let update = match detections {
            Some(detections) => self.tracker.update(detections)?,
            None => self.tracker.skip_frame()?,
        };
        self.counter.observe(&update.confirmed);

        let event = match sample {
            Some(sample) => match self.debouncer.update(sample) {
                Ok(event) => event,
                Err(err) => {
                    warn!(frame = update.frame_id, %err, "dropping region sample");
                    None
                }
            },
            None => None,
        };

        Ok(FrameReport {
            frame_id: update.frame_id,
            skipped: update.skipped,
            confirmed: update.confirmed,
            newly_confirmed: update.newly_confirmed,
            deleted: update.deleted,
            unique_count: self.counter.count(),
            rejected_detections: update.rejected,
            event,
            pressed: self.debouncer.is_pressed(),
        })
    }

    /// Explicit session reinitialization: clears tracks, the unique-ID
    /// count, and the debouncer. Track IDs are still never reissued.
    pub fn reset_session(&mut self) {
        self.tracker.reset();
        self.counter.reset();
        self.debouncer.reset();
    }

    pub fn tracker(&self) -> &TrackManager {
        &self.tracker
    }

    pub fn counter(&self) -> &IdentityCounter {
        &self.counter
    }

    pub fn debouncer(&self) -> &EventDebouncer {
        &self.debouncer
    }
}

/// A [`PerceptionCore`] bundled with its detection and region
/// collaborators.
pub struct PerceptionPipeline<D: DetectionSource, R: RegionSignalSource> {
    detector: D,
    region: R,
    core: PerceptionCore,
}

impl<D: DetectionSource, R: RegionSignalSource> PerceptionPipeline<D, R> {
    pub fn new(detector: D, region: R, config: PipelineConfig) -> Result<Self, PipelineError> {
        Ok(Self {
            detector,
            region,
            core: PerceptionCore::new(config)?,
        })
    }

    pub fn with_default_config(detector: D, region: R) -> Result<Self, PipelineError> {
        Self::new(detector, region, PipelineConfig::default())
    }

    /// Run detection and region sampling on `frame`, then the core.
    ///
    /// A failing collaborator is treated as unavailability: the detector
    /// failing skips the tracker step, the region source failing feeds no
    /// debounce sample.
    pub fn process_frame(&mut self, frame: &Frame) -> Result<FrameReport, PipelineError> {
        let detections = match self.detector.detect(frame) {
            Ok(detections) => Some(detections),
            Err(err) => {
                warn!(%err, "detector produced no batch, skipping frame");
                None
            }
        };
        let sample = match self.region.coefficient(frame) {
            Ok(coefficient) => Some(RegionSample::new(coefficient, frame.timestamp)),
            Err(err) => {
                warn!(%err, "region source produced no coefficient");
                None
            }
        };
        Ok(self.core.step(detections, sample)?)
    }

    /// Advance one frame with nothing from upstream.
    pub fn process_skipped(&mut self) -> Result<FrameReport, PipelineError> {
        Ok(self.core.step(None, None)?)
    }

    /// Pull frames until `source` is exhausted, handing each report to
    /// `on_report`. Returns the number of frame slots processed.
    pub fn run<S: FrameSource>(
        &mut self,
        source: &mut S,
        mut on_report: impl FnMut(&FrameReport),
    ) -> Result<u64, PipelineError> {
        let mut processed = 0;
        while let Some(input) = source.next_frame() {
            let report = match input {
                FrameInput::Ready(frame) => self.process_frame(&frame)?,
                FrameInput::Skipped => self.process_skipped()?,
            };
            on_report(&report);
            processed += 1;
        }
        debug!(processed, "frame source exhausted");
        Ok(processed)
    }

    pub fn reset_session(&mut self) {
        self.core.reset_session();
    }

    pub fn core(&self) -> &PerceptionCore {
        &self.core
    }

    pub fn detector(&self) -> &D {
        &self.detector
    }

    pub fn detector_mut(&mut self) -> &mut D {
        &mut self.detector
    }

    pub fn region(&self) -> &R {
        &self.region
    }
}
