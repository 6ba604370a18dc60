//! Error types for the perception core.
//!
//! Three classes of failure exist:
//! - [`InputError`]: a single malformed record. Recoverable; the record is
//!   dropped and the rest of the frame is processed.
//! - [`ConfigError`]: rejected at construction, before any frame is seen.
//! - [`StateInvariantViolation`]: an internal bookkeeping bug. Fatal.

use thiserror::Error;

/// A malformed per-frame record (detection or region sample).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    /// Bounding box contains NaN or infinite coordinates.
    #[error("bounding box has non-finite coordinates: {0:?}")]
    NonFiniteBox([f32; 4]),

    /// Bounding box has zero or negative width/height.
    #[error("bounding box has non-positive extent: width {width}, height {height}")]
    EmptyExtent { width: f32, height: f32 },

    /// Detection confidence outside `[0, 1]`.
    #[error("detection score {0} outside [0, 1]")]
    ScoreOutOfRange(f32),

    /// Appearance descriptor is empty or contains non-finite values.
    #[error("appearance feature is empty or non-finite")]
    NonFiniteFeature,

    /// Region coefficient outside `[0, 1]` or non-finite.
    #[error("region coefficient {0} outside [0, 1]")]
    CoefficientOutOfRange(f64),

    /// Region sample timestamp is not finite.
    #[error("region sample timestamp {0} is not finite")]
    NonFiniteTimestamp(f64),
}

/// Invalid initialization-time configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// A threshold is outside its admissible range.
    #[error("{name} = {value} is outside {range}")]
    InvalidThreshold {
        name: &'static str,
        value: f64,
        range: &'static str,
    },

    /// Exit threshold must be strictly below enter threshold.
    #[error("exit threshold {exit} must be strictly less than enter threshold {enter}")]
    ThresholdOrder { enter: f64, exit: f64 },

    /// Cooldown must be a finite, non-negative duration.
    #[error("cooldown {0} must be finite and non-negative")]
    NegativeCooldown(f64),

    /// Cost weights must be finite, non-negative and not both zero.
    #[error("invalid cost weights: motion {motion}, appearance {appearance}")]
    InvalidWeight { motion: f32, appearance: f32 },

    /// A count parameter must be at least one.
    #[error("{0} must be at least 1")]
    ZeroCount(&'static str),
}

/// Internal bookkeeping failure. Signals a bug in ID allocation or track
/// ownership and must not be swallowed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateInvariantViolation {
    /// Two live tracks share an ID.
    #[error("duplicate track id {0} in active set")]
    DuplicateTrackId(u64),

    /// A freshly allocated ID did not exceed every previous one.
    #[error("allocated track id {allocated} is not greater than last id {last}")]
    NonMonotonicId { allocated: u64, last: u64 },
}

/// Errors surfaced by the owned perception pipeline. Collaborator failures
/// are not errors here; they are handled as skipped frames.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    /// Invalid configuration passed at construction.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Fatal tracker bookkeeping failure.
    #[error(transparent)]
    Invariant(#[from] StateInvariantViolation),
}
