use serde::{Deserialize, Serialize};

/// Lifecycle state of a track.
///
/// `Tentative -> Confirmed -> Deleted`, with `Tentative -> Deleted` on
/// early misses. `Deleted` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackState {
    /// Newly created track, not yet confirmed
    #[default]
    Tentative,
    /// Reached the confirmation hit streak
    Confirmed,
    /// Removed from tracking; never revived under this track object
    Deleted,
}

/// What happens to a Tentative track that misses a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TentativeMissPolicy {
    /// Delete on the very first missed frame.
    #[default]
    DeleteOnFirstMiss,
    /// Same grace period as Confirmed tracks (`max_missed_frames`). The hit
    /// streak still resets on a miss, so confirmation requires a fresh run
    /// of consecutive matches.
    GracePeriod,
}
