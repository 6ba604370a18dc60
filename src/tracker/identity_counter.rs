use std::collections::BTreeSet;

use tracing::debug;

use crate::tracker::track::TrackSnapshot;
use crate::tracker::track_state::TrackState;

/// Cumulative set of every track ID that ever reached Confirmed.
///
/// The count never decreases while the session lives; only
/// [`IdentityCounter::reset`] clears it.
#[derive(Debug, Clone, Default)]
pub struct IdentityCounter {
    ids: BTreeSet<u64>,
}

impl IdentityCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a confirmed ID. Returns `true` the first time it is seen.
    pub fn record(&mut self, track_id: u64) -> bool {
        let inserted = self.ids.insert(track_id);
        if inserted {
            debug!(track_id, unique = self.ids.len(), "new unique identity");
        }
        inserted
    }

    /// Record every confirmed track in a frame's output.
    pub fn observe<'a>(&mut self, tracks: impl IntoIterator<Item = &'a TrackSnapshot>) {
        for track in tracks {
            if track.state == TrackState::Confirmed {
                self.record(track.track_id);
            }
        }
    }

    pub fn count(&self) -> usize {
        self.ids.len()
    }

    pub fn contains(&self, track_id: u64) -> bool {
        self.ids.contains(&track_id)
    }

    /// Confirmed IDs in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = u64> + '_ {
        self.ids.iter().copied()
    }

    /// Explicit session reinitialization.
    pub fn reset(&mut self) {
        self.ids.clear();
    }
}
