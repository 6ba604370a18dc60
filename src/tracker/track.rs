//! Single object track.

use serde::{Deserialize, Serialize};

use crate::tracker::kalman_filter::{KalmanFilter, MotionState};
use crate::tracker::matching::Detection;
use crate::tracker::rect::Rect;
use crate::tracker::track_state::TrackState;

/// Single object track. Owned and mutated only by the
/// [`TrackManager`](crate::tracker::TrackManager).
#[derive(Debug, Clone)]
pub struct Track {
    /// Unique track identifier
    pub track_id: u64,
    /// Current lifecycle state
    pub state: TrackState,
    /// Confidence of the last associated detection
    pub score: f32,
    /// Class label of the last associated detection
    pub class_id: u32,
    /// Frame the track was created in
    pub start_frame: u64,
    /// Last frame the track was matched in
    pub frame_id: u64,
    /// Total matched frames, including the creating detection
    pub hits: u32,
    /// Consecutive matched frames; reset by a miss
    pub hit_streak: u32,
    /// Consecutive missed frames; reset by a match
    pub misses: u32,
    /// Frames since creation
    pub age: u32,
    /// Motion estimate
    pub motion: MotionState,
    /// Running appearance descriptor (L2-normalised)
    pub feature: Option<Vec<f32>>,
}

/// Read-only view of a track handed to consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackSnapshot {
    pub track_id: u64,
    pub state: TrackState,
    pub bbox: Rect,
    pub class_id: u32,
    pub score: f32,
    pub age: u32,
    pub hits: u32,
}

impl Track {
    /// Start a new Tentative track from an unmatched detection.
    pub fn new(track_id: u64, det: &Detection, kalman_filter: &KalmanFilter, frame_id: u64) -> Self {
        Self {
            track_id,
            state: TrackState::Tentative,
            score: det.score,
            class_id: det.class_id,
            start_frame: frame_id,
            frame_id,
            hits: 1,
            hit_streak: 1,
            misses: 0,
            age: 1,
            motion: kalman_filter.initiate(&det.bbox),
            feature: det.feature.as_deref().and_then(normalized),
        }
    }

    /// Current bounding box estimate.
    pub fn rect(&self) -> Rect {
        self.motion.rect()
    }

    pub fn is_confirmed(&self) -> bool {
        self.state == TrackState::Confirmed
    }

    pub fn is_deleted(&self) -> bool {
        self.state == TrackState::Deleted
    }

    /// Advance the motion estimate one frame.
    pub fn predict(&mut self, kalman_filter: &KalmanFilter) -> Rect {
        self.age = self.age.saturating_add(1);
        self.motion.predict(kalman_filter, self.misses > 0)
    }

    /// Fold in a matched detection. Lifecycle transitions are decided by the
    /// manager.
    pub fn update(
        &mut self,
        det: &Detection,
        kalman_filter: &KalmanFilter,
        frame_id: u64,
        feature_momentum: f32,
    ) {
        self.motion.update(kalman_filter, &det.bbox, det.score);
        if let Some(new_feat) = det.feature.as_deref() {
            self.feature = match self.feature.take() {
                Some(old) if old.len() == new_feat.len() => {
                    let blended: Vec<f32> = old
                        .iter()
                        .zip(new_feat)
                        .map(|(o, n)| feature_momentum * o + (1.0 - feature_momentum) * n)
                        .collect();
                    normalized(&blended).or(Some(old))
                }
                _ => normalized(new_feat),
            };
        }

        self.frame_id = frame_id;
        self.score = det.score;
        self.class_id = det.class_id;
        self.hits = self.hits.saturating_add(1);
        self.hit_streak = self.hit_streak.saturating_add(1);
        self.misses = 0;
    }

    /// Record a frame without an associated detection.
    pub fn mark_missed(&mut self) {
        self.misses = self.misses.saturating_add(1);
        self.hit_streak = 0;
    }

    pub fn mark_confirmed(&mut self) {
        self.state = TrackState::Confirmed;
    }

    pub fn mark_deleted(&mut self) {
        self.state = TrackState::Deleted;
    }

    pub fn snapshot(&self) -> TrackSnapshot {
        TrackSnapshot {
            track_id: self.track_id,
            state: self.state,
            bbox: self.rect(),
            class_id: self.class_id,
            score: self.score,
            age: self.age,
            hits: self.hits,
        }
    }
}

fn normalized(v: &[f32]) -> Option<Vec<f32>> {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm.is_finite() && norm > f32::EPSILON {
        Some(v.iter().map(|x| x / norm).collect())
    } else {
        None
    }
}
