//! Track lifecycle: predict, associate, update, create, delete.
//!
//! Overlapping duplicate detections of one object can spawn duplicate
//! confirmed tracks when the gate is loose. This is not corrected here.

use std::collections::{HashSet, VecDeque};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::error::{ConfigError, StateInvariantViolation};
use crate::tracker::kalman_filter::KalmanFilter;
use crate::tracker::matching::{self, AssignmentResult, AssignmentSolver, Detection, MotionCost};
use crate::tracker::rect::Rect;
use crate::tracker::track::{Track, TrackSnapshot};
use crate::tracker::track_state::{TentativeMissPolicy, TrackState};

/// Configuration for the [`TrackManager`]. Validated once at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Consecutive matched frames (creation included) needed to confirm.
    pub confirm_hits: u32,
    /// A track is deleted once its miss counter exceeds this value.
    pub max_missed_frames: u32,
    pub tentative_miss_policy: TentativeMissPolicy,
    /// Unmatched detections below this score do not spawn tracks.
    pub min_score: f32,
    /// Gate: pairs with cost above this are never matched.
    pub match_thresh: f32,
    pub motion_cost: MotionCost,
    /// Pairs whose motion cost reaches this value are forbidden before
    /// appearance is blended in. The default `1.0` forbids pairs with no
    /// overlap (IoU) or a full diagonal apart (center distance).
    pub motion_gate: f32,
    pub motion_weight: f32,
    /// Zero disables appearance in the association cost.
    pub appearance_weight: f32,
    /// Scale similarity by detection confidence before gating.
    pub fuse_score: bool,
    /// Forbid matches across class labels.
    pub class_aware: bool,
    pub solver: AssignmentSolver,
    /// Weight of the old descriptor in the running appearance average.
    pub feature_momentum: f32,
    /// Re-identify deleted confirmed tracks by appearance.
    pub reid_enabled: bool,
    /// Maximum cosine distance for a re-identification.
    pub reid_max_distance: f32,
    /// Frames a deleted track stays eligible for re-identification.
    pub reid_max_gap: u64,
    /// Maximum number of deleted tracks kept for re-identification.
    pub reid_gallery_size: usize,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            confirm_hits: 3,
            max_missed_frames: 30,
            tentative_miss_policy: TentativeMissPolicy::default(),
            min_score: 0.5,
            match_thresh: 0.7,
            motion_cost: MotionCost::default(),
            motion_gate: 1.0,
            motion_weight: 1.0,
            appearance_weight: 0.0,
            fuse_score: false,
            class_aware: false,
            solver: AssignmentSolver::default(),
            feature_momentum: 0.9,
            reid_enabled: false,
            reid_max_distance: 0.2,
            reid_max_gap: 300,
            reid_gallery_size: 100,
        }
    }
}

fn unit_interval(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidThreshold {
            name,
            value: value as f64,
            range: "[0, 1]",
        })
    }
}

impl TrackerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.confirm_hits == 0 {
            return Err(ConfigError::ZeroCount("confirm_hits"));
        }
        unit_interval("min_score", self.min_score)?;
        unit_interval("match_thresh", self.match_thresh)?;
        if !(self.motion_gate.is_finite() && self.motion_gate > 0.0 && self.motion_gate <= 1.0) {
            return Err(ConfigError::InvalidThreshold {
                name: "motion_gate",
                value: self.motion_gate as f64,
                range: "(0, 1]",
            });
        }
        unit_interval("feature_momentum", self.feature_momentum)?;
        unit_interval("reid_max_distance", self.reid_max_distance)?;

        let weights_ok = [self.motion_weight, self.appearance_weight]
            .iter()
            .all(|w| w.is_finite() && *w >= 0.0)
            && self.motion_weight + self.appearance_weight > 0.0;
        if !weights_ok {
            return Err(ConfigError::InvalidWeight {
                motion: self.motion_weight,
                appearance: self.appearance_weight,
            });
        }
        if self.reid_enabled && self.reid_gallery_size == 0 {
            return Err(ConfigError::ZeroCount("reid_gallery_size"));
        }
        Ok(())
    }

    /// Misses tolerated before deletion for a track in `state`.
    fn miss_limit(&self, state: TrackState) -> u32 {
        match (state, self.tentative_miss_policy) {
            (TrackState::Tentative, TentativeMissPolicy::DeleteOnFirstMiss) => 0,
            _ => self.max_missed_frames,
        }
    }
}

/// Result of one [`TrackManager::update`] call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameUpdate {
    pub frame_id: u64,
    /// No detection batch was available for this frame.
    pub skipped: bool,
    /// Currently Confirmed tracks, ascending by ID.
    pub confirmed: Vec<TrackSnapshot>,
    /// IDs of tracks created this frame (including re-identified ones).
    pub created: Vec<u64>,
    /// IDs that transitioned Tentative -> Confirmed this frame.
    pub newly_confirmed: Vec<u64>,
    /// IDs deleted and removed this frame.
    pub deleted: Vec<u64>,
    /// Detections dropped as malformed.
    pub rejected: usize,
}

/// A deleted confirmed track kept for appearance re-identification.
#[derive(Debug, Clone)]
struct GalleryEntry {
    track_id: u64,
    feature: Vec<f32>,
    deleted_frame: u64,
}

/// Owns the active track set and the ID counter.
pub struct TrackManager {
    tracks: Vec<Track>,
    gallery: VecDeque<GalleryEntry>,
    last_id: u64,
    frame_id: u64,
    config: TrackerConfig,
    kalman_filter: KalmanFilter,
}

impl TrackManager {
    pub fn new(config: TrackerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            tracks: Vec::new(),
            gallery: VecDeque::new(),
            last_id: 0,
            frame_id: 0,
            config,
            kalman_filter: KalmanFilter::default(),
        })
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Number of frames processed (including skipped ones).
    pub fn frame_id(&self) -> u64 {
        self.frame_id
    }

    /// Active (Tentative and Confirmed) tracks in creation order.
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn confirmed_tracks(&self) -> Vec<TrackSnapshot> {
        let mut confirmed: Vec<TrackSnapshot> = self
            .tracks
            .iter()
            .filter(|t| t.is_confirmed())
            .map(Track::snapshot)
            .collect();
        confirmed.sort_by_key(|t| t.track_id);
        confirmed
    }

    /// Drop all tracks and the re-identification gallery. The ID counter
    /// keeps running so IDs are never reissued.
    pub fn reset(&mut self) {
        self.tracks.clear();
        self.gallery.clear();
        self.frame_id = 0;
    }

    /// Advance one frame with no detection batch available. Every track
    /// ages by one miss.
    pub fn skip_frame(&mut self) -> Result<FrameUpdate, StateInvariantViolation> {
        let mut update = self.step(Vec::new())?;
        update.skipped = true;
        Ok(update)
    }

    /// Run one frame: predict, associate, update/create/delete.
    pub fn update(
        &mut self,
        detections: Vec<Detection>,
    ) -> Result<FrameUpdate, StateInvariantViolation> {
        self.step(detections)
    }

    fn step(&mut self, detections: Vec<Detection>) -> Result<FrameUpdate, StateInvariantViolation> {
        self.frame_id += 1;
        let mut out = FrameUpdate {
            frame_id: self.frame_id,
            ..FrameUpdate::default()
        };

        // Step 1: Drop malformed detections
        let detections: Vec<Detection> = detections
            .into_iter()
            .filter(|det| match det.validate() {
                Ok(()) => true,
                Err(err) => {
                    warn!(frame = self.frame_id, %err, "dropping detection");
                    out.rejected += 1;
                    false
                }
            })
            .collect();

        // Step 2: Predict every active track
        let predicted: Vec<Rect> = self
            .tracks
            .iter_mut()
            .map(|t| t.predict(&self.kalman_filter))
            .collect();

        // Step 3: Associate
        let AssignmentResult {
            matches,
            unmatched_tracks,
            unmatched_detections,
        } = self.associate(&predicted, &detections);
        trace!(
            frame = self.frame_id,
            matched = matches.len(),
            unmatched_tracks = unmatched_tracks.len(),
            unmatched_detections = unmatched_detections.len(),
            "association"
        );

        // Step 4: Matched tracks
        for (itrack, idet) in matches {
            let track = &mut self.tracks[itrack];
            track.update(
                &detections[idet],
                &self.kalman_filter,
                self.frame_id,
                self.config.feature_momentum,
            );
            if track.state == TrackState::Tentative && track.hit_streak >= self.config.confirm_hits
            {
                track.mark_confirmed();
                debug!(track_id = track.track_id, frame = self.frame_id, "track confirmed");
                out.newly_confirmed.push(track.track_id);
            }
        }

        // Step 5: Unmatched tracks
        for itrack in unmatched_tracks {
            let track = &mut self.tracks[itrack];
            track.mark_missed();
            if track.misses > self.config.miss_limit(track.state) {
                let was_confirmed = track.is_confirmed();
                track.mark_deleted();
                debug!(
                    track_id = track.track_id,
                    frame = self.frame_id,
                    misses = track.misses,
                    "track deleted"
                );
                out.deleted.push(track.track_id);
                if was_confirmed && self.config.reid_enabled {
                    if let Some(feature) = track.feature.clone() {
                        let entry = GalleryEntry {
                            track_id: track.track_id,
                            feature,
                            deleted_frame: self.frame_id,
                        };
                        self.gallery.push_back(entry);
                    }
                }
            }
        }
        self.tracks.retain(|t| !t.is_deleted());
        self.prune_gallery();

        // Step 6: Spawn tracks for the remaining detections
        for idet in unmatched_detections {
            let det = &detections[idet];
            if det.score < self.config.min_score {
                continue;
            }
            let mut track = match self.reidentify(det) {
                Some(track_id) => {
                    let mut track = Track::new(track_id, det, &self.kalman_filter, self.frame_id);
                    track.mark_confirmed();
                    debug!(track_id, frame = self.frame_id, "track re-identified");
                    track
                }
                None => {
                    let track_id = self.allocate_id()?;
                    debug!(track_id, frame = self.frame_id, "track created");
                    Track::new(track_id, det, &self.kalman_filter, self.frame_id)
                }
            };
            out.created.push(track.track_id);
            // A single required hit confirms on creation.
            if track.state == TrackState::Tentative && track.hit_streak >= self.config.confirm_hits
            {
                track.mark_confirmed();
                out.newly_confirmed.push(track.track_id);
            }
            self.tracks.push(track);
        }

        self.check_unique_ids()?;
        out.confirmed = self.confirmed_tracks();
        Ok(out)
    }

    fn associate(&self, predicted: &[Rect], detections: &[Detection]) -> AssignmentResult {
        let det_rects: Vec<Rect> = detections.iter().map(|d| d.bbox).collect();
        let mut motion = matching::motion_distance(predicted, &det_rects, self.config.motion_cost);
        matching::gate_motion(&mut motion, self.config.motion_gate);

        let track_features: Vec<Option<&[f32]>> =
            self.tracks.iter().map(|t| t.feature.as_deref()).collect();
        let mut dists = matching::blend_appearance(
            &motion,
            &track_features,
            detections,
            self.config.motion_weight,
            self.config.appearance_weight,
        );

        if self.config.fuse_score {
            matching::fuse_score(&mut dists, detections);
        }
        if self.config.class_aware {
            let classes: Vec<u32> = self.tracks.iter().map(|t| t.class_id).collect();
            matching::gate_classes(&mut dists, &classes, detections);
        }
        matching::gate(&mut dists, self.config.match_thresh);

        matching::assign(&dists, self.config.match_thresh, self.config.solver)
    }

    fn allocate_id(&mut self) -> Result<u64, StateInvariantViolation> {
        let allocated = self.last_id.wrapping_add(1);
        if allocated <= self.last_id {
            return Err(StateInvariantViolation::NonMonotonicId {
                allocated,
                last: self.last_id,
            });
        }
        self.last_id = allocated;
        Ok(allocated)
    }

    /// Closest gallery entry within `reid_max_distance`, removed from the
    /// gallery on success. Ties go to the lowest ID.
    fn reidentify(&mut self, det: &Detection) -> Option<u64> {
        if !self.config.reid_enabled {
            return None;
        }
        let feature = det.feature.as_deref()?;
        let live: HashSet<u64> = self.tracks.iter().map(|t| t.track_id).collect();

        let (pos, _) = self
            .gallery
            .iter()
            .enumerate()
            .filter(|(_, e)| !live.contains(&e.track_id))
            .filter_map(|(pos, e)| {
                matching::cosine_distance(&e.feature, feature).map(|d| (pos, (d, e.track_id)))
            })
            .filter(|(_, (d, _))| *d <= self.config.reid_max_distance)
            .min_by(|a, b| a.1.0.total_cmp(&b.1.0).then(a.1.1.cmp(&b.1.1)))?;
        self.gallery.remove(pos).map(|e| e.track_id)
    }

    fn prune_gallery(&mut self) {
        let frame_id = self.frame_id;
        let max_gap = self.config.reid_max_gap;
        self.gallery
            .retain(|e| frame_id.saturating_sub(e.deleted_frame) <= max_gap);
        while self.gallery.len() > self.config.reid_gallery_size {
            self.gallery.pop_front();
        }
    }

    fn check_unique_ids(&self) -> Result<(), StateInvariantViolation> {
        let mut seen = HashSet::with_capacity(self.tracks.len());
        for track in &self.tracks {
            if !seen.insert(track.track_id) {
                return Err(StateInvariantViolation::DuplicateTrackId(track.track_id));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn det(x1: f32, y1: f32, x2: f32, y2: f32) -> Detection {
        Detection::new(x1, y1, x2, y2, 0.9)
    }

    #[test]
    fn test_config_validation() {
        assert!(TrackerConfig::default().validate().is_ok());

        let config = TrackerConfig {
            confirm_hits: 0,
            ..TrackerConfig::default()
        };
        assert_eq!(
            TrackManager::new(config).err(),
            Some(ConfigError::ZeroCount("confirm_hits"))
        );

        let config = TrackerConfig {
            motion_weight: 0.0,
            appearance_weight: 0.0,
            ..TrackerConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidWeight { .. })));

        let config = TrackerConfig {
            match_thresh: 1.5,
            ..TrackerConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidThreshold { .. })));

        let config = TrackerConfig {
            motion_gate: 0.0,
            ..TrackerConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidThreshold { name: "motion_gate", .. })
        ));
    }

    #[test]
    fn test_malformed_detection_is_dropped() {
        let mut manager = TrackManager::new(TrackerConfig::default()).unwrap();
        let update = manager
            .update(vec![det(50.0, 10.0, 10.0, 50.0), det(10.0, 10.0, 50.0, 50.0)])
            .unwrap();
        assert_eq!(update.rejected, 1);
        assert_eq!(update.created, vec![1]);
    }

    #[test]
    fn test_low_score_does_not_spawn_but_can_match() {
        let mut manager = TrackManager::new(TrackerConfig::default()).unwrap();
        let update = manager
            .update(vec![Detection::new(10.0, 10.0, 50.0, 50.0, 0.3)])
            .unwrap();
        assert!(update.created.is_empty());

        manager.update(vec![det(10.0, 10.0, 50.0, 50.0)]).unwrap();
        manager
            .update(vec![Detection::new(11.0, 10.0, 51.0, 50.0, 0.3)])
            .unwrap();
        assert_eq!(manager.tracks().len(), 1);
        assert_eq!(manager.tracks()[0].hit_streak, 2);
    }

    #[test]
    fn test_tentative_deleted_on_first_miss() {
        let mut manager = TrackManager::new(TrackerConfig::default()).unwrap();
        manager.update(vec![det(10.0, 10.0, 50.0, 50.0)]).unwrap();
        let update = manager.update(vec![]).unwrap();
        assert_eq!(update.deleted, vec![1]);
        assert!(manager.tracks().is_empty());
    }

    #[test]
    fn test_tentative_grace_period() {
        let config = TrackerConfig {
            tentative_miss_policy: TentativeMissPolicy::GracePeriod,
            max_missed_frames: 2,
            ..TrackerConfig::default()
        };
        let mut manager = TrackManager::new(config).unwrap();
        manager.update(vec![det(10.0, 10.0, 50.0, 50.0)]).unwrap();
        for expected_misses in 1..=2 {
            let update = manager.update(vec![]).unwrap();
            assert!(update.deleted.is_empty());
            assert_eq!(manager.tracks()[0].misses, expected_misses);
            assert_eq!(manager.tracks()[0].state, TrackState::Tentative);
        }
        let update = manager.update(vec![]).unwrap();
        assert_eq!(update.deleted, vec![1]);
    }

    #[test]
    fn test_grace_period_needs_fresh_streak() {
        let config = TrackerConfig {
            tentative_miss_policy: TentativeMissPolicy::GracePeriod,
            ..TrackerConfig::default()
        };
        let mut manager = TrackManager::new(config).unwrap();
        manager.update(vec![det(10.0, 10.0, 50.0, 50.0)]).unwrap();
        manager.update(vec![det(10.0, 10.0, 50.0, 50.0)]).unwrap();
        manager.update(vec![]).unwrap();
        let update = manager.update(vec![det(10.0, 10.0, 50.0, 50.0)]).unwrap();
        assert!(update.newly_confirmed.is_empty());
        manager.update(vec![det(10.0, 10.0, 50.0, 50.0)]).unwrap();
        let update = manager.update(vec![det(10.0, 10.0, 50.0, 50.0)]).unwrap();
        assert_eq!(update.newly_confirmed, vec![1]);
    }

    #[test]
    fn test_confirm_on_creation_with_single_hit() {
        let config = TrackerConfig {
            confirm_hits: 1,
            ..TrackerConfig::default()
        };
        let mut manager = TrackManager::new(config).unwrap();
        let update = manager.update(vec![det(10.0, 10.0, 50.0, 50.0)]).unwrap();
        assert_eq!(update.newly_confirmed, vec![1]);
        assert_eq!(update.confirmed.len(), 1);
    }

    #[test]
    fn test_class_aware_association() {
        let config = TrackerConfig {
            class_aware: true,
            ..TrackerConfig::default()
        };
        let mut manager = TrackManager::new(config).unwrap();
        manager
            .update(vec![det(10.0, 10.0, 50.0, 50.0).with_class(1)])
            .unwrap();
        let update = manager
            .update(vec![det(10.0, 10.0, 50.0, 50.0).with_class(2)])
            .unwrap();
        assert_eq!(update.deleted, vec![1]);
        assert_eq!(update.created, vec![2]);
    }

    #[test]
    fn test_appearance_cannot_bridge_motion_gate() {
        let config = TrackerConfig {
            appearance_weight: 1.0,
            confirm_hits: 1,
            ..TrackerConfig::default()
        };
        let mut manager = TrackManager::new(config).unwrap();
        let looks = vec![0.0, 1.0, 0.0];
        manager
            .update(vec![det(10.0, 10.0, 50.0, 50.0).with_feature(looks.clone())])
            .unwrap();

        let update = manager
            .update(vec![det(600.0, 400.0, 640.0, 440.0).with_feature(looks)])
            .unwrap();
        assert_eq!(update.created, vec![2]);
        let first = &update.confirmed[0];
        assert_eq!(first.track_id, 1);
        assert!((first.bbox.x - 10.0).abs() < 1.0, "track 1 moved to {:?}", first.bbox);
        assert_eq!(manager.tracks()[0].misses, 1);
    }

    #[test]
    fn test_appearance_picks_between_overlapping_detections() {
        let frames = |appearance_weight| {
            let config = TrackerConfig {
                appearance_weight,
                ..TrackerConfig::default()
            };
            let mut manager = TrackManager::new(config).unwrap();
            manager
                .update(vec![det(10.0, 10.0, 50.0, 50.0).with_feature(vec![1.0, 0.0, 0.0])])
                .unwrap();
            // The closer box looks different; the slightly farther one matches.
            manager
                .update(vec![
                    det(12.0, 10.0, 52.0, 50.0).with_feature(vec![0.0, 1.0, 0.0]),
                    det(14.0, 10.0, 54.0, 50.0).with_feature(vec![1.0, 0.0, 0.0]),
                ])
                .unwrap();
            manager
        };

        let blended = frames(1.0);
        let spawned = &blended.tracks()[1];
        assert_eq!(spawned.track_id, 2);
        assert!((spawned.rect().x - 12.0).abs() < 1e-3);

        let motion_only = frames(0.0);
        let spawned = &motion_only.tracks()[1];
        assert_eq!(spawned.track_id, 2);
        assert!((spawned.rect().x - 14.0).abs() < 1e-3);
    }

    fn reid_config() -> TrackerConfig {
        TrackerConfig {
            reid_enabled: true,
            max_missed_frames: 1,
            ..TrackerConfig::default()
        }
    }

    #[test]
    fn test_reidentification_expires_after_max_gap() {
        let config = TrackerConfig {
            reid_max_gap: 2,
            ..reid_config()
        };
        let mut manager = TrackManager::new(config).unwrap();
        let looks = vec![1.0, 0.0, 0.0];
        for _ in 0..3 {
            manager
                .update(vec![det(10.0, 10.0, 50.0, 50.0).with_feature(looks.clone())])
                .unwrap();
        }
        manager.update(vec![]).unwrap();
        let update = manager.update(vec![]).unwrap();
        assert_eq!((update.frame_id, update.deleted.clone()), (5, vec![1]));

        manager.update(vec![]).unwrap();
        manager.update(vec![]).unwrap();
        // Frame 8 is three frames after deletion, one past the gap.
        let update = manager
            .update(vec![det(10.0, 10.0, 50.0, 50.0).with_feature(looks)])
            .unwrap();
        assert_eq!(update.created, vec![2]);
        assert!(update.confirmed.is_empty());
    }

    #[test]
    fn test_gallery_evicts_oldest_entry() {
        let config = TrackerConfig {
            reid_gallery_size: 1,
            ..reid_config()
        };
        let mut manager = TrackManager::new(config).unwrap();
        let first_looks = vec![1.0, 0.0, 0.0];
        let second_looks = vec![0.0, 1.0, 0.0];
        let first = || det(10.0, 10.0, 50.0, 50.0).with_feature(first_looks.clone());
        let second = || det(300.0, 300.0, 340.0, 340.0).with_feature(second_looks.clone());

        for _ in 0..3 {
            manager.update(vec![first(), second()]).unwrap();
        }
        // Track 1 disappears first, track 2 two frames later.
        manager.update(vec![second()]).unwrap();
        let update = manager.update(vec![second()]).unwrap();
        assert_eq!(update.deleted, vec![1]);
        manager.update(vec![]).unwrap();
        let update = manager.update(vec![]).unwrap();
        assert_eq!(update.deleted, vec![2]);

        // Only the newest deletion is still in the gallery.
        let update = manager.update(vec![first(), second()]).unwrap();
        assert_eq!(update.created, vec![3, 2]);
        let ids: Vec<u64> = update.confirmed.iter().map(|t| t.track_id).collect();
        assert_eq!(ids, vec![2]);
    }

    #[test]
    fn test_reidentification_restores_id() {
        let config = TrackerConfig {
            reid_enabled: true,
            max_missed_frames: 1,
            ..TrackerConfig::default()
        };
        let mut manager = TrackManager::new(config).unwrap();
        let looks = vec![1.0, 0.0, 0.0];
        for _ in 0..3 {
            manager
                .update(vec![det(10.0, 10.0, 50.0, 50.0).with_feature(looks.clone())])
                .unwrap();
        }
        manager.update(vec![]).unwrap();
        let update = manager.update(vec![]).unwrap();
        assert_eq!(update.deleted, vec![1]);

        // Reappears far away with the same appearance.
        let update = manager
            .update(vec![det(300.0, 300.0, 340.0, 340.0).with_feature(looks.clone())])
            .unwrap();
        assert_eq!(update.created, vec![1]);
        assert_eq!(update.confirmed[0].track_id, 1);

        // A different-looking object still gets a fresh ID.
        let update = manager
            .update(vec![
                det(300.0, 300.0, 340.0, 340.0).with_feature(looks),
                det(600.0, 10.0, 640.0, 50.0).with_feature(vec![0.0, 1.0, 0.0]),
            ])
            .unwrap();
        assert_eq!(update.created, vec![2]);
    }

    #[test]
    fn test_reset_keeps_id_counter() {
        let mut manager = TrackManager::new(TrackerConfig::default()).unwrap();
        manager.update(vec![det(10.0, 10.0, 50.0, 50.0)]).unwrap();
        manager.reset();
        assert!(manager.tracks().is_empty());
        assert_eq!(manager.frame_id(), 0);
        let update = manager.update(vec![det(10.0, 10.0, 50.0, 50.0)]).unwrap();
        assert_eq!(update.created, vec![2]);
    }
}
