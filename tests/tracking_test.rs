use proptest::prelude::*;
use robovision_track::tracker::{AssignmentSolver, MotionCost, TentativeMissPolicy};
use robovision_track::{
    Detection, FrameUpdate, PerceptionCore, PipelineConfig, TrackManager, TrackState,
    TrackerConfig,
};

fn det(x1: f32, y1: f32, x2: f32, y2: f32) -> Detection {
    Detection::new(x1, y1, x2, y2, 0.9)
}

fn core() -> PerceptionCore {
    PerceptionCore::new(PipelineConfig::default()).unwrap()
}

#[test]
fn test_confirmed_on_third_consecutive_frame() {
    let mut core = core();
    let jittered = [
        det(10.0, 10.0, 50.0, 50.0),
        det(12.0, 8.0, 52.0, 48.0),
        det(8.0, 11.0, 48.0, 51.0),
    ];

    let first = core.step(Some(vec![jittered[0].clone()]), None).unwrap();
    assert!(first.confirmed.is_empty());
    assert_eq!(core.tracker().tracks()[0].state, TrackState::Tentative);

    let second = core.step(Some(vec![jittered[1].clone()]), None).unwrap();
    assert!(second.confirmed.is_empty());
    assert_eq!(second.unique_count, 0);

    let third = core.step(Some(vec![jittered[2].clone()]), None).unwrap();
    assert_eq!(third.newly_confirmed, vec![1]);
    assert_eq!(third.confirmed.len(), 1);
    assert_eq!(third.confirmed[0].track_id, 1);
    assert_eq!(third.confirmed[0].age, 3);
    assert_eq!(third.unique_count, 1);
}

#[test]
fn test_confirmed_track_deleted_after_max_missed() {
    let mut core = core();
    for _ in 0..3 {
        core.step(Some(vec![det(10.0, 10.0, 50.0, 50.0)]), None).unwrap();
    }

    for missed in 1..=30 {
        let report = core.step(Some(vec![]), None).unwrap();
        assert!(report.deleted.is_empty(), "deleted early at miss {missed}");
        assert_eq!(report.confirmed.len(), 1);
        assert_eq!(core.tracker().tracks()[0].misses, missed);
    }

    let report = core.step(Some(vec![]), None).unwrap();
    assert_eq!(report.deleted, vec![1]);
    assert!(report.confirmed.is_empty());
    assert!(core.tracker().tracks().is_empty());
    assert_eq!(report.unique_count, 1);

    // The same object coming back gets a fresh identity.
    let report = core.step(Some(vec![det(10.0, 10.0, 50.0, 50.0)]), None).unwrap();
    assert_eq!(core.tracker().tracks()[0].track_id, 2);
    assert_eq!(report.unique_count, 1);
}

#[test]
fn test_distant_detections_spawn_independent_tracks() {
    let mut manager = TrackManager::new(TrackerConfig::default()).unwrap();
    let update = manager
        .update(vec![det(10.0, 10.0, 50.0, 50.0), det(400.0, 300.0, 460.0, 380.0)])
        .unwrap();
    assert_eq!(update.created, vec![1, 2]);
    assert_eq!(manager.tracks().len(), 2);
    assert!(manager.tracks().iter().all(|t| t.state == TrackState::Tentative));

    // Each keeps its own identity while both move.
    manager
        .update(vec![det(402.0, 301.0, 462.0, 381.0), det(12.0, 10.0, 52.0, 50.0)])
        .unwrap();
    let update = manager
        .update(vec![det(14.0, 10.0, 54.0, 50.0), det(404.0, 302.0, 464.0, 382.0)])
        .unwrap();
    let ids: Vec<u64> = update.confirmed.iter().map(|t| t.track_id).collect();
    assert_eq!(ids, vec![1, 2]);
    assert!(update.confirmed[0].bbox.x < 100.0);
    assert!(update.confirmed[1].bbox.x > 300.0);
}

#[test]
fn test_missed_frames_count_up_without_confirming() {
    let config = TrackerConfig {
        tentative_miss_policy: TentativeMissPolicy::GracePeriod,
        ..TrackerConfig::default()
    };
    let mut manager = TrackManager::new(config).unwrap();
    manager.update(vec![det(10.0, 10.0, 50.0, 50.0)]).unwrap();
    for expected in 1..=10 {
        let update = manager.skip_frame().unwrap();
        assert!(update.skipped);
        assert!(update.newly_confirmed.is_empty());
        let track = &manager.tracks()[0];
        assert_eq!(track.misses, expected);
        assert_eq!(track.state, TrackState::Tentative);
    }
}

#[test]
fn test_moving_object_keeps_identity() {
    let mut manager = TrackManager::new(TrackerConfig::default()).unwrap();
    for step in 0..40 {
        let dx = 6.0 * step as f32;
        let update = manager
            .update(vec![det(10.0 + dx, 10.0, 50.0 + dx, 50.0)])
            .unwrap();
        assert!(update.created.is_empty() || step == 0);
    }
    assert_eq!(manager.tracks().len(), 1);
    assert_eq!(manager.tracks()[0].track_id, 1);
    assert_eq!(manager.tracks()[0].hits, 40);
}

#[test]
fn test_center_distance_follows_fast_small_object() {
    // A 20 px box moving 15 px per frame overlaps too little for the IoU
    // gate on the second frame but stays well inside one diagonal.
    let run = |motion_cost| {
        let config = TrackerConfig {
            motion_cost,
            ..TrackerConfig::default()
        };
        let mut manager = TrackManager::new(config).unwrap();
        let mut confirmed_ids = Vec::new();
        for step in 0..20 {
            let dx = 15.0 * step as f32;
            let update = manager
                .update(vec![det(10.0 + dx, 100.0, 30.0 + dx, 120.0)])
                .unwrap();
            confirmed_ids.extend(update.confirmed.iter().map(|t| t.track_id));
        }
        (manager, confirmed_ids)
    };

    let (manager, confirmed_ids) = run(MotionCost::CenterDistance);
    assert_eq!(manager.tracks().len(), 1);
    assert_eq!(manager.tracks()[0].track_id, 1);
    assert_eq!(manager.tracks()[0].hits, 20);
    assert_eq!(confirmed_ids.len(), 18);
    assert!(confirmed_ids.iter().all(|&id| id == 1));
    let x = manager.tracks()[0].rect().x;
    assert!((x - (10.0 + 15.0 * 19.0)).abs() < 2.0, "x = {x}");

    let (manager, confirmed_ids) = run(MotionCost::Iou);
    assert!(confirmed_ids.is_empty());
    assert!(manager.tracks()[0].track_id > 1);
}

fn script() -> Vec<Vec<Detection>> {
    let mut frames = Vec::new();
    for step in 0..25 {
        let s = step as f32;
        let mut dets = vec![det(10.0 + 3.0 * s, 10.0, 50.0 + 3.0 * s, 50.0)];
        if step % 7 != 3 {
            dets.push(det(300.0, 200.0 - 2.0 * s, 340.0, 260.0 - 2.0 * s));
        }
        if (5..12).contains(&step) {
            dets.push(det(150.0, 150.0, 190.0, 190.0));
        }
        frames.push(dets);
    }
    frames
}

fn timeline(config: TrackerConfig, frames: &[Vec<Detection>]) -> Vec<FrameUpdate> {
    let mut manager = TrackManager::new(config).unwrap();
    frames
        .iter()
        .map(|dets| manager.update(dets.clone()).unwrap())
        .collect()
}

#[test]
fn test_identical_runs_are_identical() {
    for solver in [AssignmentSolver::Optimal, AssignmentSolver::Greedy] {
        let config = TrackerConfig {
            solver,
            ..TrackerConfig::default()
        };
        let a = timeline(config.clone(), &script());
        let b = timeline(config, &script());
        assert_eq!(a, b);
    }
}

fn arb_frames() -> impl Strategy<Value = Vec<Vec<Detection>>> {
    let arb_det = (0f32..600.0, 0f32..400.0, 5f32..80.0, 5f32..80.0, 0f32..=1.0)
        .prop_map(|(x, y, w, h, score)| Detection::new(x, y, x + w, y + h, score));
    prop::collection::vec(prop::collection::vec(arb_det, 0..6), 1..40)
}

proptest! {
    #[test]
    fn prop_deterministic_and_monotonic(frames in arb_frames()) {
        let config = PipelineConfig {
            tracker: TrackerConfig {
                tentative_miss_policy: TentativeMissPolicy::GracePeriod,
                max_missed_frames: 3,
                ..TrackerConfig::default()
            },
            ..PipelineConfig::default()
        };
        let mut first = PerceptionCore::new(config.clone()).unwrap();
        let mut second = PerceptionCore::new(config).unwrap();

        let mut last_count = 0;
        let mut last_created = 0;
        for dets in &frames {
            let a = first.step(Some(dets.clone()), None).unwrap();
            let b = second.step(Some(dets.clone()), None).unwrap();
            prop_assert_eq!(&a, &b);

            prop_assert!(a.unique_count >= last_count);
            last_count = a.unique_count;

            for &id in &a.created {
                prop_assert!(id > last_created);
                last_created = id;
            }
        }
    }
}
