//! Multi-object tracking: motion prediction, data association, lifecycle.

mod identity_counter;
mod kalman_filter;
mod matching;
mod rect;
mod track;
mod track_manager;
mod track_state;

pub use identity_counter::IdentityCounter;
pub use kalman_filter::{KalmanFilter, MotionState};
pub use matching::{
    AssignmentResult, AssignmentSolver, Detection, MotionCost, assign, cosine_distance,
    greedy_assignment, linear_assignment, motion_distance,
};
pub use rect::Rect;
pub use track::{Track, TrackSnapshot};
pub use track_manager::{FrameUpdate, TrackManager, TrackerConfig};
pub use track_state::{TentativeMissPolicy, TrackState};
