//! Constant-velocity Kalman filter over `[cx, cy, w, h]` bounding boxes.
//!
//! State and covariance are stored as ndarray arrays; the 4x4 innovation
//! system is solved with nalgebra (Cholesky, LU as a fallback) so no
//! BLAS/LAPACK is needed.

use ndarray::{Array1, Array2, s};
use tracing::warn;

use crate::tracker::rect::Rect;

const NDIM: usize = 4;

/// Smallest width/height the filter will represent, in pixels.
const MIN_EXTENT: f64 = 1.0;

/// Upper bound on any position/size variance (1000 px standard deviation).
const MAX_POSITION_VARIANCE: f64 = 1.0e6;

/// Upper bound on any velocity variance (100 px/frame standard deviation).
const MAX_VELOCITY_VARIANCE: f64 = 1.0e4;

/// Floor for the observation-noise confidence scale.
const MIN_NOISE_SCALE: f64 = 0.05;

/// Per-frame factor applied to the center velocity of a coasting track.
/// After 30 missed frames about 4% of the last observed speed remains.
const COAST_VELOCITY_DECAY: f64 = 0.9;

/// Shared filter parameters. Stateless; per-track state lives in
/// [`MotionState`].
#[derive(Debug, Clone)]
pub struct KalmanFilter {
    motion_mat: Array2<f64>,
    update_mat: Array2<f64>,
    std_weight_position: f64,
    std_weight_velocity: f64,
}

impl Default for KalmanFilter {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-track estimate: mean `[cx, cy, w, h, vcx, vcy, vw, vh]` and its 8x8
/// covariance.
#[derive(Debug, Clone, PartialEq)]
pub struct MotionState {
    pub mean: Array1<f64>,
    pub covariance: Array2<f64>,
}

impl MotionState {
    /// Current box estimate.
    pub fn rect(&self) -> Rect {
        Rect::from_center(
            self.mean[0] as f32,
            self.mean[1] as f32,
            self.mean[2] as f32,
            self.mean[3] as f32,
        )
    }

    /// Advance one frame and return the predicted box.
    ///
    /// `coasting` freezes the size velocity and decays the center velocity
    /// by `COAST_VELOCITY_DECAY` per frame, so an unobserved track slows to a stop
    /// instead of drifting at its last speed.
    pub fn predict(&mut self, kf: &KalmanFilter, coasting: bool) -> Rect {
        if coasting {
            self.mean[4] *= COAST_VELOCITY_DECAY;
            self.mean[5] *= COAST_VELOCITY_DECAY;
            self.mean[6] = 0.0;
            self.mean[7] = 0.0;
        }
        kf.predict(self);
        self.rect()
    }

    /// Fuse an observed box with detection confidence `score`.
    pub fn update(&mut self, kf: &KalmanFilter, bbox: &Rect, score: f32) {
        kf.update(self, bbox, score);
    }
}

fn measurement(bbox: &Rect) -> [f64; 4] {
    let [cx, cy, w, h] = bbox.to_cxcywh();
    [cx as f64, cy as f64, w as f64, h as f64]
}

impl KalmanFilter {
    pub fn new() -> Self {
        let mut motion_mat = Array2::eye(2 * NDIM);
        for i in 0..NDIM {
            motion_mat[[i, NDIM + i]] = 1.0;
        }

        let mut update_mat = Array2::zeros((NDIM, 2 * NDIM));
        for i in 0..NDIM {
            update_mat[[i, i]] = 1.0;
        }

        Self {
            motion_mat,
            update_mat,
            std_weight_position: 1.0 / 20.0,
            std_weight_velocity: 1.0 / 160.0,
        }
    }

    /// Start a new estimate from an unassociated detection.
    pub fn initiate(&self, bbox: &Rect) -> MotionState {
        let z = measurement(bbox);
        let mut mean = Array1::zeros(2 * NDIM);
        for i in 0..NDIM {
            mean[i] = z[i];
        }
        let (w, h) = (z[2].max(MIN_EXTENT), z[3].max(MIN_EXTENT));
        mean[2] = w;
        mean[3] = h;

        let pos = 2.0 * self.std_weight_position;
        let vel = 10.0 * self.std_weight_velocity;
        let std = [
            pos * w,
            pos * h,
            pos * w,
            pos * h,
            vel * w,
            vel * h,
            vel * w,
            vel * h,
        ];
        MotionState {
            mean,
            covariance: Array2::from_diag(&Array1::from_iter(std.iter().map(|s| s * s))),
        }
    }

    fn process_noise(&self, mean: &Array1<f64>) -> Array2<f64> {
        let (w, h) = (mean[2].max(MIN_EXTENT), mean[3].max(MIN_EXTENT));
        let (p, v) = (self.std_weight_position, self.std_weight_velocity);
        let std = [p * w, p * h, p * w, p * h, v * w, v * h, v * w, v * h];
        Array2::from_diag(&Array1::from_iter(std.iter().map(|s| s * s)))
    }

    /// `x' = F x`, `P' = F P F^T + Q`, then bound and symmetrise `P`.
    pub fn predict(&self, state: &mut MotionState) {
        let q = self.process_noise(&state.mean);
        state.mean = self.motion_mat.dot(&state.mean);
        state.covariance = self.motion_mat.dot(&state.covariance).dot(&self.motion_mat.t()) + q;

        state.mean[2] = state.mean[2].max(MIN_EXTENT);
        state.mean[3] = state.mean[3].max(MIN_EXTENT);
        stabilize(&mut state.covariance);
    }

    /// Project the state into measurement space with confidence-scaled
    /// observation noise. Returns `(H x, S, R)`.
    fn project(&self, state: &MotionState, score: f32) -> (Array1<f64>, Array2<f64>, Array2<f64>) {
        let (w, h) = (state.mean[2].max(MIN_EXTENT), state.mean[3].max(MIN_EXTENT));
        let p = self.std_weight_position;
        let scale = (1.0 - score as f64).max(MIN_NOISE_SCALE);
        let std = [p * w, p * h, p * w, p * h];
        let r = Array2::from_diag(&Array1::from_iter(std.iter().map(|s| s * s * scale)));

        let mean = self.update_mat.dot(&state.mean);
        let cov = self.update_mat.dot(&state.covariance).dot(&self.update_mat.t()) + &r;
        (mean, cov, r)
    }

    /// Correction step. A confident detection (small `R`) or an uncertain
    /// prediction (large `P`) both increase the gain.
    pub fn update(&self, state: &mut MotionState, bbox: &Rect, score: f32) {
        let (projected_mean, projected_cov, r) = self.project(state, score);
        let z = Array1::from_vec(measurement(bbox).to_vec());
        let innovation = z - projected_mean;

        // K = P H^T S^-1, solved as S K^T = (P H^T)^T.
        let pht = state.covariance.dot(&self.update_mat.t());
        let Some(kalman_gain) = solve_gain(&projected_cov, &pht) else {
            warn!("innovation covariance is singular, keeping prediction");
            return;
        };

        state.mean = &state.mean + &kalman_gain.dot(&innovation);

        // Joseph form: (I - KH) P (I - KH)^T + K R K^T
        let i_kh = Array2::<f64>::eye(2 * NDIM) - kalman_gain.dot(&self.update_mat);
        state.covariance = i_kh.dot(&state.covariance).dot(&i_kh.t())
            + kalman_gain.dot(&r).dot(&kalman_gain.t());

        state.mean[2] = state.mean[2].max(MIN_EXTENT);
        state.mean[3] = state.mean[3].max(MIN_EXTENT);
        stabilize(&mut state.covariance);
    }
}

/// Solve `S X^T = B^T` for the 8x4 gain `X`.
fn solve_gain(s_mat: &Array2<f64>, pht: &Array2<f64>) -> Option<Array2<f64>> {
    let s = nalgebra::Matrix4::from_fn(|i, j| s_mat[[i, j]]);
    let b = nalgebra::SMatrix::<f64, 4, 8>::from_fn(|i, j| pht[[j, i]]);

    let kt = match s.cholesky() {
        Some(chol) => chol.solve(&b),
        None => {
            let regularized = s + nalgebra::Matrix4::identity() * 1e-6;
            regularized.lu().solve(&b)?
        }
    };
    if kt.iter().any(|v| !v.is_finite()) {
        return None;
    }
    Some(Array2::from_shape_fn((2 * NDIM, NDIM), |(i, j)| kt[(j, i)]))
}

/// Symmetrise and cap the covariance diagonal.
///
/// Rows/columns whose variance exceeds the cap are rescaled as `D P D`,
/// which keeps the matrix positive semi-definite.
fn stabilize(cov: &mut Array2<f64>) {
    let sym = (&*cov + &cov.t()) * 0.5;
    *cov = sym;

    let n = cov.nrows();
    let mut scale = Array1::<f64>::ones(n);
    for i in 0..n {
        let cap = if i < NDIM {
            MAX_POSITION_VARIANCE
        } else {
            MAX_VELOCITY_VARIANCE
        };
        let var = cov[[i, i]];
        if !var.is_finite() || var <= 0.0 {
            // Degenerate row: reset to an uncorrelated cap-sized variance.
            cov.slice_mut(s![i, ..]).fill(0.0);
            cov.slice_mut(s![.., i]).fill(0.0);
            cov[[i, i]] = cap;
        } else if var > cap {
            scale[i] = (cap / var).sqrt();
        }
    }
    for i in 0..n {
        for j in 0..n {
            cov[[i, j]] *= scale[i] * scale[j];
        }
    }
}
