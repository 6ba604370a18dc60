//! Data association between predicted tracks and current-frame detections.
//!
//! Costs live in `[0, 1]`. Entries above the gate, or pairs that are
//! otherwise inadmissible, are set to `f32::INFINITY` and can never be
//! matched.

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::InputError;
use crate::tracker::rect::Rect;

/// Cost assigned to forbidden or padding cells inside the solver matrix.
/// Must dominate any sum of admissible costs.
const SOLVER_FORBIDDEN_COST: f64 = 1e6;

/// Detection input for the tracker.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    /// Bounding box, pixel units
    pub bbox: Rect,
    /// Detection confidence score in `[0, 1]`
    pub score: f32,
    /// Class label reported by the detector
    pub class_id: u32,
    /// Opaque appearance embedding, if the detector provides one
    pub feature: Option<Vec<f32>>,
}

impl Detection {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32, score: f32) -> Self {
        Self::from_rect(Rect::from_tlbr(x1, y1, x2, y2), score)
    }

    pub fn from_rect(bbox: Rect, score: f32) -> Self {
        Self {
            bbox,
            score,
            class_id: 0,
            feature: None,
        }
    }

    pub fn with_class(mut self, class_id: u32) -> Self {
        self.class_id = class_id;
        self
    }

    pub fn with_feature(mut self, feature: Vec<f32>) -> Self {
        self.feature = Some(feature);
        self
    }

    /// Check the record before it enters the tracker.
    pub fn validate(&self) -> Result<(), InputError> {
        if !self.bbox.is_valid() {
            let tlbr = self.bbox.to_tlbr();
            return Err(if tlbr.iter().any(|v| !v.is_finite()) {
                InputError::NonFiniteBox(tlbr)
            } else {
                InputError::EmptyExtent {
                    width: self.bbox.width,
                    height: self.bbox.height,
                }
            });
        }
        if !(0.0..=1.0).contains(&self.score) {
            return Err(InputError::ScoreOutOfRange(self.score));
        }
        if let Some(feature) = &self.feature {
            if feature.is_empty() || feature.iter().any(|v| !v.is_finite()) {
                return Err(InputError::NonFiniteFeature);
            }
        }
        Ok(())
    }
}

/// How spatial disagreement between a prediction and a detection is scored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotionCost {
    /// `1 - IoU`
    #[default]
    Iou,
    /// Center distance divided by the predicted box diagonal, clipped to 1.
    CenterDistance,
}

/// Bipartite assignment strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentSolver {
    /// Exact minimum-cost assignment (Jonker-Volgenant).
    #[default]
    Optimal,
    /// Ascending cost, ties broken by lowest track then lowest detection index.
    Greedy,
}

/// Compute the motion cost matrix between predicted tracks and detections.
pub fn motion_distance(track_boxes: &[Rect], det_boxes: &[Rect], kind: MotionCost) -> Array2<f32> {
    let mut dists = Array2::zeros((track_boxes.len(), det_boxes.len()));
    for (i, t) in track_boxes.iter().enumerate() {
        for (j, d) in det_boxes.iter().enumerate() {
            dists[[i, j]] = match kind {
                MotionCost::Iou => 1.0 - t.iou(d),
                MotionCost::CenterDistance => {
                    let diag = t.diagonal();
                    if diag > f32::EPSILON {
                        (t.center_distance(d) / diag).min(1.0)
                    } else {
                        1.0
                    }
                }
            };
        }
    }
    dists
}

/// Cosine distance in `[0, 1]` between two descriptors.
///
/// Returns `None` when lengths differ or either vector has zero norm.
pub fn cosine_distance(a: &[f32], b: &[f32]) -> Option<f32> {
    if a.len() != b.len() || a.is_empty() {
        return None;
    }
    let (mut dot, mut na, mut nb) = (0.0f32, 0.0f32, 0.0f32);
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        na += x * x;
        nb += y * y;
    }
    let norm = na.sqrt() * nb.sqrt();
    if norm <= f32::EPSILON {
        return None;
    }
    Some(((1.0 - dot / norm) / 2.0).clamp(0.0, 1.0))
}

/// Forbid pairs whose motion cost reaches `motion_gate`.
///
/// Runs before appearance is blended in, so a matching descriptor can never
/// pull a track onto a detection it does not overlap (IoU) or that lies a
/// full diagonal away (center distance).
pub fn gate_motion(motion: &mut Array2<f32>, motion_gate: f32) {
    motion.mapv_inplace(|c| if c.is_nan() || c >= motion_gate { f32::INFINITY } else { c });
}

/// Blend motion and appearance into one cost matrix.
///
/// Pairs where either side lacks a comparable descriptor fall back to the
/// motion cost alone. Motion-gated (infinite) pairs stay infinite.
pub fn blend_appearance(
    motion: &Array2<f32>,
    track_features: &[Option<&[f32]>],
    detections: &[Detection],
    motion_weight: f32,
    appearance_weight: f32,
) -> Array2<f32> {
    let mut cost = motion.clone();
    if appearance_weight <= 0.0 {
        return cost;
    }
    let total = motion_weight + appearance_weight;
    let (rows, cols) = cost.dim();
    for i in 0..rows {
        let Some(track_feat) = track_features[i] else {
            continue;
        };
        for j in 0..cols {
            let det_feat = detections[j].feature.as_deref();
            if let Some(app) = det_feat.and_then(|f| cosine_distance(track_feat, f)) {
                cost[[i, j]] = (motion_weight * motion[[i, j]] + appearance_weight * app) / total;
            }
        }
    }
    cost
}

/// Weight similarity by detection confidence: `1 - (1 - cost) * score`.
pub fn fuse_score(cost_matrix: &mut Array2<f32>, detections: &[Detection]) {
    let (rows, cols) = cost_matrix.dim();
    for i in 0..rows {
        for j in 0..cols {
            let sim = 1.0 - cost_matrix[[i, j]];
            cost_matrix[[i, j]] = 1.0 - sim * detections[j].score;
        }
    }
}

/// Forbid pairs whose class labels disagree.
pub fn gate_classes(cost_matrix: &mut Array2<f32>, track_classes: &[u32], detections: &[Detection]) {
    let (rows, cols) = cost_matrix.dim();
    for i in 0..rows {
        for j in 0..cols {
            if track_classes[i] != detections[j].class_id {
                cost_matrix[[i, j]] = f32::INFINITY;
            }
        }
    }
}

/// Forbid every entry above `thresh` (and any NaN).
pub fn gate(cost_matrix: &mut Array2<f32>, thresh: f32) {
    cost_matrix.mapv_inplace(|c| if c.is_nan() || c > thresh { f32::INFINITY } else { c });
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssignmentResult {
    /// `(track index, detection index)`, ascending by track index
    pub matches: Vec<(usize, usize)>,
    pub unmatched_tracks: Vec<usize>,
    pub unmatched_detections: Vec<usize>,
}

impl AssignmentResult {
    fn all_unmatched(num_rows: usize, num_cols: usize) -> Self {
        Self {
            matches: vec![],
            unmatched_tracks: (0..num_rows).collect(),
            unmatched_detections: (0..num_cols).collect(),
        }
    }

    fn from_pairs(mut matches: Vec<(usize, usize)>, num_rows: usize, num_cols: usize) -> Self {
        matches.sort_unstable();
        let mut row_free = vec![true; num_rows];
        let mut col_free = vec![true; num_cols];
        for &(i, j) in &matches {
            row_free[i] = false;
            col_free[j] = false;
        }
        let free = |mask: Vec<bool>| -> Vec<usize> {
            mask.iter()
                .enumerate()
                .filter_map(|(i, &u)| if u { Some(i) } else { None })
                .collect()
        };
        Self {
            matches,
            unmatched_tracks: free(row_free),
            unmatched_detections: free(col_free),
        }
    }
}

fn admissible(cost: f32, thresh: f32) -> bool {
    cost.is_finite() && cost <= thresh
}

/// Resolve the cost matrix with the chosen solver. Pairs whose cost is
/// infinite or above `thresh` are left unmatched, never forced.
pub fn assign(cost_matrix: &Array2<f32>, thresh: f32, solver: AssignmentSolver) -> AssignmentResult {
    match solver {
        AssignmentSolver::Optimal => linear_assignment(cost_matrix, thresh),
        AssignmentSolver::Greedy => greedy_assignment(cost_matrix, thresh),
    }
}

/// Exact minimum-cost assignment via Jonker-Volgenant on a square, padded
/// matrix. Falls back to [`greedy_assignment`] if the solver fails.
pub fn linear_assignment(cost_matrix: &Array2<f32>, thresh: f32) -> AssignmentResult {
    let (num_rows, num_cols) = cost_matrix.dim();
    if num_rows == 0 || num_cols == 0 {
        return AssignmentResult::all_unmatched(num_rows, num_cols);
    }
    if !cost_matrix.iter().any(|&c| admissible(c, thresh)) {
        return AssignmentResult::all_unmatched(num_rows, num_cols);
    }
    // A single row or column: the cheapest admissible cell is optimal.
    if num_rows == 1 || num_cols == 1 {
        return greedy_assignment(cost_matrix, thresh);
    }

    let size = num_rows.max(num_cols);
    let mut padded = Array2::<f64>::from_elem((size, size), SOLVER_FORBIDDEN_COST);
    for ((i, j), &c) in cost_matrix.indexed_iter() {
        if admissible(c, thresh) {
            padded[[i, j]] = c as f64;
        }
    }

    match lapjv::lapjv(&padded) {
        Ok((row_to_col, _)) => {
            let matches = row_to_col
                .iter()
                .enumerate()
                .take(num_rows)
                .filter(|&(i, &j)| j < num_cols && admissible(cost_matrix[[i, j]], thresh))
                .map(|(i, &j)| (i, j))
                .collect();
            AssignmentResult::from_pairs(matches, num_rows, num_cols)
        }
        Err(err) => {
            warn!(?err, "lapjv failed, falling back to greedy assignment");
            greedy_assignment(cost_matrix, thresh)
        }
    }
}

/// Deterministic greedy assignment: visit admissible pairs by ascending
/// cost, ties broken by lowest track index then lowest detection index.
pub fn greedy_assignment(cost_matrix: &Array2<f32>, thresh: f32) -> AssignmentResult {
    let (num_rows, num_cols) = cost_matrix.dim();
    let mut candidates: Vec<(f32, usize, usize)> = cost_matrix
        .indexed_iter()
        .filter(|&(_, &c)| admissible(c, thresh))
        .map(|((i, j), &c)| (c, i, j))
        .collect();
    candidates.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)).then(a.2.cmp(&b.2)));

    let mut row_used = vec![false; num_rows];
    let mut col_used = vec![false; num_cols];
    let mut matches = Vec::new();
    for (_, i, j) in candidates {
        if !row_used[i] && !col_used[j] {
            row_used[i] = true;
            col_used[j] = true;
            matches.push((i, j));
        }
    }
    AssignmentResult::from_pairs(matches, num_rows, num_cols)
}
