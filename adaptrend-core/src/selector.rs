//! Adaptive selector: picks one representative factor from the best cluster.

use crate::cluster::Clustering;
use serde::{Deserialize, Serialize};

/// Guards the strength normalization when all scores are equal.
pub const STRENGTH_EPSILON: f64 = 1e-10;

/// Score spreads below this fraction of price are noise: one basis point.
pub const STRENGTH_NOISE_FLOOR: f64 = 1e-4;

/// Normalization epsilon at `price`, never below `STRENGTH_EPSILON`.
///
/// Scores are in price units: a spread well under one basis point of price
/// normalizes toward 0.
pub fn strength_epsilon(price: f64) -> f64 {
    let eps = STRENGTH_NOISE_FLOOR * price.abs();
    if eps.is_finite() {
        eps.max(STRENGTH_EPSILON)
    } else {
        STRENGTH_EPSILON
    }
}

/// Outcome of one selection cycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    /// Index into the sorted factor list.
    pub factor_index: usize,
    pub best_centroid: f64,
    /// 0..=10
    pub signal_strength: u8,
}

/// Select the best-cluster member closest to its centroid.
///
/// The most representative member is used rather than the top scorer, so a
/// single noisy factor cannot drag the adaptive line around. Ties go to the
/// lowest factor index. Returns `None` only if the best cluster is empty,
/// which cannot happen when there are at least `k` scores.
///
/// `eps` only affects strength; see [`strength_epsilon`].
pub fn select(clustering: &Clustering, scores: &[f64], eps: f64) -> Option<Selection> {
    let best = clustering.best_label();
    let centroid = clustering.centroids[best];

    let mut chosen: Option<(usize, f64)> = None;
    for i in clustering.members(best) {
        let d = (scores[i] - centroid).abs();
        if chosen.map_or(true, |(_, best_d)| d < best_d) {
            chosen = Some((i, d));
        }
    }

    let (min, max) = scores
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &s| {
            (lo.min(s), hi.max(s))
        });

    chosen.map(|(factor_index, _)| Selection {
        factor_index,
        best_centroid: centroid,
        signal_strength: signal_strength(centroid, min, max, eps),
    })
}

/// `round(10 * clamp((centroid - min) / (max - min + eps), 0, 1))`.
///
/// A non-finite ratio maps to 0.
pub fn signal_strength(best_centroid: f64, min: f64, max: f64, eps: f64) -> u8 {
    let ratio = (best_centroid - min) / (max - min + eps);
    if !ratio.is_finite() {
        return 0;
    }
    (10.0 * ratio.clamp(0.0, 1.0)).round() as u8
}
