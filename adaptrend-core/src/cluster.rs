//! Online clusterer: deterministic 1-D k-means over performance scores.
//!
//! Each cycle starts from scratch:
//! 1. Seed centroids from order statistics (k=3: min, mean, max). No RNG.
//! 2. Assign every value to the nearest centroid (ties: lowest cluster index).
//! 3. Recompute centroids as member means.
//! 4. Repair empty clusters with a farthest-point reseed.
//! 5. Repeat until assignments stop changing or `max_iterations` is reached.
//!
//! Raw k-means labels carry no meaning. `sort_by_centroid` relabels them so
//! that label `k - 1` is always the highest-centroid non-empty cluster.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Result of one clustering cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clustering {
    /// Cluster label per input value (same order as the input).
    pub labels: Vec<usize>,
    /// Centroid per cluster label.
    pub centroids: Vec<f64>,
    /// k-means iterations actually run.
    pub iterations: usize,
}

impl Clustering {
    pub fn k(&self) -> usize {
        self.centroids.len()
    }

    /// Label of the best cluster (only meaningful after `sort_by_centroid`).
    pub fn best_label(&self) -> usize {
        self.k() - 1
    }

    /// Indices of the values assigned to `cluster`.
    pub fn members(&self, cluster: usize) -> impl Iterator<Item = usize> + '_ {
        self.labels
            .iter()
            .enumerate()
            .filter(move |&(_, &l)| l == cluster)
            .map(|(i, _)| i)
    }

    pub fn member_counts(&self) -> Vec<usize> {
        counts(&self.labels, self.k())
    }
}

/// Deterministic initial centroids.
///
/// k=1: `[mean]`, k=2: `[min, max]`, k=3: `[min, mean, max]`,
/// k>3: `[min, evenly spaced order statistics, max]`.
pub fn seed_centroids(values: &[f64], k: usize) -> Vec<f64> {
    if values.is_empty() || k == 0 {
        return vec![0.0; k];
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mean = mean(values.iter().copied());

    match k {
        1 => vec![mean],
        2 => vec![min, max],
        3 => vec![min, mean, max],
        _ => {
            let mut sorted = values.to_vec();
            sorted.sort_by(|a, b| a.total_cmp(b));
            let last = sorted.len() - 1;
            (0..k)
                .map(|j| match j {
                    0 => min,
                    j if j == k - 1 => max,
                    j => {
                        let pos = (j as f64 * last as f64 / (k - 1) as f64).round() as usize;
                        sorted[pos.min(last)]
                    }
                })
                .collect()
        }
    }
}

/// Raw k-means: labels are in seed order, not sorted by centroid.
///
/// `values` must be finite. With at least `k` values every returned cluster
/// is non-empty.
pub fn kmeans(values: &[f64], k: usize, max_iterations: usize) -> Clustering {
    let mut centroids = seed_centroids(values, k);
    let mut labels = vec![usize::MAX; values.len()];
    let mut iterations = 0;

    if values.is_empty() || k == 0 {
        return Clustering {
            labels: Vec::new(),
            centroids,
            iterations,
        };
    }

    for _ in 0..max_iterations.max(1) {
        iterations += 1;

        let mut next: Vec<usize> = values.iter().map(|&v| nearest(&centroids, v)).collect();
        recompute_centroids(values, &next, &mut centroids);
        reseed_empty(values, &mut next, &mut centroids);

        let changed = next != labels;
        labels = next;
        if !changed {
            break;
        }
    }

    Clustering {
        labels,
        centroids,
        iterations,
    }
}

/// Relabel clusters in ascending (non-empty, centroid, raw label) order.
///
/// After this step label `k - 1` is the non-empty cluster with the highest
/// centroid; empty clusters (only possible with fewer values than `k`) sort
/// first.
pub fn sort_by_centroid(raw: Clustering) -> Clustering {
    let k = raw.k();
    let counts = counts(&raw.labels, k);

    let mut order: Vec<usize> = (0..k).collect();
    order.sort_by(|&a, &b| {
        (counts[a] > 0)
            .cmp(&(counts[b] > 0))
            .then_with(|| raw.centroids[a].total_cmp(&raw.centroids[b]))
            .then_with(|| a.cmp(&b))
    });

    let mut remap = vec![0; k];
    for (new_label, &old_label) in order.iter().enumerate() {
        remap[old_label] = new_label;
    }

    Clustering {
        labels: raw.labels.iter().map(|&l| remap[l]).collect(),
        centroids: order.iter().map(|&old| raw.centroids[old]).collect(),
        iterations: raw.iterations,
    }
}

/// Full clustering cycle: k-means followed by the centroid re-sort.
pub fn cluster(values: &[f64], k: usize, max_iterations: usize) -> Clustering {
    sort_by_centroid(kmeans(values, k, max_iterations))
}

fn nearest(centroids: &[f64], value: f64) -> usize {
    let mut best = 0;
    let mut best_dist = f64::INFINITY;
    for (c, &centroid) in centroids.iter().enumerate() {
        let d = (value - centroid).abs();
        if d < best_dist {
            best = c;
            best_dist = d;
        }
    }
    best
}

fn counts(labels: &[usize], k: usize) -> Vec<usize> {
    let mut counts = vec![0; k];
    for &l in labels {
        if l < k {
            counts[l] += 1;
        }
    }
    counts
}

/// Arithmetic mean of a non-empty sequence.
///
/// Falls back to summing `v / n` when the plain sum overflows, so finite
/// inputs always give a finite mean.
fn mean(values: impl Iterator<Item = f64> + Clone) -> f64 {
    let (sum, n) = values.clone().fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    let n = n as f64;
    if sum.is_finite() {
        sum / n
    } else {
        values.map(|v| v / n).sum()
    }
}

fn members_of<'a>(
    values: &'a [f64],
    labels: &'a [usize],
    cluster: usize,
) -> impl Iterator<Item = f64> + Clone + 'a {
    values
        .iter()
        .zip(labels.iter())
        .filter(move |&(_, &l)| l == cluster)
        .map(|(&v, _)| v)
}

/// Member means. Empty clusters keep their previous centroid until reseeded.
fn recompute_centroids(values: &[f64], labels: &[usize], centroids: &mut [f64]) {
    let counts = counts(labels, centroids.len());
    for (c, centroid) in centroids.iter_mut().enumerate() {
        if counts[c] > 0 {
            *centroid = mean(members_of(values, labels, c));
        }
    }
}

/// Farthest-point reseed: each empty cluster takes the value farthest from
/// its assigned centroid, drawn only from clusters with more than one member.
fn reseed_empty(values: &[f64], labels: &mut [usize], centroids: &mut [f64]) {
    let k = centroids.len();
    let mut counts = counts(labels, k);

    for empty in 0..k {
        if counts[empty] > 0 {
            continue;
        }

        let mut farthest: Option<(usize, f64)> = None;
        for (i, &v) in values.iter().enumerate() {
            let l = labels[i];
            if counts[l] <= 1 {
                continue;
            }
            let d = (v - centroids[l]).abs();
            let further = match farthest {
                None => true,
                Some((_, best)) => d.partial_cmp(&best) == Some(Ordering::Greater),
            };
            if further {
                farthest = Some((i, d));
            }
        }

        let Some((i, _)) = farthest else {
            return;
        };
        let donor = labels[i];
        labels[i] = empty;
        counts[donor] -= 1;
        counts[empty] += 1;
        centroids[empty] = values[i];

        centroids[donor] = mean(members_of(values, labels, donor));
    }
}
