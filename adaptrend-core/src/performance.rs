//! Performance tracker: per-factor exponentially weighted hit score.
//!
//! perf[i] = perf[i-1] + alpha * (sign(dir[i-1]) * (close[i] - close[i-1]) - perf[i-1])
//!
//! `dir[i-1]` is the candidate's direction at the end of the previous bar,
//! so the tracker must be advanced *before* the bank processes bar `i`.
//! Scores start at 0 on the first valid bar and are never clamped.

use crate::error::DataQualityEvent;
use crate::indicators::CandidateState;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceTracker {
    alpha: f64,
    perf_period: usize,
    scores: Vec<f64>,
    updates: usize,
}

impl PerformanceTracker {
    pub fn new(factor_count: usize, perf_period: usize) -> Self {
        Self {
            alpha: 2.0 / (perf_period as f64 + 1.0),
            perf_period,
            scores: vec![0.0; factor_count],
            updates: 0,
        }
    }

    pub fn scores(&self) -> &[f64] {
        &self.scores
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Number of updates applied since the first valid bar.
    pub fn updates(&self) -> usize {
        self.updates
    }

    /// True once `perf_period` price changes have been scored.
    pub fn is_warm(&self) -> bool {
        self.updates >= self.perf_period
    }

    /// Score the previous bar's directions against this bar's price change.
    ///
    /// Non-finite results are replaced by 0 for this bar only; each
    /// replacement is returned as a data-quality event.
    pub fn update(
        &mut self,
        bar_index: usize,
        prev_states: &[CandidateState],
        factors: &[f64],
        price_change: f64,
    ) -> Vec<DataQualityEvent> {
        debug_assert_eq!(prev_states.len(), self.scores.len());
        let mut events = Vec::new();
        for ((score, state), &factor) in self.scores.iter_mut().zip(prev_states).zip(factors) {
            let target = state.direction.sign() * price_change;
            let next = *score + self.alpha * (target - *score);
            *score = if next.is_finite() {
                next
            } else {
                tracing::warn!(bar_index, factor, "degenerate performance score, substituting 0");
                events.push(DataQualityEvent::DegeneratePerformance { bar_index, factor });
                0.0
            };
        }
        self.updates += 1;
        events
    }
}
