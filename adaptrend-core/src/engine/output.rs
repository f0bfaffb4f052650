//! Per-bar snapshots and run-level results.

use crate::domain::{Signal, SignalKind, Trend};
use crate::engine::diagnostics::Diagnostics;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Cluster label of one factor in the current clustering cycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FactorAssignment {
    pub factor: f64,
    pub cluster: usize,
}

/// The engine's public result for one bar. Immutable once returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdaptiveOutput {
    pub bar_index: usize,
    pub timestamp: NaiveDateTime,
    pub close: f64,
    pub atr: f64,
    pub selected_factor: f64,
    /// Active band of the selected candidate.
    pub trend_line: f64,
    pub trend: Trend,
    /// 0..=10
    pub signal_strength: u8,
    pub best_centroid: f64,
    /// Centroid per cluster label, ascending; the last one is the best cluster.
    pub centroids: Vec<f64>,
    pub cluster_assignments: Vec<FactorAssignment>,
    /// Performance score per factor, in factor order.
    pub performance: Vec<f64>,
    /// False until `perf_period` price changes have been scored.
    pub performance_warm: bool,
    /// Signal emitted on this bar, if the trend flipped.
    pub signal: Option<Signal>,
}

impl AdaptiveOutput {
    /// Cluster label of a factor, if it is part of the configured set.
    pub fn cluster_of(&self, factor: f64) -> Option<usize> {
        self.cluster_assignments
            .iter()
            .find(|a| a.factor == factor)
            .map(|a| a.cluster)
    }

    /// Factors in the best cluster.
    pub fn best_cluster_factors(&self) -> Vec<f64> {
        let best = self.centroids.len().saturating_sub(1);
        self.cluster_assignments
            .iter()
            .filter(|a| a.cluster == best)
            .map(|a| a.factor)
            .collect()
    }
}

/// Outcome of feeding one bar to the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum BarUpdate {
    /// Not enough history yet; nothing was produced.
    WarmingUp { bars_until_warm: usize },
    Output(Box<AdaptiveOutput>),
    /// Bar was dropped (out of order or void). State is untouched.
    Rejected,
}

impl BarUpdate {
    pub fn output(&self) -> Option<&AdaptiveOutput> {
        match self {
            BarUpdate::Output(o) => Some(o),
            _ => None,
        }
    }

    pub fn into_output(self) -> Option<AdaptiveOutput> {
        match self {
            BarUpdate::Output(o) => Some(*o),
            _ => None,
        }
    }
}

/// Everything a batch run produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunOutput {
    pub outputs: Vec<AdaptiveOutput>,
    pub signals: Vec<Signal>,
    pub diagnostics: Diagnostics,
}

impl RunOutput {
    /// Selected factor per output bar.
    pub fn adaptive_factor_series(&self) -> Vec<f64> {
        self.outputs.iter().map(|o| o.selected_factor).collect()
    }

    /// Best-cluster centroid per output bar.
    pub fn performance_series(&self) -> Vec<f64> {
        self.outputs.iter().map(|o| o.best_centroid).collect()
    }

    pub fn trend_line_series(&self) -> Vec<f64> {
        self.outputs.iter().map(|o| o.trend_line).collect()
    }

    pub fn signal_strength_series(&self) -> Vec<u8> {
        self.outputs.iter().map(|o| o.signal_strength).collect()
    }

    pub fn trend_series(&self) -> Vec<Trend> {
        self.outputs.iter().map(|o| o.trend).collect()
    }

    pub fn count(&self, kind: SignalKind) -> usize {
        self.signals.iter().filter(|s| s.kind == kind).count()
    }

    pub fn last(&self) -> Option<&AdaptiveOutput> {
        self.outputs.last()
    }
}
