//! Serializable engine state for exact resumption.

use crate::cluster::Clustering;
use crate::domain::ConfigHash;
use crate::engine::diagnostics::Diagnostics;
use crate::engine::output::AdaptiveOutput;
use crate::engine::warmup::WarmupState;
use crate::error::EngineError;
use crate::indicators::{AtrEngine, CandidateState};
use crate::performance::PerformanceTracker;
use crate::selector::Selection;
use crate::signals::{SignalEmitter, SignalLog};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Everything an engine needs to continue exactly where it stopped.
///
/// Captured with `AdaptiveEngine::snapshot` and restored with
/// `AdaptiveEngine::resume`. The state records the hash of the config that
/// produced it; resuming under a different config is refused.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineState {
    pub config_hash: ConfigHash,
    /// Accepted bars so far; the next accepted bar gets this index.
    pub bar_count: usize,
    pub last_timestamp: Option<NaiveDateTime>,
    pub last_close: Option<f64>,
    pub atr: AtrEngine,
    pub warmup: WarmupState,
    /// Empty until the first bar with a valid ATR.
    pub candidates: Vec<CandidateState>,
    pub tracker: PerformanceTracker,
    pub clustering: Option<Clustering>,
    pub selection: Option<Selection>,
    /// Bars that produced an output; drives the clustering cadence.
    pub valid_bars: usize,
    pub emitter: SignalEmitter,
    pub signals: SignalLog,
    pub diagnostics: Diagnostics,
    pub last_output: Option<AdaptiveOutput>,
}

impl EngineState {
    pub fn to_json(&self) -> Result<String, EngineError> {
        serde_json::to_string(self).map_err(|e| EngineError::CorruptState(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        serde_json::from_str(json).map_err(|e| EngineError::CorruptState(e.to_string()))
    }
}
