//! Candidate line bank: one supertrend line per configured factor.
//!
//! Per-factor state lives in a single `Vec<CandidateState>` indexed by a
//! stable factor index (factors sorted ascending). The `factor -> index`
//! table is built once at construction; the per-bar loop never hashes.

use crate::domain::Bar;
use crate::error::EngineError;
use crate::indicators::CandidateState;
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
pub struct CandidateBank {
    factors: Vec<f64>,
    /// Keyed by `f64::to_bits`; factors are positive and finite.
    index: BTreeMap<u64, usize>,
    states: Vec<CandidateState>,
}

impl CandidateBank {
    /// `factors` must already be validated (sorted, positive, unique).
    pub fn new(factors: Vec<f64>) -> Self {
        let index = factors
            .iter()
            .enumerate()
            .map(|(i, f)| (f.to_bits(), i))
            .collect();
        Self {
            factors,
            index,
            states: Vec::new(),
        }
    }

    /// Rebuild a bank from previously captured candidate states.
    pub fn from_states(factors: Vec<f64>, states: Vec<CandidateState>) -> Result<Self, EngineError> {
        if !states.is_empty() && states.len() != factors.len() {
            return Err(EngineError::CorruptState(format!(
                "{} candidate states for {} factors",
                states.len(),
                factors.len()
            )));
        }
        let mut bank = Self::new(factors);
        bank.states = states;
        Ok(bank)
    }

    pub fn factors(&self) -> &[f64] {
        &self.factors
    }

    pub fn len(&self) -> usize {
        self.factors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factors.is_empty()
    }

    /// Index of an exact factor value.
    pub fn index_of(&self, factor: f64) -> Option<usize> {
        self.index.get(&factor.to_bits()).copied()
    }

    /// True once the first valid bar has initialized every candidate.
    pub fn is_seeded(&self) -> bool {
        !self.states.is_empty()
    }

    pub fn states(&self) -> &[CandidateState] {
        &self.states
    }

    pub fn state(&self, index: usize) -> Option<&CandidateState> {
        self.states.get(index)
    }

    /// Initialize all candidates at the first bar with a valid ATR.
    pub fn seed(&mut self, bar_index: usize, bar: &Bar, atr: f64) {
        self.states = self
            .factors
            .iter()
            .map(|&f| CandidateState::seed(bar_index, bar.high, bar.low, bar.close, atr, f))
            .collect();
    }

    /// Advance every candidate by one bar. Returns the number of flips.
    pub fn update(&mut self, bar_index: usize, bar: &Bar, prev_close: f64, atr: f64) -> usize {
        let mut flips = 0;
        for (state, &factor) in self.states.iter_mut().zip(&self.factors) {
            if state.update(bar_index, bar.high, bar.low, bar.close, prev_close, atr, factor) {
                tracing::trace!(bar_index, factor, direction = %state.direction, "candidate flip");
                flips += 1;
            }
        }
        flips
    }
}
