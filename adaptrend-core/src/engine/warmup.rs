use serde::{Deserialize, Serialize};

/// Warmup state tracker
///
/// The engine produces nothing until `atr_period + 1` accepted bars have
/// been seen (bar 0 has no true range).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WarmupState {
    warmup_bars: usize,
    bars_processed: usize,
}

impl WarmupState {
    pub fn new(warmup_bars: usize) -> Self {
        Self {
            warmup_bars,
            bars_processed: 0,
        }
    }

    /// Warmup needed before the first output for a given ATR period.
    pub fn for_atr_period(atr_period: usize) -> Self {
        Self::new(atr_period + 1)
    }

    pub fn process_bar(&mut self) {
        self.bars_processed += 1;
    }

    pub fn is_warm(&self) -> bool {
        self.bars_processed >= self.warmup_bars
    }

    pub fn bars_processed(&self) -> usize {
        self.bars_processed
    }

    pub fn warmup_bars(&self) -> usize {
        self.warmup_bars
    }

    pub fn bars_until_warm(&self) -> usize {
        self.warmup_bars.saturating_sub(self.bars_processed)
    }
}
