//! Average True Range (ATR), computed incrementally.
//!
//! True Range: max(high-low, |high-prev_close|, |low-prev_close|)
//! ATR uses Wilder smoothing: atr[i] = (atr[i-1] * (p-1) + tr[i]) / p,
//! seeded with the mean of the first `p` true ranges.
//! Bar 0 has no previous close and contributes no true range, so the first
//! ATR value lands on bar index `p` (needs `p + 1` bars).

use crate::domain::Bar;
use crate::error::EngineError;
use serde::{Deserialize, Serialize};

/// True range of one bar against the previous close.
pub fn true_range(high: f64, low: f64, prev_close: f64) -> f64 {
    (high - low)
        .max((high - prev_close).abs())
        .max((low - prev_close).abs())
}

/// Result of feeding one bar into the ATR engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AtrStep {
    /// ATR after this bar, `None` during warm-up.
    pub value: Option<f64>,
    /// True range or the smoothed value was NaN/Inf and had to be substituted.
    pub degenerate: bool,
}

/// Streaming Wilder ATR.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtrEngine {
    period: usize,
    bars_seen: usize,
    prev_close: Option<f64>,
    seed_sum: f64,
    seed_count: usize,
    value: Option<f64>,
}

impl AtrEngine {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "ATR period must be >= 1");
        Self {
            period,
            bars_seen: 0,
            prev_close: None,
            seed_sum: 0.0,
            seed_count: 0,
            value: None,
        }
    }

    pub fn period(&self) -> usize {
        self.period
    }

    pub fn bars_seen(&self) -> usize {
        self.bars_seen
    }

    /// Feed the next bar.
    ///
    /// A non-finite true range, or a finite one that overflows the smoothing,
    /// is a degenerate numeric: once seeded the previous ATR is held, during
    /// seeding the true range counts as 0.
    pub fn update(&mut self, high: f64, low: f64, close: f64) -> AtrStep {
        self.bars_seen += 1;
        let prev_close = self.prev_close.replace(close);

        let Some(prev_close) = prev_close else {
            return AtrStep {
                value: None,
                degenerate: false,
            };
        };

        let raw = true_range(high, low, prev_close);
        let mut degenerate = !raw.is_finite();
        let p = self.period as f64;

        match self.value {
            Some(prev) => {
                let next = (prev * (p - 1.0) + raw) / p;
                if next.is_finite() {
                    self.value = Some(next);
                } else {
                    degenerate = true;
                }
            }
            None => {
                let sum = self.seed_sum + raw;
                if sum.is_finite() {
                    self.seed_sum = sum;
                } else {
                    degenerate = true;
                }
                self.seed_count += 1;
                if self.seed_count == self.period {
                    self.value = Some(self.seed_sum / p);
                }
            }
        }

        AtrStep {
            value: self.value,
            degenerate,
        }
    }

    /// Current ATR, or `InsufficientHistory` before bar index `p`.
    pub fn value(&self) -> Result<f64, EngineError> {
        self.value.ok_or(EngineError::InsufficientHistory {
            needed: self.period + 1,
            available: self.bars_seen,
        })
    }

    pub fn is_warm(&self) -> bool {
        self.value.is_some()
    }
}

/// ATR for a whole bar slice, `NaN` during warm-up.
///
/// Drives the streaming engine, so the result is identical to feeding the
/// same bars one at a time.
pub fn atr_series(bars: &[Bar], period: usize) -> Vec<f64> {
    let mut engine = AtrEngine::new(period);
    bars.iter()
        .map(|b| engine.update(b.high, b.low, b.close).value.unwrap_or(f64::NAN))
        .collect()
}
