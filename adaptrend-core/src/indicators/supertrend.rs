//! Supertrend: ATR-based directional trailing stop, one bar at a time.
//!
//! Inherently sequential/stateful: direction flips between support and
//! resistance based on close vs band comparisons.
//!
//! Active band: the lower band (support) when bullish, the upper band
//! (resistance) when bearish.

use crate::domain::Trend;
use serde::{Deserialize, Serialize};

/// State of one candidate line (one factor) after a bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CandidateState {
    pub upper: f64,
    pub lower: f64,
    pub direction: Trend,
    /// Bar index of the most recent flip (the seed bar until the first flip).
    pub last_flip_index: usize,
}

impl CandidateState {
    /// Initialize at the first bar with a valid ATR.
    ///
    /// Both bands come straight from the raw formulas (no prior ratchet).
    /// Direction is the sign of `close - midpoint`; a close exactly on the
    /// midpoint seeds bullish.
    ///
    /// A band that overflows starts at `±f64::MAX`.
    pub fn seed(bar_index: usize, high: f64, low: f64, close: f64, atr: f64, factor: f64) -> Self {
        let mid = midpoint(high, low);
        let direction = if close >= mid {
            Trend::Bullish
        } else {
            Trend::Bearish
        };
        Self {
            upper: finite_or(mid + factor * atr, f64::MAX),
            lower: finite_or(mid - factor * atr, -f64::MAX),
            direction,
            last_flip_index: bar_index,
        }
    }

    /// Advance by one bar. Returns true if the direction flipped.
    ///
    /// A basic band that overflows leaves that band where it was.
    #[allow(clippy::too_many_arguments)]
    pub fn update(
        &mut self,
        bar_index: usize,
        high: f64,
        low: f64,
        close: f64,
        prev_close: f64,
        atr: f64,
        factor: f64,
    ) -> bool {
        let mid = midpoint(high, low);
        let basic_upper = finite_or(mid + factor * atr, self.upper);
        let basic_lower = finite_or(mid - factor * atr, self.lower);

        // Upper band: can only decrease (tighten resistance) while price
        // stayed below it.
        self.upper = if prev_close <= self.upper {
            basic_upper.min(self.upper)
        } else {
            basic_upper
        };

        // Lower band: can only increase (tighten support) while price
        // stayed above it.
        self.lower = if prev_close >= self.lower {
            basic_lower.max(self.lower)
        } else {
            basic_lower
        };

        let flipped = match self.direction {
            Trend::Bullish => close < self.lower,
            Trend::Bearish => close > self.upper,
        };
        if flipped {
            self.direction = self.direction.opposite();
            self.last_flip_index = bar_index;
        }
        flipped
    }

    /// Current trailing stop: lower band when bullish, upper band when bearish.
    pub fn active_band(&self) -> f64 {
        match self.direction {
            Trend::Bullish => self.lower,
            Trend::Bearish => self.upper,
        }
    }
}

/// `(high + low) / 2` without overflowing for bars near `f64::MAX`.
fn midpoint(high: f64, low: f64) -> f64 {
    high / 2.0 + low / 2.0
}

fn finite_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        fallback
    }
}
