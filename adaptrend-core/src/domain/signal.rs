//! Trend state and the discrete BUY/SELL events emitted on trend flips.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Discrete trend of a candidate line or of the adaptive line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Trend {
    Bullish,
    Bearish,
}

impl Trend {
    /// +1.0 for bullish, -1.0 for bearish.
    pub fn sign(self) -> f64 {
        match self {
            Trend::Bullish => 1.0,
            Trend::Bearish => -1.0,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Trend::Bullish => Trend::Bearish,
            Trend::Bearish => Trend::Bullish,
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trend::Bullish => write!(f, "bullish"),
            Trend::Bearish => write!(f, "bearish"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalKind {
    Buy,
    Sell,
}

impl SignalKind {
    /// The signal a flip *into* `trend` produces.
    pub fn for_trend(trend: Trend) -> Self {
        match trend {
            Trend::Bullish => SignalKind::Buy,
            Trend::Bearish => SignalKind::Sell,
        }
    }
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalKind::Buy => write!(f, "BUY"),
            SignalKind::Sell => write!(f, "SELL"),
        }
    }
}

/// A trend flip of the adaptive line. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub kind: SignalKind,
    pub bar_index: usize,
    pub timestamp: NaiveDateTime,
    /// Close of the bar on which the flip happened.
    pub price: f64,
    /// Signal strength (0..=10) at flip time.
    pub confidence: u8,
}
