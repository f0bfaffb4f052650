//! Signal emitter: two-state machine over the adaptive trend.
//!
//! States: {Bullish, Bearish}. The first observed trend initializes the
//! state without emitting. After that, every change of trend emits exactly
//! one signal: BUY on a flip into bullish, SELL on a flip into bearish.
//! There is no terminal state.

use crate::domain::{Signal, SignalKind, Trend};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SignalEmitter {
    state: Option<Trend>,
}

impl SignalEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state, `None` before the first valid bar.
    pub fn state(&self) -> Option<Trend> {
        self.state
    }

    /// Feed the adaptive trend of one bar.
    pub fn observe(
        &mut self,
        bar_index: usize,
        timestamp: NaiveDateTime,
        close: f64,
        trend: Trend,
        signal_strength: u8,
    ) -> Option<Signal> {
        let previous = self.state.replace(trend)?;
        if previous == trend {
            return None;
        }
        Some(Signal {
            kind: SignalKind::for_trend(trend),
            bar_index,
            timestamp,
            price: close,
            confidence: signal_strength,
        })
    }
}

/// Ordered, append-only signal log.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignalLog {
    signals: Vec<Signal>,
}

impl SignalLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, signal: Signal) {
        debug_assert!(self
            .signals
            .last()
            .map_or(true, |last| last.bar_index < signal.bar_index));
        self.signals.push(signal);
    }

    pub fn as_slice(&self) -> &[Signal] {
        &self.signals
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Signal> {
        self.signals.iter()
    }

    pub fn len(&self) -> usize {
        self.signals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }

    pub fn last(&self) -> Option<&Signal> {
        self.signals.last()
    }

    /// Signals emitted at or after `bar_index`.
    pub fn since(&self, bar_index: usize) -> &[Signal] {
        let start = self.signals.partition_point(|s| s.bar_index < bar_index);
        &self.signals[start..]
    }

    pub fn count(&self, kind: SignalKind) -> usize {
        self.signals.iter().filter(|s| s.kind == kind).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn first_observation_initializes_without_signal() {
        let mut e = SignalEmitter::new();
        assert_eq!(e.state(), None);
        assert!(e.observe(10, ts(1), 100.0, Trend::Bearish, 3).is_none());
        assert_eq!(e.state(), Some(Trend::Bearish));
    }

    #[test]
    fn flips_emit_buy_and_sell() {
        let mut e = SignalEmitter::new();
        e.observe(10, ts(1), 100.0, Trend::Bearish, 3);
        assert!(e.observe(11, ts(2), 99.0, Trend::Bearish, 3).is_none());

        let buy = e.observe(12, ts(3), 104.0, Trend::Bullish, 7).unwrap();
        assert_eq!(buy.kind, SignalKind::Buy);
        assert_eq!(buy.bar_index, 12);
        assert_eq!(buy.price, 104.0);
        assert_eq!(buy.confidence, 7);

        let sell = e.observe(13, ts(4), 97.0, Trend::Bearish, 2).unwrap();
        assert_eq!(sell.kind, SignalKind::Sell);
        assert_eq!(e.state(), Some(Trend::Bearish));
    }

    #[test]
    fn log_queries() {
        let mut e = SignalEmitter::new();
        let mut log = SignalLog::new();
        let trends = [
            Trend::Bullish,
            Trend::Bearish,
            Trend::Bearish,
            Trend::Bullish,
            Trend::Bearish,
        ];
        for (i, t) in trends.iter().enumerate() {
            if let Some(s) = e.observe(i, ts(i as u32 + 1), 100.0, *t, 5) {
                log.push(s);
            }
        }
        assert_eq!(log.len(), 3);
        assert_eq!(log.count(SignalKind::Sell), 2);
        assert_eq!(log.count(SignalKind::Buy), 1);
        assert_eq!(log.since(2).len(), 2);
        assert_eq!(log.since(4).len(), 1);
        assert_eq!(log.last().unwrap().bar_index, 4);
    }
}
