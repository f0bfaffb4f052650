//! Data-quality counters and a bounded buffer of recent events.

use crate::error::DataQualityEvent;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Events kept in the recent-event buffer.
pub const RECENT_EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    /// Bars accepted into the pipeline.
    pub bars_processed: usize,
    /// Bars rejected (out of order or void).
    pub bars_rejected: usize,
    /// Current run of consecutive out-of-order rejections.
    pub consecutive_rejections: usize,
    pub degenerate_atr: usize,
    pub degenerate_performance: usize,
    pub clustering_cycles: usize,
    recent: VecDeque<DataQualityEvent>,
}

impl Diagnostics {
    pub fn record(&mut self, event: DataQualityEvent) {
        match &event {
            DataQualityEvent::DegenerateAtr { .. } => self.degenerate_atr += 1,
            DataQualityEvent::DegeneratePerformance { .. } => self.degenerate_performance += 1,
            DataQualityEvent::VoidBar { .. } | DataQualityEvent::OutOfOrderBar { .. } => {}
        }
        if self.recent.len() == RECENT_EVENT_CAPACITY {
            self.recent.pop_front();
        }
        self.recent.push_back(event);
    }

    /// Most recent data-quality events, oldest first.
    pub fn recent_events(&self) -> impl Iterator<Item = &DataQualityEvent> {
        self.recent.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_is_bounded() {
        let mut d = Diagnostics::default();
        for i in 0..(RECENT_EVENT_CAPACITY + 10) {
            d.record(DataQualityEvent::DegenerateAtr { bar_index: i });
        }
        assert_eq!(d.recent_events().count(), RECENT_EVENT_CAPACITY);
        assert_eq!(d.degenerate_atr, RECENT_EVENT_CAPACITY + 10);
        assert_eq!(
            d.recent_events().next(),
            Some(&DataQualityEvent::DegenerateAtr { bar_index: 10 })
        );
    }
}
