//! Adaptive engine: bar-by-bar pipeline over the candidate bank.
//!
//! Per accepted bar:
//!
//! 1. ATR update (nothing else happens until the ATR is defined)
//! 2. Seed the candidate bank on the first valid bar, otherwise score the
//!    previous directions against the price change and advance every line
//! 3. Re-cluster the performance scores on cadence
//! 4. Select the representative factor from the best cluster
//! 5. Emit a signal if the adaptive trend flipped

pub mod diagnostics;
pub mod output;
pub mod state;
pub mod warmup;

pub use diagnostics::Diagnostics;
pub use output::{AdaptiveOutput, BarUpdate, FactorAssignment, RunOutput};
pub use state::EngineState;
pub use warmup::WarmupState;

use crate::bank::CandidateBank;
use crate::cluster::{cluster, Clustering};
use crate::config::EngineConfig;
use crate::domain::{Bar, ConfigHash, Trend};
use crate::error::{DataQualityEvent, EngineError};
use crate::indicators::{AtrEngine, CandidateState};
use crate::performance::PerformanceTracker;
use crate::selector::{select, strength_epsilon, Selection};
use crate::signals::{SignalEmitter, SignalLog};
use chrono::NaiveDateTime;
use tracing::{debug, warn};

/// One incremental engine instance (one symbol + timeframe).
#[derive(Debug, Clone)]
pub struct AdaptiveEngine {
    config: EngineConfig,
    config_hash: ConfigHash,
    bar_count: usize,
    last_timestamp: Option<NaiveDateTime>,
    last_close: Option<f64>,
    atr: AtrEngine,
    warmup: WarmupState,
    bank: CandidateBank,
    tracker: PerformanceTracker,
    clustering: Option<Clustering>,
    selection: Option<Selection>,
    valid_bars: usize,
    emitter: SignalEmitter,
    signals: SignalLog,
    diagnostics: Diagnostics,
    last_output: Option<AdaptiveOutput>,
}

impl AdaptiveEngine {
    /// Build a fresh engine. Fails on any invalid parameter.
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        let factors = config.validate()?;
        let config_hash = config.config_hash()?;
        let n = factors.len();
        Ok(Self {
            config_hash,
            bar_count: 0,
            last_timestamp: None,
            last_close: None,
            atr: AtrEngine::new(config.atr_period),
            warmup: WarmupState::for_atr_period(config.atr_period),
            bank: CandidateBank::new(factors),
            tracker: PerformanceTracker::new(n, config.perf_period),
            clustering: None,
            selection: None,
            valid_bars: 0,
            emitter: SignalEmitter::new(),
            signals: SignalLog::new(),
            diagnostics: Diagnostics::default(),
            last_output: None,
            config,
        })
    }

    /// Continue from a captured state.
    ///
    /// The config must hash to the value recorded in the state, and every
    /// per-factor vector must match the config's factor count.
    pub fn resume(config: EngineConfig, state: EngineState) -> Result<Self, EngineError> {
        let factors = config.validate()?;
        let config_hash = config.config_hash()?;
        if config_hash != state.config_hash {
            return Err(EngineError::StateMismatch {
                state: state.config_hash.to_string(),
                config: config_hash.to_string(),
            });
        }

        let n = factors.len();
        if state.tracker.scores().len() != n {
            return Err(EngineError::CorruptState(format!(
                "{} performance scores for {n} factors",
                state.tracker.scores().len()
            )));
        }
        if let Some(c) = &state.clustering {
            if c.labels.len() != n || c.k() != config.k {
                return Err(EngineError::CorruptState(format!(
                    "clustering has {} labels and {} centroids, expected {n} and {}",
                    c.labels.len(),
                    c.k(),
                    config.k
                )));
            }
        }
        if let Some(s) = &state.selection {
            if s.factor_index >= n {
                return Err(EngineError::CorruptState(format!(
                    "selected factor index {} out of range",
                    s.factor_index
                )));
            }
        }
        let bank = CandidateBank::from_states(factors, state.candidates)?;

        Ok(Self {
            config_hash,
            bar_count: state.bar_count,
            last_timestamp: state.last_timestamp,
            last_close: state.last_close,
            atr: state.atr,
            warmup: state.warmup,
            bank,
            tracker: state.tracker,
            clustering: state.clustering,
            selection: state.selection,
            valid_bars: state.valid_bars,
            emitter: state.emitter,
            signals: state.signals,
            diagnostics: state.diagnostics,
            last_output: state.last_output,
            config,
        })
    }

    /// Capture the full state.
    pub fn snapshot(&self) -> EngineState {
        EngineState {
            config_hash: self.config_hash.clone(),
            bar_count: self.bar_count,
            last_timestamp: self.last_timestamp,
            last_close: self.last_close,
            atr: self.atr.clone(),
            warmup: self.warmup.clone(),
            candidates: self.bank.states().to_vec(),
            tracker: self.tracker.clone(),
            clustering: self.clustering.clone(),
            selection: self.selection,
            valid_bars: self.valid_bars,
            emitter: self.emitter.clone(),
            signals: self.signals.clone(),
            diagnostics: self.diagnostics.clone(),
            last_output: self.last_output.clone(),
        }
    }

    /// Feed the next bar.
    ///
    /// Out-of-order and void bars are rejected without touching state. More
    /// than `out_of_order_tolerance` consecutive out-of-order bars is an error.
    pub fn update(&mut self, bar: &Bar) -> Result<BarUpdate, EngineError> {
        if let Some(last) = self.last_timestamp {
            if bar.timestamp <= last {
                return self.reject_out_of_order(bar.timestamp, last);
            }
        }
        if bar.is_void() {
            warn!(symbol = %bar.symbol, timestamp = %bar.timestamp, "void bar rejected");
            self.diagnostics.bars_rejected += 1;
            self.diagnostics.record(DataQualityEvent::VoidBar {
                timestamp: bar.timestamp,
            });
            return Ok(BarUpdate::Rejected);
        }

        self.diagnostics.consecutive_rejections = 0;
        self.diagnostics.bars_processed += 1;
        let bar_index = self.bar_count;
        self.bar_count += 1;
        self.last_timestamp = Some(bar.timestamp);
        let prev_close = self.last_close.replace(bar.close);
        self.warmup.process_bar();

        let step = self.atr.update(bar.high, bar.low, bar.close);
        if step.degenerate {
            warn!(symbol = %bar.symbol, bar_index, "degenerate true range");
            self.diagnostics
                .record(DataQualityEvent::DegenerateAtr { bar_index });
        }
        let Some(atr) = step.value else {
            return Ok(BarUpdate::WarmingUp {
                bars_until_warm: self.warmup.bars_until_warm(),
            });
        };

        match prev_close {
            Some(prev_close) if self.bank.is_seeded() => {
                let events = self.tracker.update(
                    bar_index,
                    self.bank.states(),
                    self.bank.factors(),
                    bar.close - prev_close,
                );
                for event in events {
                    self.diagnostics.record(event);
                }
                self.bank.update(bar_index, bar, prev_close, atr);
            }
            _ => self.bank.seed(bar_index, bar, atr),
        }

        if self.clustering.is_none() || self.valid_bars % self.config.cluster_cadence == 0 {
            self.recluster(bar.close)?;
        }
        self.valid_bars += 1;

        let output = self.build_output(bar_index, bar, atr)?;
        if let Some(signal) = &output.signal {
            debug!(
                symbol = %bar.symbol,
                bar_index,
                kind = %signal.kind,
                price = signal.price,
                confidence = signal.confidence,
                "signal"
            );
            self.signals.push(signal.clone());
        }
        self.last_output = Some(output.clone());
        Ok(BarUpdate::Output(Box::new(output)))
    }

    /// Feed a whole slice and collect outputs and the signals it produced.
    pub fn run(&mut self, bars: &[Bar]) -> Result<RunOutput, EngineError> {
        let first_signal = self.signals.len();
        let mut outputs = Vec::with_capacity(bars.len());
        for bar in bars {
            if let Some(output) = self.update(bar)?.into_output() {
                outputs.push(output);
            }
        }
        Ok(RunOutput {
            outputs,
            signals: self.signals.as_slice()[first_signal..].to_vec(),
            diagnostics: self.diagnostics.clone(),
        })
    }

    /// Most recent output, or `InsufficientHistory` while warming up.
    pub fn latest(&self) -> Result<&AdaptiveOutput, EngineError> {
        self.last_output
            .as_ref()
            .ok_or(EngineError::InsufficientHistory {
                needed: self.warmup.warmup_bars(),
                available: self.warmup.bars_processed(),
            })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn config_hash(&self) -> &ConfigHash {
        &self.config_hash
    }

    /// Resolved factor list, ascending.
    pub fn factors(&self) -> &[f64] {
        self.bank.factors()
    }

    pub fn signals(&self) -> &SignalLog {
        &self.signals
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Current adaptive trend, `None` before the first output.
    pub fn trend(&self) -> Option<Trend> {
        self.emitter.state()
    }

    pub fn atr(&self) -> Result<f64, EngineError> {
        self.atr.value()
    }

    /// Candidate line of one exact factor value.
    pub fn candidate(&self, factor: f64) -> Option<&CandidateState> {
        self.bank.index_of(factor).and_then(|i| self.bank.state(i))
    }

    pub fn performance(&self) -> &[f64] {
        self.tracker.scores()
    }

    pub fn clustering(&self) -> Option<&Clustering> {
        self.clustering.as_ref()
    }

    pub fn bars_processed(&self) -> usize {
        self.bar_count
    }

    fn reject_out_of_order(
        &mut self,
        timestamp: NaiveDateTime,
        last: NaiveDateTime,
    ) -> Result<BarUpdate, EngineError> {
        self.diagnostics.bars_rejected += 1;
        self.diagnostics.consecutive_rejections += 1;
        let consecutive = self.diagnostics.consecutive_rejections;
        warn!(%timestamp, %last, consecutive, "out-of-order bar rejected");
        self.diagnostics
            .record(DataQualityEvent::OutOfOrderBar { timestamp, last });
        if consecutive > self.config.out_of_order_tolerance {
            return Err(EngineError::OutOfOrderBar {
                timestamp,
                last,
                consecutive,
            });
        }
        Ok(BarUpdate::Rejected)
    }

    fn recluster(&mut self, close: f64) -> Result<(), EngineError> {
        let scores = self.tracker.scores();
        let clustering = cluster(scores, self.config.k, self.config.max_iterations);
        let selection = select(&clustering, scores, strength_epsilon(close))
            .ok_or_else(|| EngineError::CorruptState("best cluster is empty".into()))?;
        self.diagnostics.clustering_cycles += 1;
        self.clustering = Some(clustering);
        self.selection = Some(selection);
        Ok(())
    }

    fn build_output(
        &mut self,
        bar_index: usize,
        bar: &Bar,
        atr: f64,
    ) -> Result<AdaptiveOutput, EngineError> {
        let (Some(clustering), Some(selection)) = (&self.clustering, self.selection) else {
            return Err(EngineError::CorruptState(
                "no clustering after a valid bar".into(),
            ));
        };
        let candidate = self
            .bank
            .state(selection.factor_index)
            .copied()
            .ok_or_else(|| EngineError::CorruptState("selected candidate missing".into()))?;

        let cluster_assignments = self
            .bank
            .factors()
            .iter()
            .zip(&clustering.labels)
            .map(|(&factor, &cluster)| FactorAssignment { factor, cluster })
            .collect();

        let signal = self.emitter.observe(
            bar_index,
            bar.timestamp,
            bar.close,
            candidate.direction,
            selection.signal_strength,
        );

        Ok(AdaptiveOutput {
            bar_index,
            timestamp: bar.timestamp,
            close: bar.close,
            atr,
            selected_factor: self.bank.factors()[selection.factor_index],
            trend_line: candidate.active_band(),
            trend: candidate.direction,
            signal_strength: selection.signal_strength,
            best_centroid: selection.best_centroid,
            centroids: clustering.centroids.clone(),
            cluster_assignments,
            performance: self.tracker.scores().to_vec(),
            performance_warm: self.tracker.is_warm(),
            signal,
        })
    }
}
