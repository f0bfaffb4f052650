//! Instrument runner: wires together data loading and the adaptive engine.
//!
//! Entry points:
//! - `run_bars()`: pre-loaded bars, no I/O. Used by the synthetic CLI mode.
//! - `run_instrument()`: loads one CSV, then runs.
//! - `run_all()`: every instrument of a `RunConfig` in parallel (rayon),
//!   one independent engine per symbol + timeframe.

use adaptrend_core::engine::Diagnostics;
use adaptrend_core::{
    AdaptiveEngine, AdaptiveOutput, Bar, ConfigHash, DatasetHash, EngineConfig, EngineError,
    Signal, SignalKind, Trend,
};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{InstrumentSpec, RunConfig};
use crate::data_loader::{dataset_hash, load_bars_csv, LoadError};

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("data error: {0}")]
    Data(#[from] LoadError),
    #[error("engine error for {symbol}/{timeframe}: {source}")]
    Engine {
        symbol: String,
        timeframe: String,
        #[source]
        source: EngineError,
    },
}

/// Current schema version for persisted reports.
pub const SCHEMA_VERSION: u32 = 1;

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Complete result of running one instrument.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InstrumentReport {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub symbol: String,
    pub timeframe: String,
    pub dataset_hash: DatasetHash,
    pub config_hash: ConfigHash,
    pub engine: EngineConfig,
    pub has_synthetic: bool,
    pub bar_count: usize,
    pub warmup_bars: usize,
    pub outputs: Vec<AdaptiveOutput>,
    pub signals: Vec<Signal>,
    pub diagnostics: Diagnostics,
}

impl InstrumentReport {
    pub fn buy_count(&self) -> usize {
        self.signals
            .iter()
            .filter(|s| s.kind == SignalKind::Buy)
            .count()
    }

    pub fn sell_count(&self) -> usize {
        self.signals
            .iter()
            .filter(|s| s.kind == SignalKind::Sell)
            .count()
    }

    pub fn last_output(&self) -> Option<&AdaptiveOutput> {
        self.outputs.last()
    }

    pub fn final_trend(&self) -> Option<Trend> {
        self.last_output().map(|o| o.trend)
    }
}

/// Run the engine over pre-loaded bars, no I/O.
pub fn run_bars(
    config: &EngineConfig,
    symbol: &str,
    timeframe: &str,
    bars: &[Bar],
    has_synthetic: bool,
) -> Result<InstrumentReport, RunError> {
    let engine_err = |source| RunError::Engine {
        symbol: symbol.to_string(),
        timeframe: timeframe.to_string(),
        source,
    };

    let mut engine = AdaptiveEngine::new(config.clone()).map_err(engine_err)?;
    let run = engine.run(bars).map_err(engine_err)?;

    tracing::info!(
        symbol,
        timeframe,
        bars = bars.len(),
        outputs = run.outputs.len(),
        signals = run.signals.len(),
        rejected = run.diagnostics.bars_rejected,
        "instrument complete"
    );

    Ok(InstrumentReport {
        schema_version: SCHEMA_VERSION,
        symbol: symbol.to_string(),
        timeframe: timeframe.to_string(),
        dataset_hash: dataset_hash(bars),
        config_hash: engine.config_hash().clone(),
        engine: config.clone(),
        has_synthetic,
        bar_count: bars.len(),
        warmup_bars: config.atr_period + 1,
        outputs: run.outputs,
        signals: run.signals,
        diagnostics: run.diagnostics,
    })
}

/// Load one instrument's CSV and run it.
pub fn run_instrument(
    config: &EngineConfig,
    instrument: &InstrumentSpec,
) -> Result<InstrumentReport, RunError> {
    let bars = load_bars_csv(&instrument.path, &instrument.symbol)?;
    run_bars(
        config,
        &instrument.symbol,
        &instrument.timeframe,
        &bars,
        false,
    )
}

/// Run every configured instrument in parallel.
///
/// Results come back in configuration order. One failing instrument does
/// not stop the others.
pub fn run_all(config: &RunConfig) -> Vec<(InstrumentSpec, Result<InstrumentReport, RunError>)> {
    config
        .instruments
        .par_iter()
        .map(|inst| {
            let result = run_instrument(&config.engine, inst);
            if let Err(e) = &result {
                tracing::error!(
                    symbol = %inst.symbol,
                    timeframe = %inst.timeframe,
                    error = %e,
                    "instrument failed"
                );
            }
            (inst.clone(), result)
        })
        .collect()
}
