//! Error taxonomy for the engine.
//!
//! - `ConfigError`: fatal, raised at construction. An engine never starts
//!   with an invalid configuration.
//! - `EngineError`: per-call failures surfaced to the caller.
//! - `DataQualityEvent`: recoverable per-bar conditions. These are absorbed
//!   by the engine and only surfaced through diagnostics and `tracing`.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("factor set is empty")]
    EmptyFactors,

    #[error("factor {0} must be finite and > 0")]
    InvalidFactor(f64),

    #[error("duplicate factor {0}")]
    DuplicateFactor(f64),

    #[error("invalid factor range: min={min}, max={max}, step={step}")]
    InvalidFactorRange { min: f64, max: f64, step: f64 },

    #[error("{name} must be >= 1")]
    ZeroParameter { name: &'static str },

    #[error("k={k} must be >= 1 and smaller than the number of factors ({factors})")]
    InvalidClusterCount { k: usize, factors: usize },

    #[error("read config file: {0}")]
    Io(String),

    #[error("parse config TOML: {0}")]
    Parse(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("insufficient history: need {needed} bars, have {available}")]
    InsufficientHistory { needed: usize, available: usize },

    #[error(
        "out-of-order bar at {timestamp} (last processed {last}), \
         {consecutive} consecutive rejections"
    )]
    OutOfOrderBar {
        timestamp: NaiveDateTime,
        last: NaiveDateTime,
        consecutive: usize,
    },

    #[error("engine state was produced by config {state} but this engine uses config {config}")]
    StateMismatch { state: String, config: String },

    #[error("engine state is inconsistent: {0}")]
    CorruptState(String),
}

/// A recoverable, per-bar data-quality condition.
///
/// Each event is logged at `warn` level when it happens and kept in the
/// engine's diagnostics buffer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DataQualityEvent {
    /// True range was NaN/Inf. The previous ATR was held (or 0 was used
    /// for the true range while seeding).
    DegenerateAtr { bar_index: usize },

    /// A factor's performance update was NaN/Inf and was replaced by 0.
    DegeneratePerformance { bar_index: usize, factor: f64 },

    /// A bar with a NaN/Inf price field was rejected without touching state.
    VoidBar { timestamp: NaiveDateTime },

    /// A bar was rejected because its timestamp did not advance.
    OutOfOrderBar {
        timestamp: NaiveDateTime,
        last: NaiveDateTime,
    },
}
