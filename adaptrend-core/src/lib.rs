//! Adaptrend Core: self-tuning SuperTrend engine.
//!
//! This crate contains the incremental pipeline:
//! - Domain types (bars, trends, signals, hashes)
//! - Streaming ATR and one supertrend candidate line per factor
//! - Per-factor performance scoring
//! - Deterministic 1-D k-means over the scores
//! - Representative-factor selection and signal emission
//! - Serializable engine state for exact resumption

pub mod bank;
pub mod cluster;
pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod indicators;
pub mod performance;
pub mod selector;
pub mod signals;

pub use config::{EngineConfig, FactorSpec};
pub use domain::{Bar, ConfigHash, DatasetHash, Signal, SignalKind, Trend};
pub use engine::{AdaptiveEngine, AdaptiveOutput, BarUpdate, EngineState, RunOutput};
pub use error::{ConfigError, DataQualityEvent, EngineError};
