//! Adaptrend Runner: data loading, multi-instrument runs, export.
//!
//! This crate builds on `adaptrend-core` to provide:
//! - CSV bar loading and synthetic random-walk data (tagged)
//! - TOML run configuration (engine section + instrument list)
//! - Parallel runs, one engine per symbol + timeframe
//! - JSON/CSV export with schema versioning

pub mod config;
pub mod data_loader;
pub mod export;
pub mod runner;

pub use config::{ConfigError, InstrumentSpec, RunConfig};
pub use data_loader::{dataset_hash, load_bars_csv, synthetic_bars, LoadError};
pub use export::{
    export_json, export_outputs_csv, export_signals_csv, import_json, load_artifacts,
    save_artifacts,
};
pub use runner::{run_all, run_bars, run_instrument, InstrumentReport, RunError, SCHEMA_VERSION};
