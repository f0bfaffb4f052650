//! Serializable multi-instrument run configuration.
//!
//! ```toml
//! output_dir = "results"
//!
//! [engine]
//! atr_period = 10
//! factors = { min = 1.0, max = 5.0, step = 0.5 }
//!
//! [[instruments]]
//! symbol = "SPY"
//! timeframe = "1d"
//! path = "data/spy.csv"
//! ```

use adaptrend_core::EngineConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config file '{path}': {reason}")]
    Io { path: String, reason: String },

    #[error("parse config TOML: {0}")]
    Parse(String),

    #[error("engine config: {0}")]
    Engine(#[from] adaptrend_core::ConfigError),

    #[error("no instruments configured")]
    NoInstruments,

    #[error("instrument {symbol}/{timeframe} is listed twice")]
    DuplicateInstrument { symbol: String, timeframe: String },
}

fn default_timeframe() -> String {
    "1d".to_string()
}

/// One engine instance: a symbol at a timeframe, read from a CSV file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InstrumentSpec {
    pub symbol: String,
    #[serde(default = "default_timeframe")]
    pub timeframe: String,
    /// Relative paths are resolved against the config file's directory.
    pub path: PathBuf,
}

impl InstrumentSpec {
    /// `SYMBOL_timeframe`, used for artifact directory names.
    pub fn key(&self) -> String {
        format!("{}_{}", self.symbol, self.timeframe)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunConfig {
    /// Shared by every instrument.
    #[serde(default)]
    pub engine: EngineConfig,
    pub instruments: Vec<InstrumentSpec>,
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
}

impl RunConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let mut config = Self::from_toml(&content)?;
        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.engine.validate()?;
        if self.instruments.is_empty() {
            return Err(ConfigError::NoInstruments);
        }
        let mut seen = BTreeSet::new();
        for inst in &self.instruments {
            if !seen.insert((inst.symbol.as_str(), inst.timeframe.as_str())) {
                return Err(ConfigError::DuplicateInstrument {
                    symbol: inst.symbol.clone(),
                    timeframe: inst.timeframe.clone(),
                });
            }
        }
        Ok(())
    }

    fn resolve_paths(&mut self, base: &Path) {
        for inst in &mut self.instruments {
            if inst.path.is_relative() {
                inst.path = base.join(&inst.path);
            }
        }
        if let Some(dir) = &self.output_dir {
            if dir.is_relative() {
                self.output_dir = Some(base.join(dir));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adaptrend_core::FactorSpec;

    const SAMPLE: &str = r#"
output_dir = "out"

[engine]
atr_period = 14
factors = [1.0, 2.0, 3.0, 4.0]

[[instruments]]
symbol = "SPY"
path = "spy.csv"

[[instruments]]
symbol = "SPY"
timeframe = "1h"
path = "/abs/spy_1h.csv"
"#;

    #[test]
    fn parses_engine_section_and_instruments() {
        let config = RunConfig::from_toml(SAMPLE).unwrap();
        assert_eq!(config.engine.atr_period, 14);
        assert_eq!(config.engine.perf_period, 10);
        assert_eq!(
            config.engine.factors,
            FactorSpec::List(vec![1.0, 2.0, 3.0, 4.0])
        );
        assert_eq!(config.instruments.len(), 2);
        assert_eq!(config.instruments[0].timeframe, "1d");
        assert_eq!(config.instruments[1].key(), "SPY_1h");
    }

    #[test]
    fn missing_engine_section_uses_defaults() {
        let config = RunConfig::from_toml(
            "[[instruments]]\nsymbol = \"QQQ\"\npath = \"qqq.csv\"\n",
        )
        .unwrap();
        assert_eq!(config.engine, EngineConfig::default());
        assert_eq!(config.output_dir, None);
    }

    #[test]
    fn relative_paths_resolve_against_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.toml");
        std::fs::write(&path, SAMPLE).unwrap();

        let config = RunConfig::from_file(&path).unwrap();
        assert_eq!(config.instruments[0].path, dir.path().join("spy.csv"));
        assert_eq!(config.instruments[1].path, PathBuf::from("/abs/spy_1h.csv"));
        assert_eq!(config.output_dir, Some(dir.path().join("out")));
    }

    #[test]
    fn rejects_invalid_configs() {
        assert!(matches!(
            RunConfig::from_toml("instruments = []\n"),
            Err(ConfigError::NoInstruments)
        ));
        assert!(matches!(
            RunConfig::from_toml(
                "[engine]\nk = 0\n[[instruments]]\nsymbol = \"A\"\npath = \"a.csv\"\n"
            ),
            Err(ConfigError::Engine(_))
        ));
        let dup = "[[instruments]]\nsymbol = \"A\"\npath = \"a.csv\"\n\
                   [[instruments]]\nsymbol = \"A\"\npath = \"b.csv\"\n";
        assert!(matches!(
            RunConfig::from_toml(dup),
            Err(ConfigError::DuplicateInstrument { .. })
        ));
        assert!(matches!(
            RunConfig::from_toml("not toml ["),
            Err(ConfigError::Parse(_))
        ));
    }
}
