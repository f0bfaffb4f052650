//! Engine configuration.
//!
//! Loaded from TOML (or built in code), validated once, then frozen for the
//! lifetime of an engine instance. The factor set can be given as an explicit
//! list or as an inclusive range:
//!
//! ```toml
//! atr_period = 10
//! perf_period = 10
//! factors = { min = 1.0, max = 10.0, step = 0.5 }
//! ```

use crate::domain::ConfigHash;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Factor set: explicit list or inclusive `min..=max` range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FactorSpec {
    List(Vec<f64>),
    Range { min: f64, max: f64, step: f64 },
}

impl FactorSpec {
    /// Expand into a sorted, validated factor list.
    pub fn resolve(&self) -> Result<Vec<f64>, ConfigError> {
        let mut factors = match self {
            FactorSpec::List(list) => list.clone(),
            FactorSpec::Range { min, max, step } => {
                let (min, max, step) = (*min, *max, *step);
                if !(min.is_finite() && max.is_finite() && step.is_finite())
                    || step <= 0.0
                    || max < min
                {
                    return Err(ConfigError::InvalidFactorRange { min, max, step });
                }
                // Round the count so 1.0..=10.0 step 0.5 yields 19 factors
                // regardless of accumulated float error.
                let count = ((max - min) / step + 1e-9).floor() as usize;
                (0..=count).map(|i| min + i as f64 * step).collect()
            }
        };

        if factors.is_empty() {
            return Err(ConfigError::EmptyFactors);
        }
        if let Some(&bad) = factors.iter().find(|f| !f.is_finite() || **f <= 0.0) {
            return Err(ConfigError::InvalidFactor(bad));
        }

        factors.sort_by(|a, b| a.total_cmp(b));
        if let Some(pair) = factors.windows(2).find(|w| w[0] == w[1]) {
            return Err(ConfigError::DuplicateFactor(pair[0]));
        }
        Ok(factors)
    }
}

impl Default for FactorSpec {
    fn default() -> Self {
        FactorSpec::Range {
            min: 1.0,
            max: 10.0,
            step: 0.5,
        }
    }
}

/// Complete configuration of one engine instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Candidate ATR multipliers.
    pub factors: FactorSpec,
    /// ATR lookback `p`. Output starts at bar index `p`.
    pub atr_period: usize,
    /// Performance memory length; smoothing alpha is `2 / (perf_period + 1)`.
    pub perf_period: usize,
    /// Re-cluster every `cluster_cadence` valid bars.
    pub cluster_cadence: usize,
    /// Number of k-means clusters. Label `k - 1` is the best cluster.
    pub k: usize,
    /// Upper bound on k-means iterations per clustering cycle.
    pub max_iterations: usize,
    /// Consecutive out-of-order bars absorbed before `update` fails.
    pub out_of_order_tolerance: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            factors: FactorSpec::default(),
            atr_period: 10,
            perf_period: 10,
            cluster_cadence: 1,
            k: 3,
            max_iterations: 10,
            out_of_order_tolerance: 3,
        }
    }
}

impl EngineConfig {
    /// Load a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {e}", path.display())))?;
        Self::from_toml(&content)
    }

    /// Parse a config from a TOML string. Missing keys take their defaults.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Validate every parameter and return the resolved, sorted factor list.
    pub fn validate(&self) -> Result<Vec<f64>, ConfigError> {
        let factors = self.factors.resolve()?;
        for (name, value) in [
            ("atr_period", self.atr_period),
            ("perf_period", self.perf_period),
            ("cluster_cadence", self.cluster_cadence),
            ("max_iterations", self.max_iterations),
        ] {
            if value == 0 {
                return Err(ConfigError::ZeroParameter { name });
            }
        }
        if self.k == 0 || self.k >= factors.len() {
            return Err(ConfigError::InvalidClusterCount {
                k: self.k,
                factors: factors.len(),
            });
        }
        Ok(factors)
    }

    /// Structural hash over every parameter that affects engine output.
    ///
    /// `out_of_order_tolerance` is excluded: it changes error reporting,
    /// never the computed series.
    pub fn config_hash(&self) -> Result<ConfigHash, ConfigError> {
        let factors = self.validate()?;
        let canonical = format!(
            "factors={factors:?};atr_period={};perf_period={};cluster_cadence={};k={};max_iterations={}",
            self.atr_period, self.perf_period, self.cluster_cadence, self.k, self.max_iterations,
        );
        Ok(ConfigHash::from_bytes(canonical.as_bytes()))
    }
}
