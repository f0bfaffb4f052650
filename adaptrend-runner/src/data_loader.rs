//! Bar loading for the runner.
//!
//! Two sources:
//! 1. CSV files (`timestamp,open,high,low,close[,volume]`)
//! 2. Synthetic random walks (developer/demo mode, tagged as synthetic)
//!
//! Loaded bars are sorted by timestamp with duplicates dropped, so the engine
//! only ever sees a strictly increasing stream from a file.

use adaptrend_core::{Bar, DatasetHash};
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read '{path}': {reason}")]
    Io { path: String, reason: String },

    #[error("malformed CSV in '{path}' at record {record}: {reason}")]
    Csv {
        path: String,
        record: usize,
        reason: String,
    },

    #[error("unrecognized timestamp '{value}' in '{path}' at record {record}")]
    BadTimestamp {
        path: String,
        record: usize,
        value: String,
    },

    #[error("no bars in '{path}'")]
    Empty { path: String },
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    timestamp: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    #[serde(default)]
    volume: Option<f64>,
}

/// Parse `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS` or `YYYY-MM-DDTHH:MM:SS`.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(ts);
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Load bars for one symbol from a CSV file.
///
/// Rows are sorted by timestamp; rows repeating an earlier timestamp are
/// dropped (first one wins). Non-finite prices are kept: the engine rejects
/// them as void bars and records the event.
pub fn load_bars_csv(path: &Path, symbol: &str) -> Result<Vec<Bar>, LoadError> {
    let path_str = path.display().to_string();
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| LoadError::Io {
            path: path_str.clone(),
            reason: e.to_string(),
        })?;

    let mut bars = Vec::new();
    for (record, row) in reader.deserialize::<CsvRow>().enumerate() {
        let row = row.map_err(|e| LoadError::Csv {
            path: path_str.clone(),
            record: record + 1,
            reason: e.to_string(),
        })?;
        let timestamp = parse_timestamp(&row.timestamp).ok_or_else(|| LoadError::BadTimestamp {
            path: path_str.clone(),
            record: record + 1,
            value: row.timestamp.clone(),
        })?;
        bars.push(Bar {
            symbol: symbol.to_string(),
            timestamp,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: row.volume.unwrap_or(0.0),
        });
    }

    if bars.is_empty() {
        return Err(LoadError::Empty { path: path_str });
    }

    bars.sort_by_key(|b| b.timestamp);
    let before = bars.len();
    bars.dedup_by_key(|b| b.timestamp);
    if bars.len() < before {
        tracing::warn!(
            symbol,
            path = %path_str,
            dropped = before - bars.len(),
            "duplicate timestamps dropped"
        );
    }

    let insane = bars.iter().filter(|b| !b.is_void() && !b.is_sane()).count();
    if insane > 0 {
        tracing::warn!(symbol, path = %path_str, insane, "bars with inconsistent OHLC");
    }

    Ok(bars)
}

/// Generate a deterministic random walk for demos and benches.
///
/// Daily bars starting 2020-01-01, weekends skipped, price starting at 100.
/// The same `(symbol, n, seed)` always produces the same bars.
pub fn synthetic_bars(symbol: &str, n: usize, seed: u64) -> Vec<Bar> {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    let mut rng = StdRng::seed_from_u64(seed);
    let mut bars = Vec::with_capacity(n);
    let mut price = 100.0_f64;
    let mut current = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or(NaiveDate::MIN);

    while bars.len() < n {
        let weekday = current.weekday();
        if weekday == chrono::Weekday::Sat || weekday == chrono::Weekday::Sun {
            current += chrono::Duration::days(1);
            continue;
        }

        let daily_return: f64 = rng.gen_range(-0.03..0.03);
        let open = price;
        let close = price * (1.0 + daily_return);
        let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
        let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));
        let volume = rng.gen_range(500_000.0..5_000_000.0_f64).round();

        bars.push(Bar {
            symbol: symbol.to_string(),
            timestamp: current.and_time(chrono::NaiveTime::MIN),
            open,
            high,
            low,
            close,
            volume,
        });

        price = close;
        current += chrono::Duration::days(1);
    }

    bars
}

/// Deterministic BLAKE3 hash over all bar data.
///
/// Covers symbol, timestamp and all OHLCV values in series order.
pub fn dataset_hash(bars: &[Bar]) -> DatasetHash {
    let mut hasher = blake3::Hasher::new();
    for bar in bars {
        hasher.update(bar.symbol.as_bytes());
        hasher.update(bar.timestamp.to_string().as_bytes());
        hasher.update(&bar.open.to_le_bytes());
        hasher.update(&bar.high.to_le_bytes());
        hasher.update(&bar.low.to_le_bytes());
        hasher.update(&bar.close.to_le_bytes());
        hasher.update(&bar.volume.to_le_bytes());
    }
    DatasetHash(hasher.finalize().to_hex().to_string())
}
