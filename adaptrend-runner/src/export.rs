//! Reporting and export: JSON and CSV artifact generation.
//!
//! Provides the export formats for instrument reports:
//! - **JSON**: full round-trip serialization with schema versioning
//! - **CSV**: per-bar adaptive outputs and the signal log
//!
//! All persisted reports include a `schema_version` field. Unknown versions
//! are rejected on load.

use std::path::{Path, PathBuf};

use adaptrend_core::{AdaptiveOutput, Signal};
use anyhow::{bail, Context, Result};

use crate::runner::{InstrumentReport, SCHEMA_VERSION};

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize an `InstrumentReport` to pretty JSON.
pub fn export_json(report: &InstrumentReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("failed to serialize InstrumentReport to JSON")
}

/// Deserialize an `InstrumentReport` from JSON, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<InstrumentReport> {
    let report: InstrumentReport =
        serde_json::from_str(json).context("failed to deserialize InstrumentReport from JSON")?;
    if report.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            report.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(report)
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Export per-bar outputs as CSV.
///
/// Columns: bar_index, timestamp, close, atr, selected_factor, trend_line,
/// trend, signal_strength, best_centroid, signal
pub fn export_outputs_csv(outputs: &[AdaptiveOutput]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "bar_index",
        "timestamp",
        "close",
        "atr",
        "selected_factor",
        "trend_line",
        "trend",
        "signal_strength",
        "best_centroid",
        "signal",
    ])?;

    for o in outputs {
        wtr.write_record([
            &o.bar_index.to_string(),
            &o.timestamp.to_string(),
            &format!("{:.6}", o.close),
            &format!("{:.6}", o.atr),
            &o.selected_factor.to_string(),
            &format!("{:.6}", o.trend_line),
            &o.trend.to_string(),
            &o.signal_strength.to_string(),
            &format!("{:.6}", o.best_centroid),
            &o.signal.as_ref().map(|s| s.kind.to_string()).unwrap_or_default(),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Export the signal log as CSV.
pub fn export_signals_csv(signals: &[Signal]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["bar_index", "timestamp", "kind", "price", "confidence"])?;
    for s in signals {
        wtr.write_record([
            &s.bar_index.to_string(),
            &s.timestamp.to_string(),
            &s.kind.to_string(),
            &format!("{:.6}", s.price),
            &s.confidence.to_string(),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the full artifact set for one instrument.
///
/// Creates a directory named `{symbol}_{timeframe}/` under `output_dir`
/// containing:
/// - `report.json`: the full `InstrumentReport`
/// - `outputs.csv`: per-bar adaptive outputs
/// - `signals.csv`: the signal log
///
/// Returns the path to the created directory.
pub fn save_artifacts(report: &InstrumentReport, output_dir: &Path) -> Result<PathBuf> {
    let run_dir = output_dir.join(format!("{}_{}", report.symbol, report.timeframe));
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    let json = export_json(report)?;
    std::fs::write(run_dir.join("report.json"), &json)
        .with_context(|| format!("failed to write report.json in {}", run_dir.display()))?;

    let outputs_csv = export_outputs_csv(&report.outputs)?;
    std::fs::write(run_dir.join("outputs.csv"), &outputs_csv)
        .with_context(|| format!("failed to write outputs.csv in {}", run_dir.display()))?;

    let signals_csv = export_signals_csv(&report.signals)?;
    std::fs::write(run_dir.join("signals.csv"), &signals_csv)
        .with_context(|| format!("failed to write signals.csv in {}", run_dir.display()))?;

    Ok(run_dir)
}

/// Load an `InstrumentReport` from an artifact directory's report.json.
///
/// Rejects unknown schema versions.
pub fn load_artifacts(dir: &Path) -> Result<InstrumentReport> {
    let report_path = dir.join("report.json");
    let json = std::fs::read_to_string(&report_path)
        .with_context(|| format!("failed to read {}", report_path.display()))?;
    import_json(&json)
}
