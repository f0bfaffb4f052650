//! Adaptrend CLI: run the adaptive SuperTrend engine over bar data.
//!
//! Commands:
//! - `run`: every instrument listed in a TOML run config, in parallel
//! - `analyze`: a single CSV file
//! - `synthetic`: a seeded random walk (results tagged as synthetic)

use adaptrend_core::EngineConfig;
use adaptrend_runner::{
    load_bars_csv, run_all, run_bars, save_artifacts, synthetic_bars, InstrumentReport, RunConfig,
};
use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "adaptrend",
    about = "Adaptrend CLI: adaptive SuperTrend with k-means factor selection"
)]
struct Cli {
    /// Debug-level logging.
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every instrument of a TOML run config.
    Run {
        /// Path to the run config.
        #[arg(long)]
        config: PathBuf,

        /// Overrides `output_dir` from the config.
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Analyze one CSV file of bars.
    Analyze {
        /// CSV with `timestamp,open,high,low,close[,volume]` columns.
        #[arg(long)]
        csv: PathBuf,

        #[arg(long)]
        symbol: String,

        #[arg(long, default_value = "1d")]
        timeframe: String,

        #[command(flatten)]
        engine: EngineArgs,

        /// Write report.json, outputs.csv and signals.csv here.
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Analyze a seeded synthetic random walk.
    Synthetic {
        #[arg(long, default_value_t = 500)]
        bars: usize,

        #[arg(long, default_value_t = 42)]
        seed: u64,

        #[arg(long, default_value = "SYNTH")]
        symbol: String,

        #[command(flatten)]
        engine: EngineArgs,

        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
}

/// Engine config file plus per-field overrides.
#[derive(Args)]
struct EngineArgs {
    /// Engine TOML (`atr_period`, `factors`, ...). Defaults apply without it.
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    atr_period: Option<usize>,

    #[arg(long)]
    perf_period: Option<usize>,

    /// Number of clusters.
    #[arg(long)]
    k: Option<usize>,

    /// Re-cluster every N bars.
    #[arg(long)]
    cadence: Option<usize>,
}

impl EngineArgs {
    fn resolve(&self) -> Result<EngineConfig> {
        let mut config = match &self.config {
            Some(path) => EngineConfig::from_file(path)
                .with_context(|| format!("loading engine config {}", path.display()))?,
            None => EngineConfig::default(),
        };
        if let Some(p) = self.atr_period {
            config.atr_period = p;
        }
        if let Some(p) = self.perf_period {
            config.perf_period = p;
        }
        if let Some(k) = self.k {
            config.k = k;
        }
        if let Some(c) = self.cadence {
            config.cluster_cadence = c;
        }
        config.validate().context("invalid engine config")?;
        Ok(config)
    }
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("debug,adaptrend_core=debug,adaptrend_runner=debug")
    } else {
        EnvFilter::new("info,adaptrend_core=info,adaptrend_runner=info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).compact())
        .with(filter)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Run { config, output_dir } => run_config_cmd(&config, output_dir),
        Commands::Analyze {
            csv,
            symbol,
            timeframe,
            engine,
            output_dir,
        } => {
            let config = engine.resolve()?;
            let bars = load_bars_csv(&csv, &symbol)?;
            let report = run_bars(&config, &symbol, &timeframe, &bars, false)?;
            finish(&report, output_dir.as_deref())
        }
        Commands::Synthetic {
            bars,
            seed,
            symbol,
            engine,
            output_dir,
        } => {
            let config = engine.resolve()?;
            tracing::info!(bars, seed, "generating synthetic data");
            let data = synthetic_bars(&symbol, bars, seed);
            let report = run_bars(&config, &symbol, "1d", &data, true)?;
            finish(&report, output_dir.as_deref())
        }
    }
}

fn run_config_cmd(config_path: &Path, output_dir: Option<PathBuf>) -> Result<()> {
    let config = RunConfig::from_file(config_path)
        .with_context(|| format!("loading run config {}", config_path.display()))?;
    let output_dir = output_dir.or_else(|| config.output_dir.clone());

    let results = run_all(&config);
    let mut failed = 0usize;
    for (inst, result) in &results {
        match result {
            Ok(report) => finish(report, output_dir.as_deref())?,
            Err(e) => {
                failed += 1;
                eprintln!("Error for {}: {e}", inst.key());
            }
        }
    }

    if failed > 0 {
        bail!("{failed} of {} instrument(s) failed", results.len());
    }
    Ok(())
}

fn finish(report: &InstrumentReport, output_dir: Option<&Path>) -> Result<()> {
    print_summary(report);
    if let Some(dir) = output_dir {
        let run_dir = save_artifacts(report, dir)?;
        println!("Artifacts saved to: {}", run_dir.display());
    }
    Ok(())
}

fn print_summary(report: &InstrumentReport) {
    println!();
    println!("=== {} ({}) ===", report.symbol, report.timeframe);
    println!(
        "Bars:           {} ({} warmup)",
        report.bar_count, report.warmup_bars
    );
    println!("Outputs:        {}", report.outputs.len());
    println!(
        "Signals:        {} ({} buy / {} sell)",
        report.signals.len(),
        report.buy_count(),
        report.sell_count()
    );
    println!("Rejected bars:  {}", report.diagnostics.bars_rejected);
    println!("Cluster cycles: {}", report.diagnostics.clustering_cycles);

    if let Some(last) = report.last_output() {
        println!();
        println!("--- Latest ---");
        println!("Timestamp:      {}", last.timestamp);
        println!("Close:          {:.4}", last.close);
        println!("Trend:          {}", last.trend);
        println!("Trend Line:     {:.4}", last.trend_line);
        println!("Factor:         {}", last.selected_factor);
        println!("Strength:       {}/10", last.signal_strength);
        println!("Best Centroid:  {:.6}", last.best_centroid);
    }
    if let Some(sig) = report.signals.last() {
        println!(
            "Last Signal:    {} @ {:.4} ({})",
            sig.kind, sig.price, sig.timestamp
        );
    }
    if report.has_synthetic {
        println!();
        println!("WARNING: Results based on SYNTHETIC data");
    }
    println!();
}
