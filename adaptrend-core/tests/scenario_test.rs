//! Scenario tests for the adaptive engine.
//!
//! Tests:
//! 1. Warm-up: no output before bar index `atr_period`
//! 2. Flat series: strength decays to 0 after motion; degenerate bars give 0
//! 3. Monotonic rise: no signal when the seed bar is already bullish
//! 4. Bearish start then rise: exactly one BUY
//! 5. Single reversal: exactly one SELL
//! 6. Degenerate true range: ATR held, event recorded
//! 7. Determinism: two engines, same bars, identical results

use adaptrend_core::{
    AdaptiveEngine, Bar, BarUpdate, EngineConfig, EngineError, FactorSpec, SignalKind, Trend,
};
use chrono::{NaiveDate, NaiveDateTime};

fn base_ts() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

/// Helper: bars from (open, high, low, close) tuples, one day apart.
fn bars_from(rows: &[(f64, f64, f64, f64)]) -> Vec<Bar> {
    rows.iter()
        .enumerate()
        .map(|(i, &(open, high, low, close))| Bar {
            symbol: "TEST".into(),
            timestamp: base_ts() + chrono::Duration::days(i as i64),
            open,
            high,
            low,
            close,
            volume: 1000.0,
        })
        .collect()
}

/// Helper: bar closing on its midpoint, range 2.
fn mid_bar(close: f64) -> (f64, f64, f64, f64) {
    (close - 0.5, close + 1.0, close - 1.0, close)
}

/// Helper: bar closing below its midpoint.
fn weak_bar(close: f64) -> (f64, f64, f64, f64) {
    (close + 0.5, close + 1.5, close - 0.5, close)
}

fn reversal(up: usize, down: usize) -> Vec<Bar> {
    let mut rows = Vec::new();
    let mut close = 100.0;
    for _ in 0..up {
        rows.push(mid_bar(close));
        close += 1.0;
    }
    for _ in 0..down {
        close -= 1.0;
        rows.push(mid_bar(close));
    }
    bars_from(&rows)
}

// ── 1. Warm-up ───────────────────────────────────────────────────────

#[test]
fn warm_up_with_default_config() {
    let bars = reversal(20, 0);
    let mut engine = AdaptiveEngine::new(EngineConfig::default()).unwrap();

    for (i, bar) in bars.iter().take(10).enumerate() {
        assert_eq!(
            engine.update(bar).unwrap(),
            BarUpdate::WarmingUp {
                bars_until_warm: 10 - i
            }
        );
        assert!(matches!(
            engine.atr(),
            Err(EngineError::InsufficientHistory { needed: 11, .. })
        ));
    }

    let first = engine.update(&bars[10]).unwrap().into_output().unwrap();
    assert_eq!(first.bar_index, 10);
    assert_eq!(first.performance.len(), 19);
    assert_eq!(first.cluster_assignments.len(), 19);
    assert_eq!(first.centroids.len(), 3);
    assert!(engine.signals().is_empty());
}

#[test]
fn too_few_bars_produce_no_output() {
    let bars = reversal(10, 0);
    let mut engine = AdaptiveEngine::new(EngineConfig::default()).unwrap();
    let run = engine.run(&bars).unwrap();
    assert!(run.outputs.is_empty());
    assert!(run.signals.is_empty());
    assert!(engine.latest().is_err());
}

// ── 2. Flat series ───────────────────────────────────────────────────

#[test]
fn flat_stretch_after_motion_decays_strength_to_zero() {
    let mut rows: Vec<_> = (0..40)
        .map(|i| {
            let c = 100.0 + 10.0 * (i as f64 * 0.3).sin();
            (c - 0.2, c + 1.0, c - 1.0, c)
        })
        .collect();
    let level = rows[39].3;
    rows.extend(std::iter::repeat((level, level, level, level)).take(50));
    let bars = bars_from(&rows);

    let mut engine = AdaptiveEngine::new(EngineConfig::default()).unwrap();
    let moving = engine.run(&bars[..40]).unwrap();
    assert!(moving.outputs.iter().any(|o| o.signal_strength > 0));
    let signals_before = engine.signals().len();

    let flat = engine.run(&bars[40..]).unwrap();
    assert_eq!(flat.outputs.len(), 50);
    assert!(flat.signals.is_empty());
    assert_eq!(engine.signals().len(), signals_before);

    let strengths = flat.signal_strength_series();
    assert!(strengths[0] >= strengths[49]);
    assert_eq!(&strengths[47..], &[0, 0, 0]);

    let first = &flat.outputs[0];
    let last = flat.last().unwrap();
    let peak = |o: &adaptrend_core::AdaptiveOutput| {
        o.performance.iter().fold(0.0_f64, |m, p| m.max(p.abs()))
    };
    assert!(peak(last) < peak(first));
    assert!(peak(last) < 1e-3);
    assert_eq!(last.trend, first.trend);
}

#[test]
fn degenerate_series_has_zero_strength_and_no_signals() {
    let bars = bars_from(&vec![(100.0, 100.0, 100.0, 100.0); 60]);
    let mut engine = AdaptiveEngine::new(EngineConfig::default()).unwrap();
    let run = engine.run(&bars).unwrap();

    assert_eq!(run.outputs.len(), 50);
    assert!(run.signals.is_empty());
    for out in &run.outputs {
        assert_eq!(out.atr, 0.0);
        assert_eq!(out.signal_strength, 0);
        assert_eq!(out.trend_line, 100.0);
        assert_eq!(out.trend, Trend::Bullish);
        assert!(out.performance.iter().all(|&p| p == 0.0));
    }
}

// ── 3. Monotonic rise ────────────────────────────────────────────────

/// The seed bar closes on its midpoint, so every candidate starts bullish
/// and the adaptive trend never flips: no BUY either.
#[test]
fn monotonic_rise_never_sells() {
    let bars = reversal(120, 0);
    let mut engine = AdaptiveEngine::new(EngineConfig::default()).unwrap();
    let run = engine.run(&bars).unwrap();

    assert_eq!(run.count(SignalKind::Sell), 0);
    assert_eq!(run.count(SignalKind::Buy), 0);
    assert!(run.trend_series().iter().all(|&t| t == Trend::Bullish));
    for out in &run.outputs {
        assert!(out.trend_line < out.close);
    }
}

// ── 4. Bearish start then rise ───────────────────────────────────────

#[test]
fn bearish_start_then_rise_buys_once() {
    let mut rows = Vec::new();
    let mut close = 150.0;
    for _ in 0..11 {
        rows.push(weak_bar(close));
        close -= 1.0;
    }
    for _ in 0..80 {
        close += 1.0;
        rows.push(mid_bar(close));
    }
    let bars = bars_from(&rows);

    let mut engine = AdaptiveEngine::new(EngineConfig::default()).unwrap();
    let run = engine.run(&bars).unwrap();

    assert_eq!(run.outputs[0].trend, Trend::Bearish);
    assert_eq!(run.count(SignalKind::Buy), 1);
    assert_eq!(run.count(SignalKind::Sell), 0);

    let buy = &run.signals[0];
    let at = &run.outputs[buy.bar_index - 10];
    assert_eq!(at.bar_index, buy.bar_index);
    assert_eq!(buy.price, at.close);
    assert_eq!(buy.confidence, at.signal_strength);
    assert_eq!(engine.trend(), Some(Trend::Bullish));
}

// ── 5. Single reversal ───────────────────────────────────────────────

#[test]
fn single_reversal_sells_once() {
    let bars = reversal(50, 50);
    let mut engine = AdaptiveEngine::new(EngineConfig::default()).unwrap();
    let run = engine.run(&bars).unwrap();

    assert_eq!(run.count(SignalKind::Sell), 1);
    assert_eq!(run.count(SignalKind::Buy), 0);

    // Closes fall 1.0 per bar from the peak at bar 49; no candidate's band
    // sits further below the peak than the widest factor times ATR.
    let sell = &run.signals[0];
    let peak_atr = run.outputs[49 - 10].atr;
    let widest = *engine.factors().last().unwrap();
    let max_lag = (widest * peak_atr).ceil() as usize + 1;
    assert!(sell.bar_index >= 50);
    assert!(
        sell.bar_index <= 49 + max_lag,
        "sell at {} lags more than {max_lag} bars",
        sell.bar_index
    );
    assert!(sell.confidence <= 10);
    assert_eq!(run.last().unwrap().trend, Trend::Bearish);
    assert_eq!(engine.signals().last(), Some(sell));
}

#[test]
fn diagnostic_series_line_up_with_outputs() {
    let bars = reversal(50, 50);
    let mut engine = AdaptiveEngine::new(EngineConfig::default()).unwrap();
    let run = engine.run(&bars).unwrap();

    let n = run.outputs.len();
    assert_eq!(run.adaptive_factor_series().len(), n);
    assert_eq!(run.performance_series().len(), n);
    assert_eq!(run.trend_line_series().len(), n);
    assert_eq!(run.signal_strength_series().len(), n);

    let factors = engine.factors().to_vec();
    for (out, f) in run.outputs.iter().zip(run.adaptive_factor_series()) {
        assert!(factors.contains(&f));
        // The selected factor always belongs to the best cluster.
        assert_eq!(out.cluster_of(f), Some(out.centroids.len() - 1));
        assert!(out.best_cluster_factors().contains(&f));
    }
}

// ── 6. Degenerate true range ─────────────────────────────────────────

#[test]
fn overflowing_range_holds_atr() {
    let mut rows: Vec<_> = (0..20).map(|i| mid_bar(100.0 + i as f64)).collect();
    rows.push((120.0, 1e308, -1e308, 120.0));
    rows.push(mid_bar(121.0));
    let bars = bars_from(&rows);

    let mut engine = AdaptiveEngine::new(EngineConfig::default()).unwrap();
    engine.run(&bars[..20]).unwrap();
    let atr_before = engine.atr().unwrap();

    let out = engine.update(&bars[20]).unwrap().into_output().unwrap();
    assert_eq!(out.atr, atr_before);
    assert_eq!(engine.diagnostics().degenerate_atr, 1);

    let next = engine.update(&bars[21]).unwrap().into_output().unwrap();
    assert!(next.atr.is_finite());
    assert!(next.trend_line.is_finite());
}

#[test]
fn huge_finite_bar_never_poisons_state() {
    let mut rows: Vec<_> = (0..20).map(|i| mid_bar(100.0 + i as f64)).collect();
    rows.push((1e308, 1.5e308, 1.2e308, 1.4e308));
    rows.push(mid_bar(121.0));
    rows.extend((0..10).map(|i| mid_bar(122.0 + i as f64)));
    let bars = bars_from(&rows);

    let mut engine = AdaptiveEngine::new(EngineConfig::default()).unwrap();
    let run = engine.run(&bars[..22]).unwrap();
    for out in &run.outputs {
        assert!(out.atr.is_finite(), "atr at bar {}", out.bar_index);
        assert!(out.trend_line.is_finite(), "trend line at bar {}", out.bar_index);
        assert!(out.best_centroid.is_finite());
        assert!(out.centroids.iter().all(|c| c.is_finite()));
        assert!(out.performance.iter().all(|p| p.is_finite()));
    }
    // The smoothing overflows on the bar after the spike and is held once.
    assert_eq!(engine.diagnostics().degenerate_atr, 1);
    assert_eq!(run.outputs[11].atr, run.outputs[10].atr);

    let json = engine.snapshot().to_json().unwrap();
    let state = adaptrend_core::EngineState::from_json(&json).unwrap();
    let mut resumed = AdaptiveEngine::resume(EngineConfig::default(), state).unwrap();

    let tail = engine.run(&bars[22..]).unwrap();
    let resumed_tail = resumed.run(&bars[22..]).unwrap();
    assert_eq!(tail.outputs, resumed_tail.outputs);
    assert!(tail.outputs.iter().all(|o| o.atr.is_finite()));
    assert_eq!(engine.diagnostics().degenerate_atr, 1);
}

#[test]
fn two_clusters_over_three_factors() {
    let config = EngineConfig {
        factors: FactorSpec::List(vec![1.0, 2.0, 3.0]),
        k: 2,
        atr_period: 5,
        perf_period: 5,
        ..EngineConfig::default()
    };
    let bars = reversal(30, 30);
    let mut engine = AdaptiveEngine::new(config).unwrap();
    let run = engine.run(&bars).unwrap();
    assert!(run.outputs.iter().all(|o| o.centroids.len() == 2));
    assert!(run.outputs.iter().all(|o| o.signal_strength <= 10));
}

// ── 7. Determinism ───────────────────────────────────────────────────

#[test]
fn same_bars_same_results() {
    let bars: Vec<Bar> = bars_from(
        &(0..300)
            .map(|i| {
                let c = 100.0 + (i as f64 * 0.07).sin() * 15.0 + i as f64 * 0.02;
                (c - 0.3, c + 1.2, c - 1.4, c)
            })
            .collect::<Vec<_>>(),
    );
    let a = AdaptiveEngine::new(EngineConfig::default())
        .unwrap()
        .run(&bars)
        .unwrap();
    let b = AdaptiveEngine::new(EngineConfig::default())
        .unwrap()
        .run(&bars)
        .unwrap();
    assert_eq!(a, b);
    assert_eq!(a.outputs.len(), 290);
}
