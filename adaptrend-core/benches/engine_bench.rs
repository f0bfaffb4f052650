//! Criterion benchmarks for adaptrend hot paths.
//!
//! Benchmarks:
//! 1. Full engine run (ATR + bank + tracker + clustering per bar)
//! 2. Single incremental update on a warm engine
//! 3. One clustering cycle over the default factor set
//! 4. Batch ATR

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use adaptrend_core::cluster::cluster;
use adaptrend_core::indicators::atr_series;
use adaptrend_core::{AdaptiveEngine, Bar, EngineConfig};

// ── Helpers ──────────────────────────────────────────────────────────

fn make_bars(n: usize) -> Vec<Bar> {
    let base = chrono::NaiveDate::from_ymd_opt(2020, 1, 2)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    (0..n)
        .map(|i| {
            let close = 100.0 + (i as f64 * 0.1).sin() * 10.0;
            Bar {
                symbol: "BENCH".to_string(),
                timestamp: base + chrono::Duration::days(i as i64),
                open: close - 0.3,
                high: close + 1.5,
                low: close - 1.5,
                close,
                volume: 1_000_000.0,
            }
        })
        .collect()
}

// ── 1. Full Run ──────────────────────────────────────────────────────

fn bench_engine_run(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine_run");

    for &bar_count in &[252, 1260, 2520] {
        let bars = make_bars(bar_count);
        group.bench_with_input(
            BenchmarkId::new("default_config", bar_count),
            &bar_count,
            |b, _| {
                b.iter(|| {
                    let mut engine = AdaptiveEngine::new(EngineConfig::default()).unwrap();
                    engine.run(black_box(&bars)).unwrap()
                })
            },
        );
    }

    group.finish();
}

// ── 2. Incremental Update ────────────────────────────────────────────

fn bench_incremental(c: &mut Criterion) {
    let bars = make_bars(1261);
    let mut warm = AdaptiveEngine::new(EngineConfig::default()).unwrap();
    warm.run(&bars[..1260]).unwrap();

    c.bench_function("incremental_update_warm", |b| {
        b.iter_batched(
            || warm.clone(),
            |mut engine| engine.update(black_box(&bars[1260])).unwrap(),
            criterion::BatchSize::SmallInput,
        )
    });
}

// ── 3. Clustering ────────────────────────────────────────────────────

fn bench_clustering(c: &mut Criterion) {
    let scores: Vec<f64> = (0..19).map(|i| ((i * 7919) % 23) as f64 * 0.13 - 1.5).collect();
    c.bench_function("kmeans_19_factors", |b| {
        b.iter(|| cluster(black_box(&scores), 3, 10))
    });
}

// ── 4. ATR ───────────────────────────────────────────────────────────

fn bench_atr(c: &mut Criterion) {
    let bars = make_bars(2520);
    c.bench_function("atr_series_2520", |b| {
        b.iter(|| atr_series(black_box(&bars), 10))
    });
}

criterion_group!(
    benches,
    bench_engine_run,
    bench_incremental,
    bench_clustering,
    bench_atr
);
criterion_main!(benches);
