//! Benchmarks for the hot paths: Ichimoku computation and mood reading.

use chrono::{Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

use kumolab_core::domain::Candle;
use kumolab_core::ichimoku::compute_ichimoku;
use kumolab_core::mood::market_mood;

fn make_series(n: usize) -> Vec<Candle> {
    let base = Utc.with_ymd_and_hms(2024, 1, 2, 9, 0, 0).unwrap();
    (0..n)
        .map(|i| {
            let close = 1.10 + ((i as f64) * 0.37).sin() * 0.01;
            let open = 1.10 + (((i as f64) - 1.0) * 0.37).sin() * 0.01;
            Candle {
                timestamp: base + Duration::minutes(15 * i as i64),
                open,
                high: open.max(close) + 0.0008,
                low: open.min(close) - 0.0008,
                close,
            }
        })
        .collect()
}

fn bench_ichimoku(c: &mut Criterion) {
    let candles = make_series(1000);
    c.bench_function("compute_ichimoku_1000", |b| {
        b.iter(|| compute_ichimoku(black_box(&candles)))
    });
}

fn bench_mood(c: &mut Criterion) {
    let candles = make_series(100);
    c.bench_function("market_mood_100", |b| {
        b.iter(|| market_mood(black_box(&candles), 1.11, 1.09))
    });
}

criterion_group!(benches, bench_ichimoku, bench_mood);
criterion_main!(benches);
