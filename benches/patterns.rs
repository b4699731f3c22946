//! Benchmarks for candlestick detection and the head-and-shoulders finder.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tradingmind::prelude::*;

const T0: i64 = 1_700_000_000_000;
const MINUTE: i64 = 60_000;

/// Generate a deterministic wandering series
fn generate_series(n: usize) -> BarSeries {
  let mut bars = Vec::with_capacity(n);
  let mut price = 100.0;

  for i in 0..n {
    let change = ((i * 7 + 13) % 100) as f64 / 50.0 - 1.0; // Deterministic "random"
    let volatility = 2.0 + ((i * 3) % 10) as f64 / 5.0;

    let o = price;
    let c = (price + change).max(1.0);
    let h = o.max(c) + volatility * 0.5;
    let l = (o.min(c) - volatility * 0.5).max(0.5);

    bars.push(Bar::from_millis(T0 + i as i64 * MINUTE, o, h, l, c, 1000.0).unwrap());
    price = c;
  }

  BarSeries::new(bars).unwrap()
}

/// Swinging closes so the finder has extrema to work through
fn generate_swings(n: usize) -> Vec<f64> {
  (0..n)
    .map(|i| {
      let t = i as f64;
      (100.0 + 10.0 * (t / 9.0).sin() + 4.0 * (t / 3.7).sin() + 0.01 * t).ln()
    })
    .collect()
}

fn bench_single_pattern(c: &mut Criterion) {
  let series = generate_series(1000);
  let registry = PatternRegistry::default();

  c.bench_function("detect_three_black_crows_1000_bars", |b| {
    b.iter(|| black_box(registry.detect("ThreeBlackCrows", black_box(&series)).unwrap().count()))
  });
}

fn bench_all_patterns(c: &mut Criterion) {
  let series = generate_series(1000);
  let registry = PatternRegistry::default();

  c.bench_function("scan_all_patterns_1000_bars", |b| {
    b.iter(|| black_box(registry.scan_all(black_box(&series))))
  });
}

fn bench_scaling(c: &mut Criterion) {
  let registry = PatternRegistry::default();

  let mut group = c.benchmark_group("scaling");

  for size in [100, 500, 1000, 5000, 10000].iter() {
    let series = generate_series(*size);

    group.bench_with_input(BenchmarkId::new("scan_all", size), size, |b, _| {
      b.iter(|| black_box(registry.scan_all(black_box(&series))))
    });
  }

  group.finish();
}

fn bench_parallel_scan(c: &mut Criterion) {
  let s1 = generate_series(1000);
  let s2 = generate_series(1000);
  let s3 = generate_series(1000);
  let s4 = generate_series(1000);

  let registry = PatternRegistry::default();

  let instruments: Vec<(&str, &BarSeries)> =
    vec![("SYM1", &s1), ("SYM2", &s2), ("SYM3", &s3), ("SYM4", &s4)];

  c.bench_function("parallel_scan_4_instruments", |b| {
    b.iter(|| {
      black_box(scan_parallel(black_box(&registry), "TweezerBottoms", instruments.clone()))
    })
  });
}

fn bench_head_shoulders(c: &mut Criterion) {
  let mut group = c.benchmark_group("head_shoulders");

  for size in [500, 5000].iter() {
    let closes = generate_swings(*size);
    let config = HsConfig::new(3, false).unwrap();

    group.bench_with_input(BenchmarkId::new("find", size), size, |b, _| {
      b.iter(|| black_box(find_hs_patterns(black_box(&closes), &config).unwrap()))
    });
  }

  group.finish();
}

criterion_group!(
  benches,
  bench_single_pattern,
  bench_all_patterns,
  bench_scaling,
  bench_parallel_scan,
  bench_head_shoulders,
);

criterion_main!(benches);
