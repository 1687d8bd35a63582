use criterion::{criterion_group, criterion_main, Criterion};
use std::f64::consts::PI;

use datavis_client::derived::window_range;
use datavis_client::history::{Channel, HistoryConfig, HistoryStore};
use datavis_client::spectral::{estimate_spin, SpectralEstimator};

fn tone(n: usize, dt: f64, f0: f64) -> Vec<f64> {
    (0..n).map(|i| (2.0 * PI * f0 * i as f64 * dt).sin()).collect()
}

// Per-tick FFT over the B window (the dominant per-tick cost)
fn bench_spectral(c: &mut Criterion) {
    let samples = tone(512, 0.1, 0.5);
    let est = SpectralEstimator::new(512);

    c.bench_function("spin_estimate_512_cached_plan", |b| {
        b.iter(|| std::hint::black_box(est.estimate_spin(samples.iter().copied(), 0.1)));
    });

    c.bench_function("spin_estimate_512_fresh_plan", |b| {
        b.iter(|| std::hint::black_box(estimate_spin(&samples, 0.1)));
    });

    let long = tone(4096, 0.1, 0.5);
    let est_long = SpectralEstimator::new(4096);
    c.bench_function("spin_estimate_4096_cached_plan", |b| {
        b.iter(|| std::hint::black_box(est_long.estimate_spin(long.iter().copied(), 0.1)));
    });
}

// Ring append + window min/max for three axes
fn bench_history(c: &mut Criterion) {
    let mut store = HistoryStore::new(&HistoryConfig::default());
    let mut i = 0u64;

    c.bench_function("history_append3_and_range", |b| {
        b.iter(|| {
            i = i.wrapping_add(1);
            let v = (i as f64 * 0.01).sin();
            store.append3(Channel::RATE, [v, -v, 0.5 * v]);
            let r = window_range(
                Channel::RATE
                    .into_iter()
                    .flat_map(|ch| store.sequence(ch).collect::<Vec<_>>()),
            );
            std::hint::black_box(r);
        });
    });
}

criterion_group!(benches, bench_spectral, bench_history);
criterion_main!(benches);
