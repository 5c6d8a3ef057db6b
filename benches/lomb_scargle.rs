//! Benchmarks for the Lomb-Scargle period search.
//!
//! Examples:
//!   cargo bench --bench lomb_scargle
//!   cargo bench lomb_scargle -- lomb_scargle/points/200
//!   cargo bench lomb_scargle -- lomb_scargle/multi_band

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use varstar::constants::DPI;
use varstar::{
    estimate_multi_band, estimate_period, extract_band_series, Band, Observation,
    PeriodSearchParams, Series,
};

/// Noisy sinusoid sampled at `n` random epochs over 60 days.
fn make_series(rng: &mut StdRng, n: usize, period: f64) -> Series {
    let mut t: Vec<f64> = (0..n).map(|_| 60000.0 + rng.random_range(0.0..60.0)).collect();
    t.sort_by(f64::total_cmp);
    let mag: Vec<f64> = t
        .iter()
        .map(|t| 20.0 + 0.4 * (DPI * t / period).sin() + rng.random_range(-0.05..0.05))
        .collect();
    Series::new(&t, &mag)
}

fn bench_lomb_scargle(c: &mut Criterion) {
    let mut group = c.benchmark_group("lomb_scargle");
    let params = PeriodSearchParams::default();
    let mut rng = StdRng::seed_from_u64(42);

    for n in [50usize, 200, 1000] {
        let series = make_series(&mut rng, n, 0.37);
        group.bench_with_input(BenchmarkId::new("points", n), &series, |b, s| {
            b.iter(|| {
                let res = estimate_period(black_box(s), &params);
                black_box(&res);
            })
        });
    }

    let observations: Vec<Observation> = [Band::G, Band::R, Band::I]
        .into_iter()
        .flat_map(|band| {
            let s = make_series(&mut rng, 150, 0.61);
            s.points()
                .map(|(t, m)| Observation::from_magnitude(1, t, band, m))
                .collect::<Vec<_>>()
        })
        .collect();
    let bands = extract_band_series(&observations);

    group.bench_function("multi_band", |b| {
        b.iter(|| {
            let res = estimate_multi_band(black_box(&bands), &params);
            black_box(&res);
        })
    });

    group.finish();
}

criterion_group!(lomb_scargle_benches, bench_lomb_scargle);
criterion_main!(lomb_scargle_benches);
