#![allow(dead_code)]

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use varstar::constants::{ab_mag_to_njy, ObjectId, DPI};
use varstar::{Band, ObjectSummary, Observation};

pub const T_START: f64 = 60000.0;

pub fn rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// `n` uniformly random epochs over `span` days, unsorted.
pub fn random_times(rng: &mut StdRng, n: usize, span: f64) -> Vec<f64> {
    (0..n)
        .map(|_| T_START + rng.random_range(0.0..span))
        .collect()
}

/// Sinusoidal light curve of one band with uniform noise of half-width `noise`.
#[allow(clippy::too_many_arguments)]
pub fn sinusoid_observations(
    rng: &mut StdRng,
    object_id: ObjectId,
    band: Band,
    n: usize,
    span: f64,
    period: f64,
    amplitude: f64,
    noise: f64,
) -> Vec<Observation> {
    random_times(rng, n, span)
        .into_iter()
        .map(|t| {
            let jitter = if noise > 0.0 {
                rng.random_range(-noise..noise)
            } else {
                0.0
            };
            let mag = 20.0 + amplitude * (DPI * (t - T_START) / period).sin() + jitter;
            Observation::from_magnitude(object_id, t, band, mag)
        })
        .collect()
}

/// Catalog row with the given scatter ratio, mean magnitude, count and variability.
pub fn summary(object_id: ObjectId, ratio: f64, magnitude: f64, n: u32, variability: f64) -> ObjectSummary {
    let flux = ab_mag_to_njy(magnitude);
    ObjectSummary {
        object_id,
        ra: 62.0,
        dec: -37.0,
        n_sources: n,
        flux_mean: flux,
        flux_sigma: ratio * flux,
        variability,
    }
}
