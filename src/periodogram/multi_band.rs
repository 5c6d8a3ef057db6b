//! # Multi-band period consensus
//!
//! Each band of an object is searched **independently** with [`estimate_period`]; the
//! consensus frequency is the arithmetic mean of the per-band best frequencies, and the
//! consensus period its reciprocal.
//!
//! This is an ensemble heuristic, not a joint multi-band fit. A single band locking onto an
//! alias (e.g. a daily-sampling alias) pulls the mean away from every band's own answer;
//! inspect [`MultiBandPeriod::per_band`] before trusting the consensus.
//!
//! Failure policy
//! -----------------
//! * Empty bands are not searched and do not appear in `per_band`.
//! * Bands failing with an analysis error are recorded in `per_band` and excluded from the mean.
//! * If no band yields an estimate, the whole search fails with the first band error that is
//!   not an analysis error (e.g. [`VarStarError::InvalidParameter`]) if any; otherwise with
//!   [`VarStarError::DegenerateSeries`] when at least one band was degenerate, and with
//!   [`VarStarError::InsufficientData`] reporting the largest count of finite points last.
use std::collections::BTreeMap;

use log::debug;

use super::{estimate_period, PeriodEstimate, PeriodSearchParams, MIN_POINTS};
use crate::{
    constants::CyclesPerDay,
    observations::{band_series::BandSeriesMap, Band},
    varstar_errors::VarStarError,
};

/// Per-band estimates and their consensus.
#[derive(Debug, PartialEq)]
pub struct MultiBandPeriod {
    /// Outcome of every non-empty band.
    pub per_band: BTreeMap<Band, Result<PeriodEstimate, VarStarError>>,
    /// Bands that contributed to the consensus, in canonical order.
    pub bands_used: Vec<Band>,
    pub consensus_frequency: CyclesPerDay,
    /// `1 / consensus_frequency`, in days.
    pub consensus_period: f64,
}

impl MultiBandPeriod {
    /// Successful per-band estimates.
    pub fn estimates(&self) -> impl Iterator<Item = (Band, &PeriodEstimate)> {
        self.per_band
            .iter()
            .filter_map(|(b, r)| r.as_ref().ok().map(|e| (*b, e)))
    }

    /// Largest relative deviation of a band's best frequency from the consensus.
    ///
    /// A large spread usually means that some band converged to an alias.
    pub fn frequency_spread(&self) -> f64 {
        self.estimates()
            .map(|(_, e)| (e.best_frequency - self.consensus_frequency).abs())
            .fold(0.0, f64::max)
            / self.consensus_frequency
    }
}

/// Estimate a period in every band of `bands` and average the best frequencies.
///
/// Arguments
/// -----------------
/// * `bands`: Output of [`extract_band_series`](crate::observations::band_series::extract_band_series).
/// * `params`: Search configuration shared by all bands.
///
/// Return
/// ----------
/// * A [`MultiBandPeriod`] when at least one band produced an estimate.
///
/// Errors
/// ----------
/// * See the module-level failure policy.
pub fn estimate_multi_band(
    bands: &BandSeriesMap,
    params: &PeriodSearchParams,
) -> Result<MultiBandPeriod, VarStarError> {
    let per_band: BTreeMap<Band, Result<PeriodEstimate, VarStarError>> = bands
        .iter()
        .filter(|(_, series)| !series.is_empty())
        .map(|(&band, series)| {
            let res = estimate_period(series, params);
            match &res {
                Ok(e) => debug!("band {band}: best period {:.6} d", e.best_period),
                Err(err) => debug!("band {band}: {err}"),
            }
            (band, res)
        })
        .collect();

    let (bands_used, freqs): (Vec<Band>, Vec<CyclesPerDay>) = per_band
        .iter()
        .filter_map(|(b, r)| r.as_ref().ok().map(|e| (*b, e.best_frequency)))
        .unzip();

    if freqs.is_empty() {
        let mut degenerate = None;
        for err in per_band.into_values().filter_map(Result::err) {
            if !err.is_analysis_error() {
                return Err(err);
            }
            if degenerate.is_none() && matches!(err, VarStarError::DegenerateSeries(_)) {
                degenerate = Some(err);
            }
        }
        if let Some(err) = degenerate {
            return Err(err);
        }
        let found = bands.values().map(|s| s.n_finite()).max().unwrap_or(0);
        return Err(VarStarError::InsufficientData {
            needed: MIN_POINTS,
            found,
        });
    }

    let consensus_frequency = freqs.iter().sum::<f64>() / freqs.len() as f64;
    Ok(MultiBandPeriod {
        per_band,
        bands_used,
        consensus_frequency,
        consensus_period: 1.0 / consensus_frequency,
    })
}

#[cfg(test)]
mod multi_band_test {
    use super::*;
    use crate::{
        constants::DPI,
        observations::{band_series::extract_band_series, Observation},
    };
    use rand::{rngs::StdRng, Rng, SeedableRng};

    /// Noise-free sinusoid sampled at `n` random epochs over 30 days.
    fn band_obs(band: Band, period: f64, n: usize, seed: u64) -> Vec<Observation> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..n)
            .map(|_| {
                let t = 60000.0 + rng.random_range(0.0..30.0);
                let mag = 20.0 + 0.4 * (DPI * t / period).sin();
                Observation::from_magnitude(9, t, band, mag)
            })
            .collect()
    }

    #[test]
    fn test_consensus_is_mean_of_frequencies() {
        let mut obs = band_obs(Band::G, 0.37, 60, 0);
        obs.extend(band_obs(Band::R, 0.37, 60, 5));
        let bands = extract_band_series(&obs);

        let res = estimate_multi_band(&bands, &PeriodSearchParams::default()).unwrap();
        assert_eq!(res.bands_used, vec![Band::G, Band::R]);
        assert_eq!(res.per_band.len(), 2);

        let mean: f64 = res.estimates().map(|(_, e)| e.best_frequency).sum::<f64>() / 2.0;
        assert!((res.consensus_frequency - mean).abs() < 1e-12);
        assert!((res.consensus_period - 0.37).abs() < 0.0037);
        assert!(res.frequency_spread() < 0.01);
    }

    #[test]
    fn test_failed_band_is_excluded() {
        let mut obs = band_obs(Band::I, 0.37, 60, 3);
        obs.push(Observation::from_magnitude(9, 60001.0, Band::U, 21.0));
        let bands = extract_band_series(&obs);

        let res = estimate_multi_band(&bands, &PeriodSearchParams::default()).unwrap();
        assert_eq!(res.bands_used, vec![Band::I]);
        assert_eq!(
            res.per_band[&Band::U],
            Err(VarStarError::InsufficientData {
                needed: 2,
                found: 1
            })
        );
    }

    #[test]
    fn test_every_band_insufficient() {
        let obs = vec![
            Observation::from_magnitude(9, 60001.0, Band::G, 21.0),
            Observation::from_magnitude(9, 60002.0, Band::R, 21.0),
        ];
        let err = estimate_multi_band(&extract_band_series(&obs), &PeriodSearchParams::default())
            .unwrap_err();
        assert_eq!(
            err,
            VarStarError::InsufficientData {
                needed: 2,
                found: 1
            }
        );
    }

    #[test]
    fn test_invalid_parameter_is_not_masked() {
        let bands = extract_band_series(&band_obs(Band::G, 0.37, 40, 11));
        let params = PeriodSearchParams::builder()
            .max_grid_points(10)
            .build()
            .unwrap();
        let err = estimate_multi_band(&bands, &params).unwrap_err();
        assert!(matches!(err, VarStarError::InvalidParameter(_)), "{err}");
        assert!(!err.is_analysis_error());
    }

    #[test]
    fn test_insufficient_counts_finite_points() {
        let obs = vec![
            Observation::from_magnitude(9, 60001.0, Band::G, 21.0),
            Observation::from_magnitude(9, 60002.0, Band::G, f64::NAN),
            Observation::from_magnitude(9, 60003.0, Band::G, f64::NAN),
        ];
        let err = estimate_multi_band(&extract_band_series(&obs), &PeriodSearchParams::default())
            .unwrap_err();
        assert_eq!(
            err,
            VarStarError::InsufficientData {
                needed: 2,
                found: 1
            }
        );
    }

    #[test]
    fn test_degenerate_reported() {
        let obs: Vec<Observation> = (0..10)
            .map(|i| Observation::from_magnitude(9, 60000.0 + i as f64, Band::Z, 19.0))
            .collect();
        let err = estimate_multi_band(&extract_band_series(&obs), &PeriodSearchParams::default())
            .unwrap_err();
        assert!(matches!(err, VarStarError::DegenerateSeries(_)));
    }
}
