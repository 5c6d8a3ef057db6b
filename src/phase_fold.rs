//! # Phase folding
//!
//! Map observation times onto a repeating cycle, `phase = ((t − t0) / P) mod 1`, so that
//! several cycles of a periodic signal overlay each other.
//!
//! ## Overview
//! -----------------
//! * [`phase`] – Phase of a single timestamp, always in `[0, 1)` (also for `t < t0`).
//! * [`fold_series`] – Fold one [`Series`] into a phase-ordered [`FoldedSeries`].
//! * [`fold_bands`] – Fold every band of an object with a shared period and epoch.
//! * [`FoldedSeries::binned`] – Mean magnitude per phase bin.
//!
//! Mean-centering of magnitudes is a display transform for cross-band plots; it never enters
//! the phase computation.
use std::collections::BTreeMap;

use itertools::Itertools;

use crate::{
    constants::MJD,
    observations::{
        band_series::{BandSeriesMap, Series},
        Band,
    },
    varstar_errors::VarStarError,
};

/// Phase of `time` for a period `period` (days) and reference epoch `epoch` (MJD).
///
/// Return
/// ----------
/// * A phase in `[0, 1)`.
///
/// Errors
/// ----------
/// * [`VarStarError::InvalidPeriod`] if `period` is non-positive or not finite.
pub fn phase(time: MJD, period: f64, epoch: MJD) -> Result<f64, VarStarError> {
    if !period.is_finite() || period <= 0.0 {
        return Err(VarStarError::InvalidPeriod(period));
    }
    let p = ((time - epoch) / period).rem_euclid(1.0);
    // rem_euclid can round up to exactly 1.0 for tiny negative inputs
    Ok(if p >= 1.0 { 0.0 } else { p })
}

/// One point of a folded light curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseFoldedPoint {
    pub phase: f64,
    pub time: MJD,
    /// Original magnitude, or magnitude minus the series mean when folded with centering.
    pub magnitude: f64,
}

/// Phase-ordered view of a [`Series`].
#[derive(Debug, Clone, PartialEq)]
pub struct FoldedSeries {
    pub period: f64,
    pub epoch: MJD,
    pub centered: bool,
    /// Sorted by phase; equal phases keep time order.
    pub points: Vec<PhaseFoldedPoint>,
}

impl FoldedSeries {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn phases(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.phase).collect()
    }

    pub fn magnitudes(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.magnitude).collect()
    }

    /// Mean magnitude in `n_bins` equal-width phase bins.
    ///
    /// Return
    /// ----------
    /// * One entry per bin, `None` for bins without any finite magnitude.
    ///
    /// Errors
    /// ----------
    /// * [`VarStarError::InvalidParameter`] if `n_bins == 0`.
    pub fn binned(&self, n_bins: usize) -> Result<Vec<Option<f64>>, VarStarError> {
        if n_bins == 0 {
            return Err(VarStarError::InvalidParameter(
                "number of phase bins must be > 0".into(),
            ));
        }

        let mut count = vec![0u32; n_bins];
        let mut sum = vec![0.0; n_bins];
        for point in self.points.iter().filter(|p| p.magnitude.is_finite()) {
            let idx = ((point.phase * n_bins as f64).floor() as usize).min(n_bins - 1);
            count[idx] += 1;
            sum[idx] += point.magnitude;
        }

        Ok(sum
            .into_iter()
            .zip(count)
            .map(|(s, c)| (c > 0).then(|| s / c as f64))
            .collect())
    }
}

/// Fold a single series.
///
/// Arguments
/// -----------------
/// * `series`: Time-ordered magnitudes of one band.
/// * `period`: Folding period in days.
/// * `epoch`: Reference time; defaults to the first time of `series`.
/// * `center`: Subtract the mean of the finite magnitudes of `series` from every point.
///
/// Every point is kept; a NaN magnitude stays NaN.
///
/// Errors
/// ----------
/// * [`VarStarError::InvalidPeriod`] if `period` is non-positive or not finite.
pub fn fold_series(
    series: &Series,
    period: f64,
    epoch: Option<MJD>,
    center: bool,
) -> Result<FoldedSeries, VarStarError> {
    if !period.is_finite() || period <= 0.0 {
        return Err(VarStarError::InvalidPeriod(period));
    }
    let epoch = epoch.or_else(|| series.min_time()).unwrap_or(0.0);
    let offset = match (center, series.mean_magnitude()) {
        (true, Some(mean)) => mean,
        _ => 0.0,
    };

    let points = series
        .points()
        .map(|(time, mag)| {
            Ok(PhaseFoldedPoint {
                phase: phase(time, period, epoch)?,
                time,
                magnitude: mag - offset,
            })
        })
        .collect::<Result<Vec<_>, VarStarError>>()?
        .into_iter()
        .sorted_by(|a, b| a.phase.total_cmp(&b.phase))
        .collect();

    Ok(FoldedSeries {
        period,
        epoch,
        centered: center,
        points,
    })
}

/// Fold every non-empty band of an object with a common period and epoch.
///
/// Arguments
/// -----------------
/// * `bands`: Per-band series of one object.
/// * `period`: Folding period in days.
/// * `reference_band`: Band whose earliest time is the default epoch.
/// * `epoch`: Explicit epoch overriding the reference band.
/// * `center`: Mean-center each band independently.
///
/// Return
/// ----------
/// * Folded series of every non-empty band, in canonical band order.
///
/// Errors
/// ----------
/// * [`VarStarError::InvalidPeriod`] if `period` is non-positive or not finite.
/// * [`VarStarError::InsufficientData`] if no epoch is given and the reference band is empty.
pub fn fold_bands(
    bands: &BandSeriesMap,
    period: f64,
    reference_band: Band,
    epoch: Option<MJD>,
    center: bool,
) -> Result<BTreeMap<Band, FoldedSeries>, VarStarError> {
    let epoch = match epoch {
        Some(t0) => t0,
        None => bands
            .get(&reference_band)
            .and_then(Series::min_time)
            .ok_or(VarStarError::InsufficientData {
                needed: 1,
                found: 0,
            })?,
    };

    bands
        .iter()
        .filter(|(_, s)| !s.is_empty())
        .map(|(&band, s)| Ok((band, fold_series(s, period, Some(epoch), center)?)))
        .collect()
}

#[cfg(test)]
mod phase_fold_test {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_phase_range() {
        assert_relative_eq!(phase(10.25, 1.0, 0.0).unwrap(), 0.25, epsilon = 1e-12);
        assert_relative_eq!(phase(-0.25, 1.0, 0.0).unwrap(), 0.75, epsilon = 1e-12);
        assert_relative_eq!(phase(3.0, 2.0, 1.0).unwrap(), 0.0, epsilon = 1e-12);

        let p = phase(-1e-18, 1.0, 0.0).unwrap();
        assert!((0.0..1.0).contains(&p));
    }

    #[test]
    fn test_invalid_period() {
        assert_eq!(phase(1.0, 0.0, 0.0), Err(VarStarError::InvalidPeriod(0.0)));
        assert_eq!(phase(1.0, -2.0, 0.0), Err(VarStarError::InvalidPeriod(-2.0)));
        assert!(matches!(
            phase(1.0, f64::NAN, 0.0),
            Err(VarStarError::InvalidPeriod(_))
        ));

        let s = Series::new(&[1.0, 2.0], &[20.0, 21.0]);
        assert!(fold_series(&s, -1.0, None, false).is_err());
    }

    #[test]
    fn test_fold_sorted_and_centered() {
        let s = Series::new(&[0.0, 0.3, 0.6, 0.9, 1.2], &[1.0, 2.0, 3.0, 4.0, 5.0]);
        let folded = fold_series(&s, 0.5, None, true).unwrap();

        assert_eq!(folded.epoch, 0.0);
        assert!(folded.centered);
        let phases = folded.phases();
        assert!(phases.windows(2).all(|w| w[0] <= w[1]));
        // 0.0 -> 0.0, 0.3 -> 0.6, 0.6 -> 0.2, 0.9 -> 0.8, 1.2 -> 0.4
        let times: Vec<f64> = folded.points.iter().map(|p| p.time).collect();
        assert_eq!(times, vec![0.0, 0.6, 1.2, 0.3, 0.9]);

        let mean: f64 = folded.magnitudes().iter().sum::<f64>() / 5.0;
        assert_relative_eq!(mean, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_binned() {
        let s = Series::new(&[0.0, 0.1, 0.6, 0.7], &[1.0, 3.0, 10.0, 20.0]);
        let folded = fold_series(&s, 1.0, Some(0.0), false).unwrap();

        let bins = folded.binned(4).unwrap();
        assert_eq!(bins.len(), 4);
        assert_relative_eq!(bins[0].unwrap(), 2.0);
        assert_eq!(bins[1], None);
        assert_relative_eq!(bins[2].unwrap(), 15.0);
        assert_eq!(bins[3], None);

        assert!(matches!(
            folded.binned(0),
            Err(VarStarError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_nan_magnitudes_are_kept_but_not_binned() {
        let s = Series::new(&[0.0, 0.1, 0.6], &[1.0, f64::NAN, 3.0]);
        let folded = fold_series(&s, 1.0, Some(0.0), true).unwrap();
        assert_eq!(folded.len(), 3);
        assert!(folded.points[1].magnitude.is_nan());
        assert_relative_eq!(folded.points[0].magnitude, -1.0);
        assert_relative_eq!(folded.points[2].magnitude, 1.0);

        let bins = folded.binned(2).unwrap();
        assert_relative_eq!(bins[0].unwrap(), -1.0);
        assert_relative_eq!(bins[1].unwrap(), 1.0);
    }

    #[test]
    fn test_fold_bands_reference_epoch() {
        let mut bands: BandSeriesMap = Band::ALL.iter().map(|&b| (b, Series::default())).collect();
        bands.insert(Band::G, Series::new(&[5.0, 6.0], &[20.0, 20.5]));
        bands.insert(Band::R, Series::new(&[4.5, 7.0], &[19.0, 19.5]));

        let folded = fold_bands(&bands, 2.0, Band::G, None, false).unwrap();
        assert_eq!(folded.len(), 2);
        assert_eq!(folded[&Band::R].epoch, 5.0);
        assert_relative_eq!(folded[&Band::R].points[0].phase, 0.0, epsilon = 1e-12);
        assert_relative_eq!(folded[&Band::R].points[1].phase, 0.75, epsilon = 1e-12);

        let err = fold_bands(&bands, 2.0, Band::U, None, false).unwrap_err();
        assert!(matches!(err, VarStarError::InsufficientData { .. }));

        let explicit = fold_bands(&bands, 2.0, Band::U, Some(0.0), false).unwrap();
        assert_eq!(explicit[&Band::G].epoch, 0.0);
    }
}
