//! # Per-band time series extraction
//!
//! Partition the observations of one object into one time-ordered [`Series`] per [`Band`].
//!
//! ## Overview
//! -----------------
//! The catalog returns observations in no particular order and with all bands mixed together.
//! [`extract_band_series`] performs a **stable partition** on the exact band label and sorts each
//! partition by time:
//!
//! - every band of [`Band::ALL`] is present in the output, possibly with an empty series,
//! - an observation lands in exactly one partition,
//! - nothing is interpolated, deduplicated or rejected; an observation without a usable
//!   magnitude (no explicit magnitude and a non-positive flux) is kept with a `NaN` magnitude,
//! - equal timestamps keep their input order.
//!
//! Consumers that need numbers ([`crate::periodogram`], [`crate::phase_fold::FoldedSeries::binned`])
//! work on [`Series::finite`] and ignore the `NaN` points.
//!
//! Time ordering is a view for plotting and folding; nothing downstream depends on it for
//! correctness.
//!
//! ## See also
//! ------------
//! * [`crate::periodogram`] – Consumes one [`Series`] at a time.
//! * [`crate::phase_fold`] – Folds a [`Series`] with a period.
use std::collections::BTreeMap;

use ahash::RandomState;
use itertools::{Itertools, MinMaxResult};
use log::debug;

use crate::{
    constants::{LightCurveSet, MJD},
    observations::{Band, Observation},
};

/// Series of each band for a single object, iterated in canonical band order.
pub type BandSeriesMap = BTreeMap<Band, Series>;

/// Time-ordered photometric series of one object in one band.
///
/// Invariants
/// -----------------
/// * `time.len() == magnitude.len() == magnitude_error.len()`
/// * `time` is non-decreasing.
/// * `magnitude` is `NaN` for observations without a usable magnitude.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Series {
    pub time: Vec<MJD>,
    pub magnitude: Vec<f64>,
    pub magnitude_error: Vec<Option<f64>>,
}

impl Series {
    /// Build a series from parallel time/magnitude slices, sorting by time.
    ///
    /// Panics
    /// ----------
    /// * If the slice lengths differ.
    pub fn new(time: &[MJD], magnitude: &[f64]) -> Self {
        assert_eq!(time.len(), magnitude.len(), "time/magnitude length mismatch");
        let mut series = Series {
            time: time.to_vec(),
            magnitude: magnitude.to_vec(),
            magnitude_error: vec![None; time.len()],
        };
        series.sort_by_time();
        series
    }

    /// Same as [`Series::new`] with a 1-σ uncertainty for every magnitude.
    pub fn with_errors(time: &[MJD], magnitude: &[f64], magnitude_error: &[f64]) -> Self {
        assert_eq!(time.len(), magnitude.len(), "time/magnitude length mismatch");
        assert_eq!(time.len(), magnitude_error.len(), "time/error length mismatch");
        let mut series = Series {
            time: time.to_vec(),
            magnitude: magnitude.to_vec(),
            magnitude_error: magnitude_error.iter().copied().map(Some).collect(),
        };
        series.sort_by_time();
        series
    }

    fn push(&mut self, time: MJD, magnitude: f64, magnitude_error: Option<f64>) {
        self.time.push(time);
        self.magnitude.push(magnitude);
        self.magnitude_error.push(magnitude_error);
    }

    /// Stable sort of all columns by time.
    fn sort_by_time(&mut self) {
        let order: Vec<usize> = (0..self.time.len())
            .sorted_by(|&a, &b| self.time[a].total_cmp(&self.time[b]))
            .collect();

        self.time = order.iter().map(|&i| self.time[i]).collect();
        self.magnitude = order.iter().map(|&i| self.magnitude[i]).collect();
        self.magnitude_error = order.iter().map(|&i| self.magnitude_error[i]).collect();
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Earliest observation time, `None` for an empty series.
    pub fn min_time(&self) -> Option<MJD> {
        self.time.first().copied()
    }

    /// Time span covered by the series (days); zero for fewer than two points.
    pub fn baseline(&self) -> f64 {
        match self.time.iter().copied().minmax_by(|a, b| a.total_cmp(b)) {
            MinMaxResult::MinMax(lo, hi) => hi - lo,
            _ => 0.0,
        }
    }

    /// Arithmetic mean of the finite magnitudes, `None` if there is none.
    pub fn mean_magnitude(&self) -> Option<f64> {
        let (n, sum) = self
            .magnitude
            .iter()
            .filter(|m| m.is_finite())
            .fold((0usize, 0.0), |(n, sum), m| (n + 1, sum + m));
        (n > 0).then(|| sum / n as f64)
    }

    /// Number of points with a finite time and magnitude.
    pub fn n_finite(&self) -> usize {
        self.points()
            .filter(|(t, m)| t.is_finite() && m.is_finite())
            .count()
    }

    /// Copy of the series restricted to points with a finite time and magnitude.
    pub fn finite(&self) -> Series {
        let keep: Vec<usize> = (0..self.len())
            .filter(|&i| self.time[i].is_finite() && self.magnitude[i].is_finite())
            .collect();
        Series {
            time: keep.iter().map(|&i| self.time[i]).collect(),
            magnitude: keep.iter().map(|&i| self.magnitude[i]).collect(),
            magnitude_error: keep.iter().map(|&i| self.magnitude_error[i]).collect(),
        }
    }

    /// Magnitude errors, only if every point has a finite, strictly positive one.
    pub fn complete_errors(&self) -> Option<Vec<f64>> {
        self.magnitude_error
            .iter()
            .map(|e| e.filter(|v| v.is_finite() && *v > 0.0))
            .collect()
    }

    /// Iterate over `(time, magnitude)` pairs in time order.
    pub fn points(&self) -> impl Iterator<Item = (MJD, f64)> + '_ {
        self.time.iter().copied().zip(self.magnitude.iter().copied())
    }
}

/// Partition the observations of one object into per-band, time-ordered series.
///
/// Arguments
/// -----------------
/// * `observations`: Unordered measurements, possibly spanning several bands.
///
/// Return
/// ----------
/// * A [`BandSeriesMap`] holding an entry for **every** band of [`Band::ALL`]; bands without
///   observations map to an empty [`Series`].
///
/// Notes
/// ----------
/// * Every observation is kept; one without a usable AB magnitude gets a `NaN` magnitude
///   (counted at `debug` level). Per-band counts always sum to `observations.len()`.
/// * The partition does not filter on `object_id`; group by object first with
///   [`group_by_object`] when the input mixes sources.
pub fn extract_band_series(observations: &[Observation]) -> BandSeriesMap {
    let mut map: BandSeriesMap = Band::ALL.iter().map(|&b| (b, Series::default())).collect();

    let mut unusable = 0usize;
    for obs in observations {
        let mag = obs.ab_magnitude().unwrap_or_else(|| {
            unusable += 1;
            f64::NAN
        });
        map.entry(obs.band)
            .or_default()
            .push(obs.time, mag, obs.magnitude_error());
    }

    if unusable > 0 {
        debug!("{unusable} observation(s) without a usable magnitude kept as NaN");
    }

    for series in map.values_mut() {
        series.sort_by_time();
    }
    map
}

/// Group a flat table of observations into a [`LightCurveSet`] keyed by object.
///
/// Input order is preserved within each object.
pub fn group_by_object(observations: impl IntoIterator<Item = Observation>) -> LightCurveSet {
    let mut set = LightCurveSet::with_hasher(RandomState::default());
    for (id, obs) in observations.into_iter().into_group_map_by(|o| o.object_id) {
        set.insert(id, obs);
    }
    set
}
