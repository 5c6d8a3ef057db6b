//! # Period search with the Lomb-Scargle periodogram
//!
//! Estimate the period of a variable source from an **irregularly sampled** photometric
//! [`Series`]. For each frequency of a dense grid, the periodogram scores how well a single
//! sinusoid (plus an offset) explains the magnitudes; the frequency of maximum power is the
//! candidate, and its reciprocal the candidate period.
//!
//! ## Overview
//! -----------------
//! * [`PeriodSearchParams`] – Search range, frequency grid, normalization and fitting options,
//!   built and validated through [`PeriodSearchParamsBuilder`].
//! * [`lomb_scargle`] – Compute the full [`Periodogram`] of a series.
//! * [`estimate_period`] – Periodogram + argmax, packaged as a [`PeriodEstimate`].
//! * [`best_fit_model`] – Least-squares sinusoid at a given frequency.
//! * [`multi_band`] – Independent per-band estimates and their consensus.
//!
//! ## Frequency grid
//! -----------------
//! * [`FrequencyGrid::Auto`] – spacing `df = 1 / (samples_per_peak · baseline)`; the range
//!   defaults to `[df/2, nyquist_factor · n / (2·baseline)]` when bounds are not configured.
//! * [`FrequencyGrid::Explicit`] – `n` evenly spaced frequencies between the configured bounds.
//!
//! Grid frequencies are strictly increasing, so the argmax keeps the **lowest** frequency
//! (longest period) among equal maxima.
//!
//! ## Normalization
//! -----------------
//! Power values are only comparable between runs sharing the same configuration. The
//! normalization never changes which frequency wins.
//!
//! ## Errors
//! -----------------
//! * [`VarStarError::InsufficientData`] – fewer than [`MIN_POINTS`] finite points.
//! * [`VarStarError::DegenerateSeries`] – identical magnitudes (zero variance) or zero time
//!   baseline with an automatic grid.
//! * [`VarStarError::InvalidParameter`] – parameters rejected by [`PeriodSearchParams::validate`].
//!
//! Points with a non-finite time or magnitude are ignored by the search; [`MIN_POINTS`]
//! counts finite points only.
//!
//! ## Example
//! -----------------
//! ```rust,no_run
//! use varstar::observations::band_series::Series;
//! use varstar::periodogram::{estimate_period, PeriodSearchParams};
//!
//! let time: Vec<f64> = (0..60)
//!     .map(|i| i as f64 * 0.37 + 0.05 * ((i * i) % 7) as f64)
//!     .collect();
//! let mag: Vec<f64> = time
//!     .iter()
//!     .map(|t| 20.0 + 0.3 * (std::f64::consts::TAU * t / 0.5).sin())
//!     .collect();
//!
//! let params = PeriodSearchParams::builder()
//!     .period_range(0.05, 1.25)
//!     .build()
//!     .unwrap();
//! let estimate = estimate_period(&Series::new(&time, &mag), &params).unwrap();
//! assert!((estimate.best_period - 0.5).abs() < 0.005);
//! ```
pub mod lomb_scargle;
pub mod multi_band;

use std::cmp::Ordering::{Equal, Greater, Less};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    constants::CyclesPerDay, observations::band_series::Series, varstar_errors::VarStarError,
};

pub use lomb_scargle::{best_fit_model, lomb_scargle, SinusoidModel};

/// Minimum number of points for a period search.
pub const MIN_POINTS: usize = 2;

/// How the periodogram frequencies are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrequencyGrid {
    /// Spacing derived from the time baseline of the series.
    Auto {
        samples_per_peak: f64,
        nyquist_factor: f64,
    },
    /// `n` evenly spaced frequencies from the minimum to the maximum frequency (inclusive).
    Explicit { n: usize },
}

impl Default for FrequencyGrid {
    fn default() -> Self {
        FrequencyGrid::Auto {
            samples_per_peak: 5.0,
            nyquist_factor: 5.0,
        }
    }
}

/// Normalization convention of the periodogram power.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Normalization {
    /// Fraction of the variance explained by the sinusoid, in `[0, 1]`.
    #[default]
    Standard,
    /// Explained over unexplained variance.
    Model,
    /// `-ln(1 - p_standard)`.
    Log,
    /// Unnormalized power spectral density, scaled by `½·Σ 1/σ²`.
    Psd,
}

impl fmt::Display for Normalization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Normalization::Standard => "standard",
            Normalization::Model => "model",
            Normalization::Log => "log",
            Normalization::Psd => "psd",
        };
        f.write_str(s)
    }
}

/// Configuration of a period search.
///
/// Defaults search periods between 0.05 and 1.25 days (`[0.8, 20]` cycles/day) on an
/// automatic grid with 5 samples per peak, floating-mean fit, standard normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeriodSearchParams {
    /// Lowest searched frequency (cycles/day); `None` lets the grid choose.
    pub min_frequency: Option<CyclesPerDay>,
    /// Highest searched frequency (cycles/day); `None` lets the grid choose.
    pub max_frequency: Option<CyclesPerDay>,
    pub grid: FrequencyGrid,
    pub normalization: Normalization,
    /// Fit an offset together with the sinusoid (generalized Lomb-Scargle).
    pub fit_mean: bool,
    /// Subtract the weighted mean of the magnitudes before fitting.
    pub center_data: bool,
    /// Weight points by `1/σ²` when every point has a magnitude error.
    pub use_errors: bool,
    /// Upper limit on the number of grid frequencies.
    pub max_grid_points: usize,
}

impl Default for PeriodSearchParams {
    fn default() -> Self {
        PeriodSearchParams {
            min_frequency: Some(0.8),
            max_frequency: Some(20.0),
            grid: FrequencyGrid::default(),
            normalization: Normalization::Standard,
            fit_mean: true,
            center_data: true,
            use_errors: false,
            max_grid_points: 2_000_000,
        }
    }
}

impl PeriodSearchParams {
    /// Equivalent to [`PeriodSearchParams::default()`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a [`PeriodSearchParamsBuilder`] starting from the defaults.
    pub fn builder() -> PeriodSearchParamsBuilder {
        PeriodSearchParamsBuilder::new()
    }

    /// Check the configuration.
    ///
    /// Run by [`PeriodSearchParamsBuilder::build`] and by every search entry point, so struct
    /// literals and deserialized values are checked too.
    ///
    /// Validation rules
    /// -----------------
    /// * Configured bounds are finite and `> 0`; when both are set, `min < max`.
    /// * `Auto` grid: `samples_per_peak > 0`, `nyquist_factor > 0`.
    /// * `Explicit` grid: `n ≥ 2` and both bounds configured.
    /// * `max_grid_points ≥ 1`.
    pub fn validate(&self) -> Result<(), VarStarError> {
        for (name, bound) in [("min_frequency", self.min_frequency), ("max_frequency", self.max_frequency)]
        {
            if let Some(v) = bound {
                if !gt0(v) {
                    return Err(VarStarError::InvalidParameter(format!(
                        "{name} must be finite and > 0, got {v}"
                    )));
                }
            }
        }
        if let (Some(lo), Some(hi)) = (self.min_frequency, self.max_frequency) {
            if !lt(lo, hi) {
                return Err(VarStarError::InvalidParameter(
                    "require min_frequency < max_frequency".into(),
                ));
            }
        }

        match self.grid {
            FrequencyGrid::Auto {
                samples_per_peak,
                nyquist_factor,
            } => {
                if !gt0(samples_per_peak) || !gt0(nyquist_factor) {
                    return Err(VarStarError::InvalidParameter(
                        "samples_per_peak and nyquist_factor must be > 0".into(),
                    ));
                }
            }
            FrequencyGrid::Explicit { n } => {
                if n < 2 {
                    return Err(VarStarError::InvalidParameter(
                        "an explicit grid needs at least 2 frequencies".into(),
                    ));
                }
                if self.min_frequency.is_none() || self.max_frequency.is_none() {
                    return Err(VarStarError::InvalidParameter(
                        "an explicit grid needs both frequency bounds".into(),
                    ));
                }
            }
        }

        if self.max_grid_points == 0 {
            return Err(VarStarError::InvalidParameter(
                "max_grid_points must be >= 1".into(),
            ));
        }

        Ok(())
    }
}

/// Return true iff x > 0.0, finite, and comparable (i.e., not NaN).
#[inline]
fn gt0(x: f64) -> bool {
    x.is_finite() && x.partial_cmp(&0.0) == Some(Greater)
}

/// Return true iff a < b and comparable.
#[inline]
fn lt(a: f64, b: f64) -> bool {
    matches!(a.partial_cmp(&b), Some(Less))
}

/// Builder for [`PeriodSearchParams`], with validation.
#[derive(Debug, Clone, Default)]
pub struct PeriodSearchParamsBuilder {
    params: PeriodSearchParams,
}

impl PeriodSearchParamsBuilder {
    pub fn new() -> Self {
        Self {
            params: PeriodSearchParams::default(),
        }
    }

    /// Search `[min, max]` in cycles/day.
    pub fn frequency_range(mut self, min: CyclesPerDay, max: CyclesPerDay) -> Self {
        self.params.min_frequency = Some(min);
        self.params.max_frequency = Some(max);
        self
    }

    /// Search periods in `[min_period, max_period]` days, i.e. frequencies
    /// `[1/max_period, 1/min_period]`.
    pub fn period_range(self, min_period: f64, max_period: f64) -> Self {
        self.frequency_range(1.0 / max_period, 1.0 / min_period)
    }

    /// Let the automatic grid choose both bounds.
    pub fn auto_range(mut self) -> Self {
        self.params.min_frequency = None;
        self.params.max_frequency = None;
        self
    }

    pub fn min_frequency(mut self, v: Option<CyclesPerDay>) -> Self {
        self.params.min_frequency = v;
        self
    }
    pub fn max_frequency(mut self, v: Option<CyclesPerDay>) -> Self {
        self.params.max_frequency = v;
        self
    }
    pub fn grid(mut self, v: FrequencyGrid) -> Self {
        self.params.grid = v;
        self
    }
    pub fn normalization(mut self, v: Normalization) -> Self {
        self.params.normalization = v;
        self
    }
    pub fn fit_mean(mut self, v: bool) -> Self {
        self.params.fit_mean = v;
        self
    }
    pub fn center_data(mut self, v: bool) -> Self {
        self.params.center_data = v;
        self
    }
    pub fn use_errors(mut self, v: bool) -> Self {
        self.params.use_errors = v;
        self
    }
    pub fn max_grid_points(mut self, v: usize) -> Self {
        self.params.max_grid_points = v;
        self
    }

    /// Finalize the builder, checking the result with [`PeriodSearchParams::validate`].
    pub fn build(self) -> Result<PeriodSearchParams, VarStarError> {
        self.params.validate()?;
        Ok(self.params)
    }
}

impl fmt::Display for PeriodSearchParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bound = |b: Option<f64>| b.map_or("auto".to_string(), |v| format!("{v:.4}"));
        let grid = match self.grid {
            FrequencyGrid::Auto {
                samples_per_peak,
                nyquist_factor,
            } => format!("auto (samples_per_peak={samples_per_peak}, nyquist_factor={nyquist_factor})"),
            FrequencyGrid::Explicit { n } => format!("explicit (n={n})"),
        };

        if f.alternate() {
            writeln!(f, "Period Search Parameters")?;
            writeln!(f, "------------------------")?;
            writeln!(f, "  min_frequency   = {}  # cycles/day", bound(self.min_frequency))?;
            writeln!(f, "  max_frequency   = {}  # cycles/day", bound(self.max_frequency))?;
            writeln!(f, "  grid            = {grid}")?;
            writeln!(f, "  normalization   = {}", self.normalization)?;
            writeln!(f, "  fit_mean        = {}", self.fit_mean)?;
            writeln!(f, "  center_data     = {}", self.center_data)?;
            writeln!(f, "  use_errors      = {}", self.use_errors)?;
            write!(f, "  max_grid_points = {}", self.max_grid_points)
        } else {
            write!(
                f,
                "f=[{}, {}] grid={} norm={} fit_mean={}",
                bound(self.min_frequency),
                bound(self.max_frequency),
                grid,
                self.normalization,
                self.fit_mean
            )
        }
    }
}

/// Power of one series over a frequency grid.
///
/// Invariants
/// -----------------
/// * `frequency` is strictly increasing and every frequency is `> 0`.
/// * `power.len() == frequency.len()`, every power is `≥ 0`.
#[derive(Debug, Clone, PartialEq)]
pub struct Periodogram {
    pub frequency: Vec<CyclesPerDay>,
    pub power: Vec<f64>,
    pub normalization: Normalization,
}

impl Periodogram {
    pub fn len(&self) -> usize {
        self.frequency.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frequency.is_empty()
    }

    /// Index of the first maximum of the power (lowest frequency among ties).
    pub fn best_index(&self) -> Option<usize> {
        let mut best: Option<usize> = None;
        for (i, &p) in self.power.iter().enumerate() {
            match best {
                None => best = Some(i),
                Some(b) => {
                    if p.partial_cmp(&self.power[b]) == Some(Greater) {
                        best = Some(i);
                    }
                }
            }
        }
        best
    }

    /// Frequency of maximum power.
    pub fn best_frequency(&self) -> Option<CyclesPerDay> {
        self.best_index().map(|i| self.frequency[i])
    }

    /// Reciprocal of [`Periodogram::best_frequency`], in days.
    pub fn best_period(&self) -> Option<f64> {
        self.best_frequency().map(|f| 1.0 / f)
    }

    /// Grid expressed as periods (days), in the grid order (decreasing).
    pub fn periods(&self) -> impl Iterator<Item = f64> + '_ {
        self.frequency.iter().map(|f| 1.0 / f)
    }

    /// Indices of the `k` highest local maxima, strongest first, ties broken by frequency.
    pub fn top_peaks(&self, k: usize) -> Vec<usize> {
        let n = self.power.len();
        let mut peaks: Vec<usize> = (0..n)
            .filter(|&i| {
                let left = i == 0 || self.power[i] >= self.power[i - 1];
                let right = i + 1 == n || self.power[i] > self.power[i + 1];
                left && right
            })
            .collect();
        peaks.sort_by(|&a, &b| match self.power[b].partial_cmp(&self.power[a]) {
            Some(Equal) | None => a.cmp(&b),
            Some(o) => o,
        });
        peaks.truncate(k);
        peaks
    }
}

/// Outcome of a period search on one series.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodEstimate {
    pub periodogram: Periodogram,
    pub best_frequency: CyclesPerDay,
    /// Candidate period in days, `1 / best_frequency`.
    pub best_period: f64,
    pub best_power: f64,
}

/// Compute the periodogram of `series` and select the frequency of maximum power.
///
/// Arguments
/// -----------------
/// * `series`: Time (days) and magnitudes of one object in one band.
/// * `params`: Validated search configuration.
///
/// Return
/// ----------
/// * A [`PeriodEstimate`] holding the full periodogram and the argmax.
///
/// Errors
/// ----------
/// * [`VarStarError::InsufficientData`] for fewer than two points.
/// * [`VarStarError::DegenerateSeries`] when the power is undefined (constant magnitudes).
pub fn estimate_period(
    series: &Series,
    params: &PeriodSearchParams,
) -> Result<PeriodEstimate, VarStarError> {
    let periodogram = lomb_scargle(series, params)?;
    let idx = periodogram
        .best_index()
        .ok_or_else(|| VarStarError::DegenerateSeries("empty frequency grid".into()))?;

    let best_frequency = periodogram.frequency[idx];
    let best_power = periodogram.power[idx];
    Ok(PeriodEstimate {
        best_frequency,
        best_period: 1.0 / best_frequency,
        best_power,
        periodogram,
    })
}
