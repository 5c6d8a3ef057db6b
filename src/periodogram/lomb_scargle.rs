//! Generalized (floating-mean) Lomb-Scargle periodogram.
//!
//! Direct `O(N·M)` evaluation for `N` points and `M` grid frequencies. At each angular
//! frequency `ω`, times are shifted by the phase offset `τ` that decorrelates the sine and
//! cosine terms,
//!
//! ```text
//! tan(2ωτ) = (S2 − 2·S·C) / (C2 − (C² − S²))     (fit_mean)
//! tan(2ωτ) = S2 / C2                              (otherwise)
//! ```
//!
//! after which the explained weighted variance is `YC²/CC + YS²/SS`.
use itertools::{Itertools, MinMaxResult};
use log::debug;
use nalgebra::{Matrix2, Matrix3, Vector2, Vector3};

use super::{FrequencyGrid, Normalization, PeriodSearchParams, Periodogram, MIN_POINTS};
use crate::{
    constants::{CyclesPerDay, DPI, EPS, MJD},
    observations::band_series::Series,
    varstar_errors::VarStarError,
};

/// Weighted, centered copy of a series ready for the power sums.
struct Prepared {
    /// Times shifted to start at zero.
    t: Vec<f64>,
    y: Vec<f64>,
    /// Weights normalized to sum to one.
    w: Vec<f64>,
    yy: f64,
    psd_scale: f64,
    baseline: f64,
}

fn check_series(series: &Series) -> Result<(), VarStarError> {
    let n = series.len();
    if n < MIN_POINTS {
        return Err(VarStarError::InsufficientData {
            needed: MIN_POINTS,
            found: n,
        });
    }
    if let MinMaxResult::MinMax(lo, hi) = series
        .magnitude
        .iter()
        .copied()
        .minmax_by(|a, b| a.total_cmp(b))
    {
        if hi - lo == 0.0 {
            return Err(VarStarError::DegenerateSeries(
                "all magnitudes are identical".into(),
            ));
        }
    }
    Ok(())
}

fn weighted_mean(w: &[f64], y: &[f64]) -> f64 {
    w.iter().zip(y).map(|(w, y)| w * y).sum()
}

/// `series` must already be restricted to finite points (see [`Series::finite`]).
fn prepare(series: &Series, params: &PeriodSearchParams) -> Result<Prepared, VarStarError> {
    check_series(series)?;

    let raw_w: Vec<f64> = match params.use_errors.then(|| series.complete_errors()).flatten() {
        Some(dy) => dy.iter().map(|e| 1.0 / (e * e)).collect(),
        None => {
            if params.use_errors {
                debug!("incomplete magnitude errors, falling back to uniform weights");
            }
            vec![1.0; series.len()]
        }
    };
    let wsum: f64 = raw_w.iter().sum();
    let w: Vec<f64> = raw_w.iter().map(|v| v / wsum).collect();

    let mut y = series.magnitude.clone();
    if params.center_data || params.fit_mean {
        let mean = weighted_mean(&w, &y);
        y.iter_mut().for_each(|v| *v -= mean);
    }

    let t0 = series.time.iter().copied().fold(f64::INFINITY, f64::min);
    let t: Vec<f64> = series.time.iter().map(|t| t - t0).collect();
    let baseline = t.iter().copied().fold(0.0, f64::max);

    let ybar = weighted_mean(&w, &y);
    let mut yy: f64 = w.iter().zip(&y).map(|(w, y)| w * y * y).sum();
    if params.fit_mean {
        yy -= ybar * ybar;
    }
    if !(yy.is_finite() && yy > 0.0) {
        return Err(VarStarError::DegenerateSeries(
            "zero weighted variance".into(),
        ));
    }

    Ok(Prepared {
        t,
        y,
        w,
        yy,
        psd_scale: 0.5 * wsum,
        baseline,
    })
}

/// Build the frequency grid for a series of `n` points spanning `baseline` days.
///
/// Return
/// ----------
/// * Strictly increasing, strictly positive frequencies within the configured bounds.
///
/// Errors
/// ----------
/// * [`VarStarError::DegenerateSeries`] for a zero baseline with an automatic grid.
/// * [`VarStarError::InvalidParameter`] for an empty range or a grid larger than
///   `max_grid_points`.
pub fn frequency_grid(
    n: usize,
    baseline: f64,
    params: &PeriodSearchParams,
) -> Result<Vec<CyclesPerDay>, VarStarError> {
    params.validate()?;
    let grid = match params.grid {
        FrequencyGrid::Explicit { n: nf } => {
            let (Some(lo), Some(hi)) = (params.min_frequency, params.max_frequency) else {
                return Err(VarStarError::InvalidParameter(
                    "an explicit grid needs both frequency bounds".into(),
                ));
            };
            if nf > params.max_grid_points {
                return Err(VarStarError::InvalidParameter(format!(
                    "grid of {nf} frequencies exceeds max_grid_points={}",
                    params.max_grid_points
                )));
            }
            let step = (hi - lo) / (nf - 1) as f64;
            (0..nf).map(|k| lo + step * k as f64).collect()
        }
        FrequencyGrid::Auto {
            samples_per_peak,
            nyquist_factor,
        } => {
            if baseline <= 0.0 {
                return Err(VarStarError::DegenerateSeries(
                    "zero time baseline".into(),
                ));
            }
            let df = 1.0 / (samples_per_peak * baseline);
            let lo = params.min_frequency.unwrap_or(0.5 * df);
            let hi = params
                .max_frequency
                .unwrap_or(nyquist_factor * 0.5 * n as f64 / baseline);
            if hi < lo {
                return Err(VarStarError::InvalidParameter(format!(
                    "empty frequency range [{lo}, {hi}]"
                )));
            }
            let span = ((hi - lo) / df + 1e-9).floor();
            if span >= params.max_grid_points as f64 {
                return Err(VarStarError::InvalidParameter(format!(
                    "grid of {} frequencies exceeds max_grid_points={}",
                    span + 1.0,
                    params.max_grid_points
                )));
            }
            (0..=span as usize)
                .map(|k| (lo + df * k as f64).min(hi))
                .collect()
        }
    };
    Ok(grid)
}

fn power_at(p: &Prepared, frequency: CyclesPerDay, fit_mean: bool) -> f64 {
    let omega = DPI * frequency;

    // Phase offset τ
    let (mut s2, mut c2, mut s, mut c) = (0.0_f64, 0.0_f64, 0.0_f64, 0.0_f64);
    for (&t, &w) in p.t.iter().zip(&p.w) {
        let (sin2, cos2) = (2.0 * omega * t).sin_cos();
        s2 += w * sin2;
        c2 += w * cos2;
        if fit_mean {
            let (sin1, cos1) = (omega * t).sin_cos();
            s += w * sin1;
            c += w * cos1;
        }
    }
    if fit_mean {
        s2 -= 2.0 * s * c;
        c2 -= c * c - s * s;
    }
    let omega_tau = 0.5 * s2.atan2(c2);

    let (mut yc, mut ys, mut cc, mut ss) = (0.0_f64, 0.0_f64, 0.0_f64, 0.0_f64);
    let (mut y_sum, mut c_sum, mut s_sum) = (0.0_f64, 0.0_f64, 0.0_f64);
    for ((&t, &w), &y) in p.t.iter().zip(&p.w).zip(&p.y) {
        let (sin, cos) = (omega * t - omega_tau).sin_cos();
        yc += w * y * cos;
        ys += w * y * sin;
        cc += w * cos * cos;
        ss += w * sin * sin;
        if fit_mean {
            y_sum += w * y;
            c_sum += w * cos;
            s_sum += w * sin;
        }
    }
    if fit_mean {
        yc -= y_sum * c_sum;
        ys -= y_sum * s_sum;
        cc -= c_sum * c_sum;
        ss -= s_sum * s_sum;
    }

    let mut explained: f64 = 0.0;
    if cc > EPS {
        explained += yc * yc / cc;
    }
    if ss > EPS {
        explained += ys * ys / ss;
    }
    explained.max(0.0)
}

fn normalize(explained: f64, p: &Prepared, normalization: Normalization) -> f64 {
    let standard = (explained / p.yy).clamp(0.0, 1.0);
    match normalization {
        Normalization::Standard => standard,
        Normalization::Model => standard / (1.0 - standard).max(EPS),
        Normalization::Log => -(1.0 - standard).max(EPS).ln(),
        Normalization::Psd => explained * p.psd_scale,
    }
}

/// Compute the Lomb-Scargle periodogram of a series.
///
/// Arguments
/// -----------------
/// * `series`: Times in days and magnitudes; order does not matter.
/// * `params`: Validated search configuration (range, grid, normalization, weighting).
///
/// Return
/// ----------
/// * The [`Periodogram`] over the configured grid.
///
/// Errors
/// ----------
/// * [`VarStarError::InsufficientData`] – fewer than two finite points.
/// * [`VarStarError::DegenerateSeries`] – constant magnitudes, zero baseline.
/// * [`VarStarError::InvalidParameter`] – parameters failing [`PeriodSearchParams::validate`],
///   empty range or oversized grid.
///
/// Notes
/// ----------
/// * Points with a non-finite time or magnitude are ignored.
pub fn lomb_scargle(
    series: &Series,
    params: &PeriodSearchParams,
) -> Result<Periodogram, VarStarError> {
    params.validate()?;
    let series = &series.finite();
    let prepared = prepare(series, params)?;
    let frequency = frequency_grid(series.len(), prepared.baseline, params)?;

    let power = frequency
        .iter()
        .map(|&f| {
            normalize(
                power_at(&prepared, f, params.fit_mean),
                &prepared,
                params.normalization,
            )
        })
        .collect();

    debug!(
        "periodogram: {} points, {} frequencies in [{:.4}, {:.4}]",
        series.len(),
        frequency.len(),
        frequency.first().copied().unwrap_or_default(),
        frequency.last().copied().unwrap_or_default()
    );

    Ok(Periodogram {
        frequency,
        power,
        normalization: params.normalization,
    })
}

/// Least-squares sinusoid `offset + a·sin(2πft) + b·cos(2πft)` at a fixed frequency.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SinusoidModel {
    pub frequency: CyclesPerDay,
    pub offset: f64,
    pub sin_amplitude: f64,
    pub cos_amplitude: f64,
}

impl SinusoidModel {
    /// Model magnitude at time `t` (MJD).
    pub fn evaluate(&self, t: MJD) -> f64 {
        let (sin, cos) = (DPI * self.frequency * t).sin_cos();
        self.offset + self.sin_amplitude * sin + self.cos_amplitude * cos
    }

    /// Semi-amplitude of the sinusoid.
    pub fn amplitude(&self) -> f64 {
        self.sin_amplitude.hypot(self.cos_amplitude)
    }
}

/// Fit the best single sinusoid at `frequency` to `series`.
///
/// With `fit_mean` the offset is a free parameter (3×3 normal equations); otherwise it is
/// fixed to the weighted mean when `center_data` is set, to zero if not.
///
/// Errors
/// ----------
/// * Same preconditions as [`lomb_scargle`].
/// * [`VarStarError::DegenerateSeries`] when the normal equations are singular.
pub fn best_fit_model(
    series: &Series,
    frequency: CyclesPerDay,
    params: &PeriodSearchParams,
) -> Result<SinusoidModel, VarStarError> {
    params.validate()?;
    if !(frequency.is_finite() && frequency > 0.0) {
        return Err(VarStarError::InvalidParameter(format!(
            "model frequency must be > 0, got {frequency}"
        )));
    }
    let series = &series.finite();
    let prepared = prepare(series, params)?;
    let omega = DPI * frequency;
    let w = &prepared.w;
    let y = &series.magnitude;
    let singular = || VarStarError::DegenerateSeries("singular normal equations".into());

    if params.fit_mean {
        let mut a = Matrix3::<f64>::zeros();
        let mut b = Vector3::<f64>::zeros();
        for ((&t, &w), &y) in series.time.iter().zip(w).zip(y) {
            let (sin, cos) = (omega * t).sin_cos();
            let x = Vector3::new(1.0, sin, cos);
            a += w * x * x.transpose();
            b += w * y * x;
        }
        let sol = a.lu().solve(&b).ok_or_else(singular)?;
        Ok(SinusoidModel {
            frequency,
            offset: sol[0],
            sin_amplitude: sol[1],
            cos_amplitude: sol[2],
        })
    } else {
        let offset = if params.center_data {
            weighted_mean(w, y)
        } else {
            0.0
        };
        let mut a = Matrix2::<f64>::zeros();
        let mut b = Vector2::<f64>::zeros();
        for ((&t, &w), &y) in series.time.iter().zip(w).zip(y) {
            let (sin, cos) = (omega * t).sin_cos();
            let x = Vector2::new(sin, cos);
            a += w * x * x.transpose();
            b += w * (y - offset) * x;
        }
        let sol = a.lu().solve(&b).ok_or_else(singular)?;
        Ok(SinusoidModel {
            frequency,
            offset,
            sin_amplitude: sol[0],
            cos_amplitude: sol[1],
        })
    }
}
