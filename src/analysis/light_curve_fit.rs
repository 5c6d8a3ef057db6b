//! # Batch analysis over light-curve sets
//!
//! Run [`analyze_object`] on every object of a [`LightCurveSet`] and collect per-object
//! outcomes.
//!
//! ## Result Model
//! -----------------
//! ```text
//! ObjectId → Result<ObjectAnalysis, VarStarError>
//! ```
//!
//! The returned [`FullAnalysisResult`] holds one entry per processed object. An error for one
//! object never aborts the batch; it is logged at `warn` level and stored under its id.
//! Objects are processed in increasing id order.
//!
//! ## Execution Modes
//! -----------------
//! * With the `progress` feature, the batch renders an `indicatif` progress bar showing the
//!   last and smoothed iteration times.
//! * [`LightCurveFit::analyze_all_with_cancel`] polls a caller closure on a wall-clock
//!   interval (20 ms, first poll before the first object) and stops at the first `true`.
//!
//! ## Example
//! -----------------
//! ```rust,no_run
//! use varstar::analysis::{light_curve_fit::LightCurveFit, AnalysisParams};
//! use varstar::observations::band_series::group_by_object;
//!
//! # fn demo(observations: Vec<varstar::observations::Observation>) {
//! let set = group_by_object(observations);
//! if let Some(stats) = set.obs_count_stats() {
//!     eprintln!("{stats:#}");
//! }
//! let results = set.analyze_all(&AnalysisParams::default());
//! for (id, res) in &results {
//!     match res {
//!         Ok(a) => eprintln!("{id}: P = {:.6} d", a.period()),
//!         Err(e) => eprintln!("{id}: {e}"),
//!     }
//! }
//! # }
//! ```
use std::{
    collections::HashMap,
    fmt,
    time::{Duration, Instant},
};

use ahash::RandomState;
use itertools::Itertools;
use log::{info, warn};

#[cfg(feature = "progress")]
use super::progress_bar::{fmt_dur, IterTimer};
use super::{analyze_object, AnalysisParams, ObjectAnalysis};
use crate::{
    constants::{LightCurveSet, ObjectId},
    varstar_errors::VarStarError,
};
#[cfg(feature = "progress")]
use indicatif::{ProgressBar, ProgressStyle};

/// Outcome of a batch run, one entry per processed object.
pub type FullAnalysisResult =
    HashMap<ObjectId, Result<ObjectAnalysis, VarStarError>, RandomState>;

/// Borrow the analysis of `key`.
///
/// Return
/// ----------
/// * `Ok(None)` if the object was not processed, `Err` if its analysis failed.
pub fn analysis_for<'a>(
    all: &'a FullAnalysisResult,
    key: &ObjectId,
) -> Result<Option<&'a ObjectAnalysis>, &'a VarStarError> {
    match all.get(key) {
        None => Ok(None),
        Some(Err(e)) => Err(e),
        Some(Ok(a)) => Ok(Some(a)),
    }
}

/// Move the analysis of `key` out of the map.
pub fn take_analysis(
    all: &mut FullAnalysisResult,
    key: &ObjectId,
) -> Result<Option<ObjectAnalysis>, VarStarError> {
    all.remove(key).transpose()
}

/// Distribution of the number of observations per object.
///
/// Percentiles use the nearest-rank index `round(q·(N−1))`.
///
/// `{}` prints `min=2, p25=4, median=8, p95=15, max=20`; `{:#}` prints one value per line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObsCountStats {
    pub min: usize,
    pub p25: usize,
    pub median: usize,
    pub p95: usize,
    pub max: usize,
}

impl fmt::Display for ObsCountStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            writeln!(f, "Observation count per object")?;
            writeln!(f, "----------------------------")?;
            writeln!(f, "min    : {}", self.min)?;
            writeln!(f, "p25    : {}", self.p25)?;
            writeln!(f, "median : {}", self.median)?;
            writeln!(f, "p95    : {}", self.p95)?;
            write!(f, "max    : {}", self.max)
        } else {
            write!(
                f,
                "min={}, p25={}, median={}, p95={}, max={}",
                self.min, self.p25, self.median, self.p95, self.max
            )
        }
    }
}

pub trait LightCurveFit {
    /// Analyze every object of the set.
    ///
    /// Arguments
    /// -----------------
    /// * `params`: Configuration applied to all objects.
    ///
    /// Return
    /// ----------
    /// * A [`FullAnalysisResult`] with one entry per object.
    fn analyze_all(&self, params: &AnalysisParams) -> FullAnalysisResult;

    /// Same as [`LightCurveFit::analyze_all`], stopping early when `should_cancel` returns
    /// `true`. Objects processed before the cancellation keep their results.
    fn analyze_all_with_cancel<F>(&self, params: &AnalysisParams, should_cancel: F) -> FullAnalysisResult
    where
        F: FnMut() -> bool;

    /// Total number of observations across all objects.
    fn total_observations(&self) -> usize;

    fn number_of_objects(&self) -> usize;

    /// Statistics on observations per object, `None` for an empty set.
    fn obs_count_stats(&self) -> Option<ObsCountStats>;
}

const POLL_INTERVAL: Duration = Duration::from_millis(20);

impl LightCurveFit for LightCurveSet {
    fn analyze_all(&self, params: &AnalysisParams) -> FullAnalysisResult {
        self.analyze_all_with_cancel(params, || false)
    }

    fn analyze_all_with_cancel<F>(
        &self,
        params: &AnalysisParams,
        mut should_cancel: F,
    ) -> FullAnalysisResult
    where
        F: FnMut() -> bool,
    {
        #[cfg(feature = "progress")]
        let pb = {
            let pb = ProgressBar::new((self.len() as u64).max(1));
            if let Ok(style) = ProgressStyle::with_template(
                "{bar:40.cyan/blue} {pos}/{len} ({percent:>3}%) | {per_sec} | ETA {eta_precise} | {msg}",
            ) {
                pb.set_style(style);
            }
            pb.enable_steady_tick(Duration::from_millis(200));
            pb
        };
        #[cfg(feature = "progress")]
        let mut it_timer = IterTimer::new(0.2);

        let mut results = FullAnalysisResult::with_capacity_and_hasher(self.len(), RandomState::default());
        let mut last_poll: Option<Instant> = None;
        let mut cancelled = false;

        for (&id, observations) in self.iter().sorted_by_key(|(id, _)| **id) {
            if last_poll.map_or(true, |t| t.elapsed() >= POLL_INTERVAL) {
                if should_cancel() {
                    cancelled = true;
                    break;
                }
                last_poll = Some(Instant::now());
            }

            #[cfg(feature = "progress")]
            {
                let last = it_timer.tick();
                pb.set_message(format!(
                    "last: {}, avg: {}",
                    fmt_dur(last),
                    fmt_dur(it_timer.avg())
                ));
            }

            let res = analyze_object(id, observations, params);
            if let Err(e) = &res {
                warn!("object {id}: {e}");
            }
            results.insert(id, res);

            #[cfg(feature = "progress")]
            pb.inc(1);
        }

        #[cfg(feature = "progress")]
        {
            pb.disable_steady_tick();
            pb.finish_and_clear();
        }

        let failed = results.values().filter(|r| r.is_err()).count();
        info!(
            "analyzed {} object(s), {} failed{}",
            results.len(),
            failed,
            if cancelled { " (cancelled)" } else { "" }
        );
        results
    }

    #[inline]
    fn total_observations(&self) -> usize {
        self.values().map(Vec::len).sum()
    }

    #[inline]
    fn number_of_objects(&self) -> usize {
        self.len()
    }

    fn obs_count_stats(&self) -> Option<ObsCountStats> {
        let counts: Vec<usize> = self.values().map(Vec::len).sorted_unstable().collect();
        let n = counts.len();
        if n == 0 {
            return None;
        }

        let q_index = |q: f64| -> usize {
            let idx = (q * (n as f64 - 1.0)).round() as usize;
            idx.min(n - 1)
        };

        Some(ObsCountStats {
            min: counts[0],
            p25: counts[q_index(0.25)],
            median: counts[q_index(0.50)],
            p95: counts[q_index(0.95)],
            max: counts[n - 1],
        })
    }
}
