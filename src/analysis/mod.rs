//! # Per-object analysis and batch drivers
//!
//! Chain the three analysis stages for one object:
//!
//! ```text
//! observations ─► extract_band_series ─► estimate_multi_band ─► fold_bands
//! ```
//!
//! and run that chain over many objects.
//!
//! Modules
//! -----------------
//! * [`light_curve_fit`] – Batch analysis over a [`LightCurveSet`](crate::constants::LightCurveSet)
//!   (`LightCurveFit` trait, per-object results, count statistics).
//! * [`pipeline`] – End-to-end candidate search through a
//!   [`CatalogService`](crate::catalog::CatalogService).
//! * *(crate-private)* `progress_bar` – Timing helpers for the `progress` feature.
//!
//! Error Semantics
//! -----------------
//! Analysis errors are local to one object. Batch drivers record them against the object
//! identifier and keep going.
pub mod light_curve_fit;
pub mod pipeline;
#[cfg(feature = "progress")]
pub(crate) mod progress_bar;

use std::{collections::BTreeMap, fmt};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    constants::ObjectId,
    observations::{
        band_series::{extract_band_series, BandSeriesMap},
        Band, Observation,
    },
    periodogram::{
        multi_band::{estimate_multi_band, MultiBandPeriod},
        PeriodSearchParams,
    },
    phase_fold::{fold_bands, FoldedSeries},
    varstar_errors::VarStarError,
};

/// Configuration shared by every object of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisParams {
    pub search: PeriodSearchParams,
    /// Band whose first observation is the folding epoch.
    pub reference_band: Band,
    /// Mean-center each folded band.
    pub center_folded: bool,
}

impl Default for AnalysisParams {
    fn default() -> Self {
        AnalysisParams {
            search: PeriodSearchParams::default(),
            reference_band: Band::G,
            center_folded: true,
        }
    }
}

impl fmt::Display for AnalysisParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            writeln!(f, "{:#}", self.search)?;
            writeln!(f, "  reference_band  = {}", self.reference_band)?;
            write!(f, "  center_folded   = {}", self.center_folded)
        } else {
            write!(
                f,
                "{} ref={} center={}",
                self.search, self.reference_band, self.center_folded
            )
        }
    }
}

/// Everything derived from one object's light curve.
#[derive(Debug, PartialEq)]
pub struct ObjectAnalysis {
    pub object_id: ObjectId,
    /// Per-band series, all six bands present.
    pub bands: BandSeriesMap,
    pub periods: MultiBandPeriod,
    /// Band used for the folding epoch.
    pub reference_band: Band,
    /// Every non-empty band folded with the consensus period.
    pub folded: BTreeMap<Band, FoldedSeries>,
}

impl ObjectAnalysis {
    /// Consensus period in days.
    pub fn period(&self) -> f64 {
        self.periods.consensus_period
    }

    /// Number of observations that reached a series.
    pub fn n_points(&self) -> usize {
        self.bands.values().map(|s| s.len()).sum()
    }
}

/// Run extraction, multi-band period search and folding for one object.
///
/// Arguments
/// -----------------
/// * `object_id`: Identifier recorded in the result.
/// * `observations`: The object's measurements, in any order.
/// * `params`: Search and folding configuration.
///
/// Return
/// ----------
/// * An [`ObjectAnalysis`]. The folding epoch is the first time of `params.reference_band`;
///   when that band is empty, the first band (in canonical order) that produced a period is
///   used instead.
///
/// Errors
/// ----------
/// * [`VarStarError::InsufficientData`] or [`VarStarError::DegenerateSeries`] when no band
///   yields a period.
pub fn analyze_object(
    object_id: ObjectId,
    observations: &[Observation],
    params: &AnalysisParams,
) -> Result<ObjectAnalysis, VarStarError> {
    let bands = extract_band_series(observations);
    let periods = estimate_multi_band(&bands, &params.search)?;

    let reference_band = if bands
        .get(&params.reference_band)
        .is_some_and(|s| !s.is_empty())
    {
        params.reference_band
    } else {
        periods
            .bands_used
            .first()
            .copied()
            .unwrap_or(params.reference_band)
    };

    let folded = fold_bands(
        &bands,
        periods.consensus_period,
        reference_band,
        None,
        params.center_folded,
    )?;

    debug!(
        "object {object_id}: period {:.6} d from {} band(s)",
        periods.consensus_period,
        periods.bands_used.len()
    );

    Ok(ObjectAnalysis {
        object_id,
        bands,
        periods,
        reference_band,
        folded,
    })
}
