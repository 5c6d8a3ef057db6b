//! # Variable-star candidate selection
//!
//! Pre-select objects worth a period search from their catalog summary statistics, then carry
//! the derived period and folded views along with each selected object.
//!
//! ## Overview
//! -----------------
//! * [`ObjectSummary`] – One catalog row (count, mean flux, scatter, variability, position).
//! * [`CandidateFilter`] – Named thresholds and a pure predicate over summaries.
//! * [`Candidate`] – A selected summary, enriched with a period once estimated.
//!
//! ## Selection rules
//! -----------------
//! A summary passes when **all** of the following hold (every bound is inclusive):
//!
//! | quantity                     | default        |
//! |------------------------------|----------------|
//! | `σ / F̄`                      | `[0.25, 1.25]` |
//! | AB magnitude of `F̄`          | `[18, 23]`     |
//! | `N`                          | `≥ 30`         |
//! | variability `V`              | `≥ 20`         |
//! | separation from cone center  | `≤ radius` (only when a cone is set) |
//!
//! Non-finite statistics and non-positive mean fluxes never pass. Loosening any single
//! threshold can only add objects to the selection.
pub mod summary;

use std::{cmp::Ordering, collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};

pub use summary::{angular_separation, stetson_j, ObjectSummary};

use crate::{
    constants::{
        Degree, DEFAULT_HI_RATIO, DEFAULT_LO_RATIO, DEFAULT_MAX_MAGNITUDE, DEFAULT_MIN_COUNT,
        DEFAULT_MIN_MAGNITUDE, DEFAULT_MIN_VARIABILITY,
    },
    observations::Band,
    periodogram::multi_band::MultiBandPeriod,
    phase_fold::FoldedSeries,
    varstar_errors::VarStarError,
};

/// Circular sky region, all values in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SkyCone {
    pub ra: Degree,
    pub dec: Degree,
    pub radius: Degree,
}

impl SkyCone {
    pub fn new(ra: Degree, dec: Degree, radius: Degree) -> Self {
        SkyCone { ra, dec, radius }
    }

    /// True if `(ra, dec)` lies inside the cone, boundary included.
    pub fn contains(&self, ra: Degree, dec: Degree) -> bool {
        angular_separation(self.ra, self.dec, ra, dec) <= self.radius
    }
}

/// Thresholds of the candidate selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CandidateFilter {
    /// Lowest accepted `σ / F̄`.
    pub lo_ratio: f64,
    /// Highest accepted `σ / F̄`.
    pub hi_ratio: f64,
    /// Brightest accepted mean magnitude.
    pub min_magnitude: f64,
    /// Faintest accepted mean magnitude.
    pub max_magnitude: f64,
    pub min_count: u32,
    pub min_variability: f64,
    /// Optional positional constraint.
    pub cone: Option<SkyCone>,
}

impl Default for CandidateFilter {
    fn default() -> Self {
        CandidateFilter {
            lo_ratio: DEFAULT_LO_RATIO,
            hi_ratio: DEFAULT_HI_RATIO,
            min_magnitude: DEFAULT_MIN_MAGNITUDE,
            max_magnitude: DEFAULT_MAX_MAGNITUDE,
            min_count: DEFAULT_MIN_COUNT,
            min_variability: DEFAULT_MIN_VARIABILITY,
            cone: None,
        }
    }
}

impl CandidateFilter {
    pub fn builder() -> CandidateFilterBuilder {
        CandidateFilterBuilder::new()
    }

    /// Decide whether a single summary passes every threshold.
    pub fn accepts(&self, summary: &ObjectSummary) -> bool {
        let stats_finite = [
            summary.flux_mean,
            summary.flux_sigma,
            summary.variability,
            summary.ra,
            summary.dec,
        ]
        .iter()
        .all(|v| v.is_finite());
        if !stats_finite || summary.flux_mean <= 0.0 {
            return false;
        }

        let ratio = summary.scatter_ratio();
        let Some(mag) = summary.magnitude() else {
            return false;
        };

        ratio >= self.lo_ratio
            && ratio <= self.hi_ratio
            && mag >= self.min_magnitude
            && mag <= self.max_magnitude
            && summary.n_sources >= self.min_count
            && summary.variability >= self.min_variability
            && self
                .cone
                .map_or(true, |c| c.contains(summary.ra, summary.dec))
    }

    /// Keep the summaries that pass the filter, in input order.
    pub fn select(&self, summaries: &[ObjectSummary]) -> Vec<Candidate> {
        summaries
            .iter()
            .filter(|s| self.accepts(s))
            .cloned()
            .map(Candidate::new)
            .collect()
    }
}

impl fmt::Display for CandidateFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cone = self.cone.map_or("none".to_string(), |c| {
            format!("({:.5}, {:.5}) r={:.5} deg", c.ra, c.dec, c.radius)
        });
        if f.alternate() {
            writeln!(f, "Candidate Filter")?;
            writeln!(f, "----------------")?;
            writeln!(f, "  scatter ratio   = [{}, {}]  # sigma / mean flux", self.lo_ratio, self.hi_ratio)?;
            writeln!(f, "  magnitude       = [{}, {}]  # AB", self.min_magnitude, self.max_magnitude)?;
            writeln!(f, "  min_count       = {}", self.min_count)?;
            writeln!(f, "  min_variability = {}", self.min_variability)?;
            write!(f, "  cone            = {cone}")
        } else {
            write!(
                f,
                "ratio=[{}, {}] mag=[{}, {}] N>={} V>={} cone={}",
                self.lo_ratio,
                self.hi_ratio,
                self.min_magnitude,
                self.max_magnitude,
                self.min_count,
                self.min_variability,
                cone
            )
        }
    }
}

/// Builder for [`CandidateFilter`], with validation.
#[derive(Debug, Clone, Default)]
pub struct CandidateFilterBuilder {
    filter: CandidateFilter,
}

impl CandidateFilterBuilder {
    pub fn new() -> Self {
        Self {
            filter: CandidateFilter::default(),
        }
    }

    pub fn scatter_ratio(mut self, lo: f64, hi: f64) -> Self {
        self.filter.lo_ratio = lo;
        self.filter.hi_ratio = hi;
        self
    }
    pub fn magnitude_range(mut self, min: f64, max: f64) -> Self {
        self.filter.min_magnitude = min;
        self.filter.max_magnitude = max;
        self
    }
    pub fn min_count(mut self, v: u32) -> Self {
        self.filter.min_count = v;
        self
    }
    pub fn min_variability(mut self, v: f64) -> Self {
        self.filter.min_variability = v;
        self
    }
    /// Restrict the selection to a cone around `(ra, dec)`.
    pub fn cone(mut self, ra: Degree, dec: Degree, radius: Degree) -> Self {
        self.filter.cone = Some(SkyCone::new(ra, dec, radius));
        self
    }

    /// Return true iff a <= b and comparable.
    #[inline]
    fn le(a: f64, b: f64) -> bool {
        matches!(a.partial_cmp(&b), Some(Ordering::Less | Ordering::Equal))
    }

    /// Finalize the builder.
    ///
    /// Validation rules
    /// -----------------
    /// * `0 ≤ lo_ratio ≤ hi_ratio`, both finite.
    /// * `min_magnitude ≤ max_magnitude`, both finite.
    /// * `min_variability` is finite.
    /// * cone: `ra` finite, `dec ∈ [-90, 90]`, `radius ∈ [0, 180]`.
    pub fn build(self) -> Result<CandidateFilter, VarStarError> {
        let c = &self.filter;
        let invalid = |msg: &str| Err(VarStarError::InvalidParameter(msg.to_string()));

        if !(c.lo_ratio.is_finite() && c.hi_ratio.is_finite())
            || !Self::le(0.0, c.lo_ratio)
            || !Self::le(c.lo_ratio, c.hi_ratio)
        {
            return invalid("require 0 <= lo_ratio <= hi_ratio");
        }
        if !(c.min_magnitude.is_finite() && c.max_magnitude.is_finite())
            || !Self::le(c.min_magnitude, c.max_magnitude)
        {
            return invalid("require min_magnitude <= max_magnitude");
        }
        if !c.min_variability.is_finite() {
            return invalid("min_variability must be finite");
        }
        if let Some(cone) = c.cone {
            if !cone.ra.is_finite() || !Self::le(-90.0, cone.dec) || !Self::le(cone.dec, 90.0) {
                return invalid("cone center out of range");
            }
            if !Self::le(0.0, cone.radius) || !Self::le(cone.radius, 180.0) {
                return invalid("cone radius must lie in [0, 180] degrees");
            }
        }
        Ok(self.filter)
    }
}

/// A selected object, enriched with its period once estimated.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub summary: ObjectSummary,
    /// Consensus period in days.
    pub period: Option<f64>,
    /// Best period of each band that produced an estimate.
    pub band_periods: BTreeMap<Band, f64>,
    pub folded: BTreeMap<Band, FoldedSeries>,
}

impl Candidate {
    pub fn new(summary: ObjectSummary) -> Self {
        Candidate {
            summary,
            period: None,
            band_periods: BTreeMap::new(),
            folded: BTreeMap::new(),
        }
    }

    /// Record the outcome of a multi-band period search.
    pub fn with_period(mut self, estimate: &MultiBandPeriod) -> Self {
        self.period = Some(estimate.consensus_period);
        self.band_periods = estimate
            .estimates()
            .map(|(band, e)| (band, e.best_period))
            .collect();
        self
    }

    /// Attach phase-folded views for display.
    pub fn with_folded(mut self, folded: BTreeMap<Band, FoldedSeries>) -> Self {
        self.folded = folded;
        self
    }
}

#[cfg(test)]
mod candidates_test {
    use super::*;
    use crate::constants::ab_mag_to_njy;

    fn summary(ratio: f64, mag: f64, n: u32, v: f64) -> ObjectSummary {
        let flux = ab_mag_to_njy(mag);
        ObjectSummary {
            object_id: 1,
            ra: 62.0,
            dec: -37.0,
            n_sources: n,
            flux_mean: flux,
            flux_sigma: ratio * flux,
            variability: v,
        }
    }

    #[test]
    fn test_default_selection() {
        let filter = CandidateFilter::builder().cone(62.0, -37.0, 0.5).build().unwrap();
        assert!(filter.accepts(&summary(0.5, 19.0, 40, 25.0)));
        assert!(!filter.accepts(&summary(0.5, 19.0, 10, 25.0)));
    }

    #[test]
    fn test_bounds_inclusive() {
        let filter = CandidateFilter::default();
        assert!(filter.accepts(&summary(0.5, 19.0, 30, 20.0)));
        assert!(filter.accepts(&summary(0.25, 19.0, 40, 25.0)));
        let mut upper = summary(1.0, 19.0, 40, 25.0);
        upper.flux_mean = 80_000.0;
        upper.flux_sigma = 100_000.0;
        assert!(filter.accepts(&upper));
        assert!(!filter.accepts(&summary(1.3, 19.0, 40, 25.0)));
        assert!(!filter.accepts(&summary(0.5, 17.5, 40, 25.0)));
        assert!(!filter.accepts(&summary(0.5, 23.5, 40, 25.0)));
        assert!(!filter.accepts(&summary(0.5, 19.0, 40, 19.99)));
    }

    #[test]
    fn test_degenerate_rows_rejected() {
        let filter = CandidateFilter::default();
        let mut s = summary(0.5, 19.0, 40, 25.0);
        s.flux_mean = -s.flux_mean;
        assert!(!filter.accepts(&s));

        let mut s = summary(0.5, 19.0, 40, 25.0);
        s.variability = f64::NAN;
        assert!(!filter.accepts(&s));

        let mut s = summary(0.5, 19.0, 40, 25.0);
        s.flux_sigma = f64::INFINITY;
        assert!(!filter.accepts(&s));
    }

    #[test]
    fn test_cone() {
        let filter = CandidateFilter::builder().cone(62.0, -37.0, 1.0).build().unwrap();
        let mut far = summary(0.5, 19.0, 40, 25.0);
        far.dec = -35.0;
        assert!(!filter.accepts(&far));
        assert!(CandidateFilter::default().accepts(&far));
    }

    #[test]
    fn test_select_keeps_order() {
        let mut rows: Vec<ObjectSummary> = (0..5).map(|_| summary(0.5, 20.0, 40, 25.0)).collect();
        for (i, r) in rows.iter_mut().enumerate() {
            r.object_id = 10 - i as u64;
        }
        rows[2].n_sources = 3;

        let ids: Vec<u64> = CandidateFilter::default()
            .select(&rows)
            .iter()
            .map(|c| c.summary.object_id)
            .collect();
        assert_eq!(ids, vec![10, 9, 7, 6]);
    }

    #[test]
    fn test_builder_validation() {
        assert!(CandidateFilter::builder().scatter_ratio(1.0, 0.5).build().is_err());
        assert!(CandidateFilter::builder().scatter_ratio(-0.1, 0.5).build().is_err());
        assert!(CandidateFilter::builder().magnitude_range(24.0, 18.0).build().is_err());
        assert!(CandidateFilter::builder().min_variability(f64::NAN).build().is_err());
        assert!(CandidateFilter::builder().cone(0.0, 95.0, 1.0).build().is_err());
        assert!(CandidateFilter::builder().cone(0.0, 0.0, -1.0).build().is_err());
        assert_eq!(
            CandidateFilter::builder().build().unwrap(),
            CandidateFilter::default()
        );
    }

    #[test]
    fn test_display() {
        let filter = CandidateFilter::default();
        assert_eq!(
            filter.to_string(),
            "ratio=[0.25, 1.25] mag=[18, 23] N>=30 V>=20 cone=none"
        );
        let pretty = format!("{filter:#}");
        assert!(pretty.starts_with("Candidate Filter\n"));
        assert!(pretty.contains("min_count       = 30"));
    }
}
