//! # ADQL query construction
//!
//! Build the two queries the pipeline sends to a TAP service:
//!
//! * the forced-photometry light curve of one object, joined with the visit table to obtain the
//!   exposure midpoint (MJD, TAI), optionally restricted to a time window;
//! * the candidate pre-selection over the object table, expressing a [`CandidateFilter`] on the
//!   per-band summary columns.
//!
//! Column aliases match the serde field names of [`Observation`](crate::observations::Observation)
//! and [`ObjectSummary`](crate::candidates::ObjectSummary), so a CSV response deserializes
//! directly into those types.
//!
//! Schema names are interpolated into the query text and are therefore validated against a
//! strict identifier pattern; numeric values are formatted by Rust.
use std::sync::LazyLock;

use hifitime::Epoch;
use regex::Regex;

use crate::{
    candidates::CandidateFilter, constants::ObjectId, observations::Band,
    varstar_errors::VarStarError,
};

static IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)?$")
        .expect("identifier pattern is a valid regex")
});

/// Check that `name` is a plain (optionally schema-qualified) ADQL identifier.
pub fn validate_identifier(name: &str) -> Result<&str, VarStarError> {
    if IDENTIFIER.is_match(name) {
        Ok(name)
    } else {
        Err(VarStarError::InvalidIdentifier(name.to_string()))
    }
}

/// Closed observation-time interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeWindow {
    pub start: Epoch,
    pub end: Epoch,
}

impl TimeWindow {
    /// Errors
    /// ----------
    /// * [`VarStarError::InvalidParameter`] if `end` precedes `start`.
    pub fn new(start: Epoch, end: Epoch) -> Result<Self, VarStarError> {
        if end < start {
            return Err(VarStarError::InvalidParameter(format!(
                "time window ends ({end}) before it starts ({start})"
            )));
        }
        Ok(TimeWindow { start, end })
    }

    /// Bounds as MJD in the TAI scale.
    pub fn mjd_tai(&self) -> (f64, f64) {
        (self.start.to_mjd_tai_days(), self.end.to_mjd_tai_days())
    }
}

/// Query builder bound to one catalog schema.
#[derive(Debug, Clone, PartialEq)]
pub struct AdqlQueryBuilder {
    schema: String,
    /// Band whose summary columns drive the candidate query.
    summary_band: Band,
}

impl AdqlQueryBuilder {
    /// Errors
    /// ----------
    /// * [`VarStarError::InvalidIdentifier`] if `schema` is not a plain identifier.
    pub fn new(schema: &str) -> Result<Self, VarStarError> {
        Ok(AdqlQueryBuilder {
            schema: validate_identifier(schema)?.to_string(),
            summary_band: Band::G,
        })
    }

    pub fn with_summary_band(mut self, band: Band) -> Self {
        self.summary_band = band;
        self
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    /// Forced-photometry light curve of `object_id`, ordered by time.
    pub fn observations_query(&self, object_id: ObjectId, window: Option<&TimeWindow>) -> String {
        let schema = &self.schema;
        let mut query = format!(
            "SELECT src.diaObjectId AS object_id, visin.expMidptMJD AS time, src.band AS band, \
             src.psfFlux AS flux, src.psfFluxErr AS flux_error \
             FROM {schema}.ForcedSourceOnDiaObject AS src \
             JOIN {schema}.CcdVisit AS visin ON visin.ccdVisitId = src.ccdVisitId \
             WHERE src.diaObjectId = {object_id}"
        );
        if let Some(w) = window {
            let (start, end) = w.mjd_tai();
            query.push_str(&format!(
                " AND visin.expMidptMJD BETWEEN {start:.6} AND {end:.6}"
            ));
        }
        query.push_str(" ORDER BY visin.expMidptMJD");
        query
    }

    /// Summary rows of the objects satisfying `filter`.
    pub fn candidates_query(&self, filter: &CandidateFilter) -> String {
        let schema = &self.schema;
        let b = self.summary_band.label();
        let mut clauses = Vec::with_capacity(5);

        if let Some(cone) = &filter.cone {
            clauses.push(format!(
                "CONTAINS(POINT('ICRS', ra, decl), CIRCLE('ICRS', {}, {}, {})) = 1",
                cone.ra, cone.dec, cone.radius
            ));
        }
        clauses.push(format!("{b}PSFluxNdata >= {}", filter.min_count));
        clauses.push(format!(
            "{b}PSFluxSigma / {b}PSFluxMean BETWEEN {} AND {}",
            filter.lo_ratio, filter.hi_ratio
        ));
        clauses.push(format!(
            "scisql_nanojanskyToAbMag({b}PSFluxMean) BETWEEN {} AND {}",
            filter.min_magnitude, filter.max_magnitude
        ));
        clauses.push(format!("{b}PSFluxStetsonJ >= {}", filter.min_variability));

        format!(
            "SELECT diaObjectId AS object_id, ra, decl, {b}PSFluxNdata AS n_sources, \
             {b}PSFluxMean AS flux_mean, {b}PSFluxSigma AS flux_sigma, \
             {b}PSFluxStetsonJ AS variability \
             FROM {schema}.DiaObject \
             WHERE {}",
            clauses.join(" AND ")
        )
    }
}
