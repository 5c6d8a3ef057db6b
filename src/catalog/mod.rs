//! # Catalog access
//!
//! The analysis core never talks to an archive directly: every table it needs comes through an
//! implementation of [`CatalogService`], injected by the caller.
//!
//! ## Implementations
//! -----------------
//! * [`fixture_store::FixtureCatalog`] – In-memory tables, optionally loaded from CSV files.
//!   Used by the tests and for offline work.
//! * `tap::TapCatalog` – Synchronous TAP/ADQL client over HTTP (feature `tap-client`).
//!
//! The queries sent to a TAP service are produced by [`adql`], available without any feature.
//!
//! ## Contract
//! -----------------
//! * Results are complete, materialized tables; no streaming and no retries.
//! * An unknown object yields an empty observation table, not an error.
//! * Connectivity or decoding failures surface as [`VarStarError::CatalogService`] (or the
//!   I/O and CSV variants for local files), never as analysis errors.
pub mod adql;
pub mod fixture_store;
#[cfg(feature = "tap-client")]
pub mod tap;

use std::io::Read;

use serde::de::DeserializeOwned;

use crate::{
    candidates::{CandidateFilter, ObjectSummary},
    constants::ObjectId,
    observations::Observation,
    varstar_errors::VarStarError,
};

/// Request/response boundary to a photometric catalog.
pub trait CatalogService {
    /// Every forced-photometry measurement of one object, in no particular order.
    fn fetch_observations(&self, object_id: ObjectId) -> Result<Vec<Observation>, VarStarError>;

    /// Summary rows of the objects matching `filter`.
    ///
    /// Implementations may evaluate the filter remotely; callers can re-apply
    /// [`CandidateFilter::accepts`] locally, the predicate is idempotent.
    fn fetch_candidates(&self, filter: &CandidateFilter)
        -> Result<Vec<ObjectSummary>, VarStarError>;
}

impl<T: CatalogService + ?Sized> CatalogService for &T {
    fn fetch_observations(&self, object_id: ObjectId) -> Result<Vec<Observation>, VarStarError> {
        (**self).fetch_observations(object_id)
    }

    fn fetch_candidates(
        &self,
        filter: &CandidateFilter,
    ) -> Result<Vec<ObjectSummary>, VarStarError> {
        (**self).fetch_candidates(filter)
    }
}

/// Deserialize every row of a CSV table with a header line.
pub(crate) fn read_table<T: DeserializeOwned, R: Read>(reader: R) -> Result<Vec<T>, VarStarError> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader)
        .deserialize()
        .map(|row| row.map_err(VarStarError::from))
        .collect()
}
