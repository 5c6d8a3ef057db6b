//! Local fixture store implementing [`CatalogService`].
//!
//! Tables are held in memory. They can be filled programmatically or loaded from two CSV files
//! whose headers match the serde field names of [`Observation`] and [`ObjectSummary`]:
//!
//! ```text
//! object_id,time,band,flux,flux_error,magnitude
//! 1234,60200.1234,g,15320.5,210.3,
//! ```
//!
//! ```text
//! object_id,ra,dec,n_sources,flux_mean,flux_sigma,variability
//! 1234,62.01,-37.02,48,15100.0,6200.0,31.7
//! ```
use std::fs::File;

use ahash::RandomState;
use camino::Utf8Path;
use log::info;

use super::{read_table, CatalogService};
use crate::{
    candidates::{CandidateFilter, ObjectSummary},
    constants::{LightCurveSet, ObjectId},
    observations::{band_series::group_by_object, Observation},
    varstar_errors::VarStarError,
};

/// In-memory catalog.
#[derive(Debug, Clone, Default)]
pub struct FixtureCatalog {
    observations: LightCurveSet,
    summaries: Vec<ObjectSummary>,
}

impl FixtureCatalog {
    pub fn new() -> Self {
        FixtureCatalog {
            observations: LightCurveSet::with_hasher(RandomState::default()),
            summaries: Vec::new(),
        }
    }

    /// Build a catalog from flat tables.
    pub fn from_tables(observations: Vec<Observation>, summaries: Vec<ObjectSummary>) -> Self {
        FixtureCatalog {
            observations: group_by_object(observations),
            summaries,
        }
    }

    /// Load both tables from CSV files.
    ///
    /// Arguments
    /// -----------------
    /// * `observations_path`: CSV with one row per [`Observation`].
    /// * `summaries_path`: CSV with one row per [`ObjectSummary`].
    ///
    /// Errors
    /// ----------
    /// * [`VarStarError::IoError`] or [`VarStarError::CsvError`] on unreadable or malformed files.
    pub fn from_csv(
        observations_path: &Utf8Path,
        summaries_path: &Utf8Path,
    ) -> Result<Self, VarStarError> {
        let observations: Vec<Observation> = read_csv(observations_path)?;
        let summaries: Vec<ObjectSummary> = read_csv(summaries_path)?;
        info!(
            "loaded {} observation(s) and {} summary row(s) from {observations_path} and {summaries_path}",
            observations.len(),
            summaries.len()
        );
        Ok(Self::from_tables(observations, summaries))
    }

    /// Append observations, keeping existing ones.
    pub fn add_observations(&mut self, observations: impl IntoIterator<Item = Observation>) {
        for obs in observations {
            self.observations.entry(obs.object_id).or_default().push(obs);
        }
    }

    pub fn add_summary(&mut self, summary: ObjectSummary) {
        self.summaries.push(summary);
    }

    pub fn summaries(&self) -> &[ObjectSummary] {
        &self.summaries
    }

    pub fn light_curves(&self) -> &LightCurveSet {
        &self.observations
    }
}

fn read_csv<T: serde::de::DeserializeOwned>(path: &Utf8Path) -> Result<Vec<T>, VarStarError> {
    read_table(File::open(path)?)
}

impl CatalogService for FixtureCatalog {
    fn fetch_observations(&self, object_id: ObjectId) -> Result<Vec<Observation>, VarStarError> {
        Ok(self
            .observations
            .get(&object_id)
            .cloned()
            .unwrap_or_default())
    }

    fn fetch_candidates(
        &self,
        filter: &CandidateFilter,
    ) -> Result<Vec<ObjectSummary>, VarStarError> {
        Ok(self
            .summaries
            .iter()
            .filter(|s| filter.accepts(s))
            .cloned()
            .collect())
    }
}
