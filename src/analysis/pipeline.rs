//! End-to-end candidate search through a [`CatalogService`].
//!
//! 1. Fetch the summary rows matching a [`CandidateFilter`] and re-apply the filter locally.
//! 2. For every selected object, fetch its light curve and run [`analyze_object`].
//! 3. Attach the consensus period, per-band periods and folded views to the [`Candidate`].
//!
//! A failing object (catalog error or analysis error) is reported in
//! [`PipelineOutcome::failures`] and keeps an un-enriched entry in the candidate list.
use log::{info, warn};

use super::{analyze_object, AnalysisParams};
use crate::{
    candidates::{Candidate, CandidateFilter},
    catalog::CatalogService,
    constants::ObjectId,
    varstar_errors::VarStarError,
};

/// Candidates of a run and the objects that could not be analyzed.
#[derive(Debug, PartialEq)]
pub struct PipelineOutcome {
    /// Selected objects, in catalog order.
    pub candidates: Vec<Candidate>,
    pub failures: Vec<(ObjectId, VarStarError)>,
}

impl PipelineOutcome {
    /// Candidates that received a period.
    pub fn periodic(&self) -> impl Iterator<Item = &Candidate> {
        self.candidates.iter().filter(|c| c.period.is_some())
    }
}

/// Select candidates from `service` and estimate their periods.
///
/// Errors
/// ----------
/// * Only a failure of the candidate query itself aborts the run.
pub fn run_candidate_pipeline<S: CatalogService>(
    service: &S,
    filter: &CandidateFilter,
    params: &AnalysisParams,
) -> Result<PipelineOutcome, VarStarError> {
    let summaries = service.fetch_candidates(filter)?;
    let selected = filter.select(&summaries);
    info!(
        "{} candidate(s) selected out of {} catalog row(s)",
        selected.len(),
        summaries.len()
    );

    let mut failures = Vec::new();
    let candidates = selected
        .into_iter()
        .map(|candidate| {
            let id = candidate.summary.object_id;
            let analysis = service
                .fetch_observations(id)
                .and_then(|obs| analyze_object(id, &obs, params));
            match analysis {
                Ok(a) => candidate.with_period(&a.periods).with_folded(a.folded),
                Err(e) => {
                    warn!("candidate {id}: {e}");
                    failures.push((id, e));
                    candidate
                }
            }
        })
        .collect();

    Ok(PipelineOutcome {
        candidates,
        failures,
    })
}
