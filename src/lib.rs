//! Period search and phase folding for periodic variable stars observed as irregularly
//! sampled, multi-band photometric time series.
//!
//! ```text
//! CatalogService ─► CandidateFilter ─► extract_band_series ─► estimate_multi_band ─► fold_bands
//! ```
pub mod analysis;
pub mod candidates;
pub mod catalog;
pub mod constants;
pub mod display;
pub mod observations;
pub mod periodogram;
pub mod phase_fold;
pub mod varstar_errors;

pub use analysis::{
    analyze_object,
    light_curve_fit::{FullAnalysisResult, LightCurveFit},
    pipeline::run_candidate_pipeline,
    AnalysisParams, ObjectAnalysis,
};
pub use candidates::{Candidate, CandidateFilter, ObjectSummary};
pub use catalog::{fixture_store::FixtureCatalog, CatalogService};
pub use constants::{LightCurveSet, ObjectId};
pub use observations::{
    band_series::{extract_band_series, Series},
    Band, Observation,
};
pub use periodogram::{
    estimate_period, lomb_scargle, multi_band::estimate_multi_band, PeriodSearchParams,
    Periodogram,
};
pub use phase_fold::{fold_bands, fold_series, phase, FoldedSeries};
pub use varstar_errors::VarStarError;
