mod common;

use std::fmt::Write as _;

use camino::Utf8PathBuf;

use common::{rng, sinusoid_observations, summary};
use varstar::analysis::pipeline::PipelineOutcome;
use varstar::catalog::adql::AdqlQueryBuilder;
use varstar::constants::ab_mag_to_njy;
use varstar::{
    run_candidate_pipeline, AnalysisParams, Band, CandidateFilter, CatalogService,
    FixtureCatalog, VarStarError,
};

#[test]
fn test_default_filter_selection() {
    let filter = CandidateFilter::default();

    let kept = summary(1, 0.5, 19.0, 40, 25.0);
    let too_few = summary(2, 0.5, 19.0, 10, 25.0);
    let too_bright = summary(3, 0.5, 17.5, 40, 25.0);
    let too_quiet = summary(4, 0.5, 19.0, 40, 5.0);
    let too_scattered = summary(5, 2.0, 19.0, 40, 25.0);

    assert!(filter.accepts(&kept));
    assert!(!filter.accepts(&too_few));
    assert!(!filter.accepts(&too_bright));
    assert!(!filter.accepts(&too_quiet));
    assert!(!filter.accepts(&too_scattered));

    let selected = filter.select(&[too_few, kept.clone(), too_bright, too_quiet, too_scattered]);
    assert_eq!(selected.len(), 1);
    assert_eq!(selected[0].summary, kept);
    assert_eq!(selected[0].period, None);
}

#[test]
fn test_cone_restriction() {
    let inside = CandidateFilter::builder().cone(62.0, -37.0, 0.5).build().unwrap();
    let elsewhere = CandidateFilter::builder().cone(150.0, 2.0, 0.5).build().unwrap();
    let row = summary(1, 0.5, 19.0, 40, 25.0);

    assert!(inside.accepts(&row));
    assert!(!elsewhere.accepts(&row));
}

#[test]
fn test_candidates_query_follows_filter() {
    let filter = CandidateFilter::builder()
        .min_count(50)
        .magnitude_range(17.0, 22.0)
        .cone(62.0, -37.0, 1.5)
        .build()
        .unwrap();
    let q = AdqlQueryBuilder::new("dp02_dc2_catalogs")
        .unwrap()
        .candidates_query(&filter);

    assert!(q.contains("FROM dp02_dc2_catalogs.DiaObject"));
    assert!(q.contains("CIRCLE('ICRS', 62, -37, 1.5)"));
    assert!(q.contains("gPSFluxNdata >= 50"));
    assert!(q.contains("scisql_nanojanskyToAbMag(gPSFluxMean) BETWEEN 17 AND 22"));
}

fn write_fixture(dir: &tempfile::TempDir) -> (Utf8PathBuf, Utf8PathBuf) {
    let mut rng = rng(11);
    let mut obs_csv = String::from("object_id,time,band,flux,flux_error,magnitude\n");
    for band in [Band::G, Band::R] {
        for o in sinusoid_observations(&mut rng, 1234, band, 50, 30.0, 0.3, 0.4, 0.0) {
            let mag = o.magnitude.unwrap_or(20.0);
            let flux = ab_mag_to_njy(mag);
            let band = band.label();
            writeln!(obs_csv, "1234,{},{band},{flux},{},", o.time, 0.02 * flux).unwrap();
        }
    }
    // bright enough but only two points
    writeln!(obs_csv, "777,60001.0,g,5000.0,50.0,").unwrap();
    writeln!(obs_csv, "777,60002.0,g,5100.0,50.0,").unwrap();

    let flux = ab_mag_to_njy(20.0);
    let summaries_csv = format!(
        "object_id,ra,decl,n_sources,flux_mean,flux_sigma,variability\n\
         1234,62.01,-37.02,100,{flux},{},31.7\n\
         777,62.2,-36.9,35,{flux},{},22.0\n\
         4242,62.1,-37.1,12,{flux},{},40.0\n",
        0.4 * flux,
        0.6 * flux,
        0.6 * flux
    );

    let obs_path = Utf8PathBuf::try_from(dir.path().join("observations.csv")).unwrap();
    let sum_path = Utf8PathBuf::try_from(dir.path().join("summaries.csv")).unwrap();
    std::fs::write(&obs_path, obs_csv).unwrap();
    std::fs::write(&sum_path, summaries_csv).unwrap();
    (obs_path, sum_path)
}

#[test]
fn test_pipeline_from_csv_fixture() {
    let dir = tempfile::tempdir().unwrap();
    let (obs_path, sum_path) = write_fixture(&dir);
    let catalog = FixtureCatalog::from_csv(&obs_path, &sum_path).unwrap();

    assert_eq!(catalog.summaries().len(), 3);
    assert_eq!(catalog.fetch_observations(1234).unwrap().len(), 100);
    assert!(catalog.fetch_observations(1).unwrap().is_empty());

    let PipelineOutcome {
        candidates,
        failures,
    } = run_candidate_pipeline(&catalog, &CandidateFilter::default(), &AnalysisParams::default())
        .unwrap();

    assert_eq!(
        candidates.iter().map(|c| c.summary.object_id).collect::<Vec<_>>(),
        vec![1234, 777]
    );

    let periodic = &candidates[0];
    let period = periodic.period.unwrap();
    assert!((period - 0.3).abs() < 0.003, "period = {period}");
    assert_eq!(
        periodic.band_periods.keys().copied().collect::<Vec<_>>(),
        vec![Band::G, Band::R]
    );
    let folded_g = &periodic.folded[&Band::G];
    assert_eq!(folded_g.len(), 50);
    assert!(folded_g.phases().iter().all(|p| (0.0..1.0).contains(p)));

    // two flat points are enough for a periodogram, so 777 either gets a period or fails
    // with an analysis error
    for (id, err) in &failures {
        assert_eq!(*id, 777);
        assert!(err.is_analysis_error());
    }
}

#[test]
fn test_malformed_csv_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let obs_path = Utf8PathBuf::try_from(dir.path().join("obs.csv")).unwrap();
    let sum_path = Utf8PathBuf::try_from(dir.path().join("sum.csv")).unwrap();
    std::fs::write(&obs_path, "object_id,time,band\n1,not-a-time,g\n").unwrap();
    std::fs::write(&sum_path, "object_id,ra,dec,n_sources,flux_mean,flux_sigma,variability\n").unwrap();

    assert!(matches!(
        FixtureCatalog::from_csv(&obs_path, &sum_path),
        Err(VarStarError::CsvError(_))
    ));

    let missing = Utf8PathBuf::try_from(dir.path().join("missing.csv")).unwrap();
    assert!(matches!(
        FixtureCatalog::from_csv(&missing, &sum_path),
        Err(VarStarError::IoError(_))
    ));
}
