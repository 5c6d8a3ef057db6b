//! TAP synchronous client implementing [`CatalogService`] (feature `tap-client`).
//!
//! Queries are built with [`AdqlQueryBuilder`] and posted to `{base_url}/sync` with
//! `REQUEST=doQuery`, `LANG=ADQL` and `FORMAT=csv`. The request runs on a private `tokio`
//! runtime so that the [`CatalogService`] methods stay synchronous.
//!
//! A [`TapCatalog`] must be used from plain threads: queries issued from inside an async
//! runtime fail with [`VarStarError::CatalogService`]. Async callers should wrap the calls in
//! `tokio::task::spawn_blocking`.
use std::{fmt, time::Duration};

use log::debug;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tokio::runtime::{Handle, Runtime};

use super::{
    adql::{AdqlQueryBuilder, TimeWindow},
    read_table, CatalogService,
};
use crate::{
    candidates::{CandidateFilter, ObjectSummary},
    constants::ObjectId,
    observations::Observation,
    varstar_errors::VarStarError,
};

/// Connection settings of a TAP service.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct TapConfig {
    /// Service root, without the trailing `/sync`.
    pub base_url: String,
    /// Catalog schema holding the object and forced-source tables.
    pub schema: String,
    /// Bearer token sent in the `Authorization` header.
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_timeout() -> u64 {
    120
}

impl TapConfig {
    pub fn new(base_url: impl Into<String>, schema: impl Into<String>) -> Self {
        TapConfig {
            base_url: base_url.into(),
            schema: schema.into(),
            token: None,
            timeout_secs: default_timeout(),
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// URL of the synchronous query endpoint.
    pub fn sync_url(&self) -> String {
        format!("{}/sync", self.base_url.trim_end_matches('/'))
    }
}

impl fmt::Debug for TapConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TapConfig")
            .field("base_url", &self.base_url)
            .field("schema", &self.schema)
            .field("token", &self.token.as_ref().map(|_| "***"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl fmt::Display for TapConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let auth = if self.token.is_some() { "bearer" } else { "none" };
        if f.alternate() {
            writeln!(f, "TAP Service")?;
            writeln!(f, "-----------")?;
            writeln!(f, "  endpoint = {}", self.sync_url())?;
            writeln!(f, "  schema   = {}", self.schema)?;
            writeln!(f, "  auth     = {auth}")?;
            write!(f, "  timeout  = {} s", self.timeout_secs)
        } else {
            write!(f, "{} ({}, auth={auth})", self.sync_url(), self.schema)
        }
    }
}

/// Catalog backed by a remote TAP service.
///
/// Owns its own runtime; do not query (or drop) it from within another async runtime.
#[derive(Debug)]
pub struct TapCatalog {
    config: TapConfig,
    queries: AdqlQueryBuilder,
    window: Option<TimeWindow>,
    client: reqwest::Client,
    runtime: Runtime,
}

fn service_error(context: &str, err: impl fmt::Display) -> VarStarError {
    VarStarError::CatalogService(format!("{context}: {err}"))
}

impl TapCatalog {
    /// Errors
    /// ----------
    /// * [`VarStarError::InvalidIdentifier`] for an invalid schema name.
    /// * [`VarStarError::CatalogService`] if the HTTP client or the runtime cannot be created.
    pub fn new(config: TapConfig) -> Result<Self, VarStarError> {
        let queries = AdqlQueryBuilder::new(&config.schema)?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| service_error("cannot build HTTP client", e))?;
        let runtime = Runtime::new().map_err(|e| service_error("cannot start runtime", e))?;

        Ok(TapCatalog {
            config,
            queries,
            window: None,
            client,
            runtime,
        })
    }

    /// Restrict every light-curve query to `window`.
    pub fn with_time_window(mut self, window: TimeWindow) -> Self {
        self.window = Some(window);
        self
    }

    pub fn config(&self) -> &TapConfig {
        &self.config
    }

    pub fn queries(&self) -> &AdqlQueryBuilder {
        &self.queries
    }

    async fn post_query(&self, adql: &str) -> Result<String, VarStarError> {
        let mut request = self.client.post(self.config.sync_url()).form(&[
            ("REQUEST", "doQuery"),
            ("LANG", "ADQL"),
            ("FORMAT", "csv"),
            ("QUERY", adql),
        ]);
        if let Some(token) = &self.config.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| service_error("TAP request failed", e))?
            .error_for_status()
            .map_err(|e| service_error("TAP service returned an error", e))?;

        response
            .text()
            .await
            .map_err(|e| service_error("cannot read TAP response", e))
    }

    /// Run `adql` and deserialize the CSV result table.
    ///
    /// Errors
    /// ----------
    /// * [`VarStarError::CatalogService`] when called from inside an async runtime, or on any
    ///   transport or decoding failure.
    pub fn run_query<T: DeserializeOwned>(&self, adql: &str) -> Result<Vec<T>, VarStarError> {
        if Handle::try_current().is_ok() {
            return Err(VarStarError::CatalogService(
                "TapCatalog cannot block inside an async runtime, use spawn_blocking".into(),
            ));
        }
        debug!("TAP query: {adql}");
        let body = self.runtime.block_on(self.post_query(adql))?;
        parse_response(&body)
    }
}

/// Parse a CSV result table; decoding failures are service errors.
fn parse_response<T: DeserializeOwned>(body: &str) -> Result<Vec<T>, VarStarError> {
    read_table(body.as_bytes()).map_err(|e| service_error("cannot decode TAP response", e))
}

impl CatalogService for TapCatalog {
    fn fetch_observations(&self, object_id: ObjectId) -> Result<Vec<Observation>, VarStarError> {
        let query = self
            .queries
            .observations_query(object_id, self.window.as_ref());
        self.run_query(&query)
    }

    fn fetch_candidates(
        &self,
        filter: &CandidateFilter,
    ) -> Result<Vec<ObjectSummary>, VarStarError> {
        self.run_query(&self.queries.candidates_query(filter))
    }
}

#[cfg(test)]
mod tap_test {
    use super::*;
    use crate::observations::Band;

    #[test]
    fn test_config_display() {
        let config = TapConfig::new("https://data.example.org/api/tap/", "dp02_dc2_catalogs")
            .with_token("secret");
        assert_eq!(config.sync_url(), "https://data.example.org/api/tap/sync");
        assert_eq!(
            config.to_string(),
            "https://data.example.org/api/tap/sync (dp02_dc2_catalogs, auth=bearer)"
        );
        assert!(format!("{config:#}").contains("timeout  = 120 s"));
        assert!(!format!("{config:?}").contains("secret"));
    }

    #[test]
    fn test_invalid_schema() {
        let err = TapCatalog::new(TapConfig::new("http://localhost", "bad schema")).unwrap_err();
        assert_eq!(err, VarStarError::InvalidIdentifier("bad schema".into()));
    }

    #[test]
    fn test_query_inside_runtime_is_rejected() {
        let catalog = TapCatalog::new(TapConfig::new("http://127.0.0.1:9", "dp02")).unwrap();
        let outer = Runtime::new().unwrap();

        let err = outer
            .block_on(async { catalog.run_query::<Observation>("SELECT 1") })
            .unwrap_err();
        assert_eq!(
            err,
            VarStarError::CatalogService(
                "TapCatalog cannot block inside an async runtime, use spawn_blocking".into()
            )
        );

        let err = outer
            .block_on(async { catalog.fetch_observations(42) })
            .unwrap_err();
        assert!(matches!(err, VarStarError::CatalogService(_)));
    }

    #[test]
    fn test_parse_response() {
        let body = "object_id,time,band,flux,flux_error\n\
                    42,60001.25,i,2100.5,31.0\n\
                    42,60002.5,z,,\n";
        let rows: Vec<Observation> = parse_response(body).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].band, Band::I);
        assert_eq!(rows[1].flux, None);
        assert_eq!(rows[1].magnitude, None);

        let summaries: Vec<ObjectSummary> = parse_response(
            "object_id,ra,decl,n_sources,flux_mean,flux_sigma,variability\n\
             42,62.0,-37.0,35,1000.0,400.0,22.0\n",
        )
        .unwrap();
        assert_eq!(summaries[0].dec, -37.0);

        let err = parse_response::<Observation>("object_id,time,band\nabc,1,g\n").unwrap_err();
        assert!(matches!(err, VarStarError::CatalogService(_)));
    }
}
