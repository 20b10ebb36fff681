//! HTTP client for the time machine history API.
//!
//! One request is issued per category, all of them concurrently, and the
//! result arrays are concatenated in URL order.

pub mod error;
mod guard;

use std::future::Future;

use futures::future::join_all;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use timemachine_core::{
    shuffle_incidents, BrokenImageReport, HistoryQuery, HistoryResponse, Incident, SourceSet,
    Tile, TimeMachineConfig,
};

pub use error::{ApiError, Result};
pub use guard::{FetchGuard, InFlight};

/// Path (relative to the API root) that receives broken image reports.
pub const BROKEN_IMAGE_PATH: &str = "/report/broken-image";

/// Anything that can turn one history URL into its list of incidents.
pub trait IncidentSource {
    fn fetch_page(&self, url: &str) -> impl Future<Output = Result<Vec<Incident>>>;
}

/// Combined result of one history fetch.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HistoryBatch {
    pub incidents: Vec<Incident>,
    pub sources: SourceSet,
}

impl HistoryBatch {
    pub fn new(incidents: Vec<Incident>) -> Self {
        let sources = SourceSet::from_incidents(&incidents);
        Self { incidents, sources }
    }

    pub fn tiles(&self, config: &TimeMachineConfig) -> Vec<Tile> {
        self.incidents
            .iter()
            .map(|incident| Tile::from_incident(incident, config))
            .collect()
    }

    pub fn attribution(&self) -> Option<String> {
        self.sources.attribution()
    }
}

/// Issue every URL at once and concatenate the pages in URL order.
///
/// The first failing URL (in URL order) fails the whole fetch.
pub async fn fetch_all<S: IncidentSource>(source: &S, urls: &[String]) -> Result<Vec<Incident>> {
    let pages = join_all(urls.iter().map(|url| source.fetch_page(url))).await;

    let mut incidents = Vec::new();
    for page in pages {
        incidents.extend(page?);
    }
    Ok(incidents)
}

/// Decode a response body into its incidents.
pub fn parse_results_str(body: &str) -> Result<Vec<Incident>> {
    let response: HistoryResponse = serde_json::from_str(body)?;
    Ok(response.results)
}

/// Decode an already-parsed response body into its incidents.
pub fn parse_results_value(body: &Value) -> Result<Vec<Incident>> {
    let response = HistoryResponse::deserialize(body)?;
    Ok(response.results)
}

/// Fetch orchestration over any [`IncidentSource`].
pub struct HistoryFetcher<S> {
    source: S,
    config: TimeMachineConfig,
    guard: FetchGuard,
}

impl<S: IncidentSource> HistoryFetcher<S> {
    pub fn with_source(source: S, config: TimeMachineConfig) -> Self {
        Self {
            source,
            config,
            guard: FetchGuard::default(),
        }
    }

    pub fn config(&self) -> &TimeMachineConfig {
        &self.config
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn is_loading(&self) -> bool {
        self.guard.is_in_flight()
    }

    /// Fetch every category of `query`.
    ///
    /// Returns `Ok(None)` without doing anything when a previous fetch on
    /// this fetcher is still in flight.
    pub async fn fetch_history<R: Rng + ?Sized>(
        &self,
        query: &HistoryQuery,
        rng: &mut R,
    ) -> Result<Option<HistoryBatch>> {
        let Some(_in_flight) = self.guard.try_begin() else {
            tracing::debug!("History fetch already in flight, ignoring request");
            return Ok(None);
        };

        let urls = query.urls(&self.config);
        tracing::info!(
            urls = urls.len(),
            country = %query.country,
            "Fetching history"
        );

        let mut incidents = fetch_all(&self.source, &urls).await?;
        if self.config.shuffle {
            shuffle_incidents(&mut incidents, rng);
        }

        let batch = HistoryBatch::new(incidents);
        tracing::info!(
            incidents = batch.incidents.len(),
            sources = batch.sources.len(),
            "History fetched"
        );
        Ok(Some(batch))
    }
}

/// [`IncidentSource`] backed by `reqwest`.
#[derive(Debug, Clone, Default)]
pub struct HttpSource {
    http: reqwest::Client,
}

impl HttpSource {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    async fn get_page(&self, url: &str) -> Result<Vec<Incident>> {
        tracing::debug!(url, "GET history page");
        let resp = self.http.get(url).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                url: url.to_string(),
                status: status.as_u16(),
                message: body,
            });
        }

        let body = resp.text().await?;
        parse_results_str(&body)
    }
}

impl IncidentSource for HttpSource {
    fn fetch_page(&self, url: &str) -> impl Future<Output = Result<Vec<Incident>>> {
        self.get_page(url)
    }
}

/// History fetcher talking to the real API.
pub type HistoryClient = HistoryFetcher<HttpSource>;

impl HistoryFetcher<HttpSource> {
    pub fn new(config: TimeMachineConfig) -> Self {
        Self::with_source(HttpSource::default(), config)
    }

    pub fn report_url(&self) -> String {
        format!("{}{BROKEN_IMAGE_PATH}", self.config.api_base())
    }

    /// POST a broken image report. Failures are logged and returned, the
    /// caller decides whether to care.
    pub async fn report_broken_image(&self, report: &BrokenImageReport) -> Result<()> {
        let url = self.report_url();
        let resp = self
            .source
            .http
            .post(&url)
            .json(report)
            .send()
            .await
            .inspect_err(|err| tracing::warn!(%err, src = %report.src, "Broken image report failed"))?;

        let status = resp.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), src = %report.src, "Broken image report rejected");
            let body = resp.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                url,
                status: status.as_u16(),
                message: body,
            });
        }

        tracing::debug!(src = %report.src, "Broken image reported");
        Ok(())
    }
}
