use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use rand::rngs::SmallRng;
use rand::SeedableRng;
use timemachine_api::{fetch_all, ApiError, HistoryClient, HistoryFetcher, IncidentSource, Result};
use timemachine_core::{BrokenImageReport, HistoryParams, HistoryQuery, Incident, TimeMachineConfig};

/// In-memory source: each URL answers after its own delay.
#[derive(Default)]
struct FakeSource {
    pages: HashMap<String, (u64, Option<Vec<Incident>>)>,
    active: AtomicUsize,
    peak: AtomicUsize,
    calls: AtomicUsize,
}

impl FakeSource {
    fn page(mut self, url: &str, delay_ms: u64, ids: &[&str]) -> Self {
        let incidents = ids.iter().map(|id| incident(id)).collect();
        self.pages.insert(url.to_string(), (delay_ms, Some(incidents)));
        self
    }

    fn failing(mut self, url: &str, delay_ms: u64) -> Self {
        self.pages.insert(url.to_string(), (delay_ms, None));
        self
    }
}

impl IncidentSource for FakeSource {
    async fn fetch_page(&self, url: &str) -> Result<Vec<Incident>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        let (delay, page) = self
            .pages
            .get(url)
            .cloned()
            .unwrap_or_else(|| panic!("unexpected url {url}"));
        tokio::time::sleep(Duration::from_millis(delay)).await;
        self.active.fetch_sub(1, Ordering::SeqCst);

        page.ok_or_else(|| ApiError::Status {
            url: url.to_string(),
            status: 503,
            message: "unavailable".into(),
        })
    }
}

fn incident(id: &str) -> Incident {
    Incident {
        id: Some(id.to_string()),
        source: Some(format!("src-{}", &id[..1])),
        ..Incident::default()
    }
}

fn ids(incidents: &[Incident]) -> Vec<&str> {
    incidents
        .iter()
        .map(|incident| incident.id.as_deref().unwrap())
        .collect()
}

fn day_query(categories: &str) -> HistoryQuery {
    HistoryQuery::from_params(&HistoryParams {
        country: Some("NL".into()),
        category: Some(categories.into()),
        date: Some("1969-07-20".into()),
        ..HistoryParams::default()
    })
    .unwrap()
}

fn url(category: &str) -> String {
    format!(
        "https://public.api.v0.tee-e.com/1969-07-20?country=NL&category={category}&emotion=&impact=&limit=20"
    )
}

#[tokio::test]
async fn pages_concatenate_in_url_order_even_when_late_urls_finish_first() {
    let source = FakeSource::default()
        .page("a", 30, &["a1", "a2"])
        .page("b", 1, &["b1"])
        .page("c", 10, &["c1", "c2"]);

    let urls = vec!["a".to_string(), "b".to_string(), "c".to_string()];
    let incidents = fetch_all(&source, &urls).await.unwrap();

    assert_eq!(ids(&incidents), vec!["a1", "a2", "b1", "c1", "c2"]);
    assert_eq!(source.peak.load(Ordering::SeqCst), 3, "requests run concurrently");
}

#[tokio::test]
async fn first_failing_url_fails_the_fetch() {
    let source = FakeSource::default()
        .page("a", 5, &["a1"])
        .failing("b", 1)
        .page("c", 1, &["c1"]);

    let urls = vec!["a".to_string(), "b".to_string(), "c".to_string()];
    let err = fetch_all(&source, &urls).await.unwrap_err();
    assert!(matches!(err, ApiError::Status { ref url, status: 503, .. } if url == "b"));
}

#[tokio::test]
async fn fetch_history_builds_category_urls_and_aggregates_sources() {
    let source = FakeSource::default()
        .page(&url("newsItem"), 5, &["n1", "n2"])
        .page(&url("radioSong"), 1, &["r1"]);
    let fetcher = HistoryFetcher::with_source(source, TimeMachineConfig::default());
    let mut rng = SmallRng::seed_from_u64(1);

    let batch = fetcher
        .fetch_history(&day_query("newsItem,radioSong"), &mut rng)
        .await
        .unwrap()
        .expect("guard was free");

    assert_eq!(ids(&batch.incidents), vec!["n1", "n2", "r1"]);
    assert_eq!(batch.attribution().as_deref(), Some("Source: src-n,src-r"));
    assert!(!fetcher.is_loading());
}

#[tokio::test]
async fn concurrent_call_is_ignored_while_in_flight() {
    let source = FakeSource::default().page(&url("newsItem"), 20, &["n1"]);
    let fetcher = HistoryFetcher::with_source(source, TimeMachineConfig::default());
    let query = day_query("newsItem");
    let mut rng_a = SmallRng::seed_from_u64(1);
    let mut rng_b = SmallRng::seed_from_u64(2);

    let (first, second) = tokio::join!(
        fetcher.fetch_history(&query, &mut rng_a),
        fetcher.fetch_history(&query, &mut rng_b),
    );

    assert!(first.unwrap().is_some());
    assert!(second.unwrap().is_none());
    assert_eq!(fetcher.source().calls.load(Ordering::SeqCst), 1);

    let again = fetcher.fetch_history(&query, &mut rng_a).await.unwrap();
    assert!(again.is_some(), "guard released after completion");
}

#[tokio::test]
async fn guard_is_released_after_error() {
    let source = FakeSource::default().failing(&url("newsItem"), 1);
    let fetcher = HistoryFetcher::with_source(source, TimeMachineConfig::default());
    let mut rng = SmallRng::seed_from_u64(3);

    assert!(fetcher
        .fetch_history(&day_query("newsItem"), &mut rng)
        .await
        .is_err());
    assert!(!fetcher.is_loading());
    assert!(fetcher
        .fetch_history(&day_query("newsItem"), &mut rng)
        .await
        .is_err());
    assert_eq!(fetcher.source().calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn shuffle_reorders_but_keeps_every_incident() {
    let all: Vec<String> = (0..24).map(|i| format!("n{i}")).collect();
    let all_refs: Vec<&str> = all.iter().map(String::as_str).collect();
    let source = FakeSource::default().page(&url("newsItem"), 1, &all_refs);
    let config = TimeMachineConfig {
        shuffle: true,
        ..TimeMachineConfig::default()
    };
    let fetcher = HistoryFetcher::with_source(source, config);
    let mut rng = SmallRng::seed_from_u64(42);

    let batch = fetcher
        .fetch_history(&day_query("newsItem"), &mut rng)
        .await
        .unwrap()
        .unwrap();

    let mut got = ids(&batch.incidents);
    assert_ne!(got, all_refs, "24 items shuffled into identical order");
    got.sort_unstable();
    let mut want = all_refs.clone();
    want.sort_unstable();
    assert_eq!(got, want);
}

#[test]
fn report_url_ignores_trailing_slash() {
    let client = HistoryClient::new(TimeMachineConfig {
        api_url: "http://localhost:8080/".into(),
        ..TimeMachineConfig::default()
    });
    assert_eq!(client.report_url(), "http://localhost:8080/report/broken-image");

    let report = BrokenImageReport {
        id: Some("n-1".into()),
        src: "https://img.example/x.jpg".into(),
    };
    assert_eq!(
        serde_json::to_value(&report).unwrap(),
        serde_json::json!({ "id": "n-1", "src": "https://img.example/x.jpg" })
    );
}
