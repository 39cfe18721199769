//! Unit tests for the aggregator

use super::*;

use std::sync::Mutex;
use std::time::{Duration, Instant};

use serde_json::json;
use wiremock::matchers::{method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

use crate::client::{Endpoints, RetryConfig};

fn aggregator_for(server: &MockServer, concurrency: usize) -> Aggregator {
    let client = RegistryClient::with_config(
        Endpoints::all_at(&server.uri()),
        Duration::from_secs(5),
        RetryConfig::default(),
    )
    .unwrap();
    Aggregator::new(Arc::new(client), SessionCache::new(), concurrency)
}

async fn mount_package(server: &MockServer, name: &str, downloads: u64, license: &str, delay: Duration) {
    Mock::given(method("GET"))
        .and(path(format!("/downloads/point/last-week/{}", name)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "downloads": downloads, "package": name }))
                .set_delay(delay),
        )
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/{}/latest", name)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({
                    "name": name,
                    "version": "1.0.0",
                    "license": license,
                    "author": { "name": format!("{} author", name) }
                }))
                .set_delay(delay),
        )
        .mount(server)
        .await;
}

fn names(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn test_enrich_preserves_input_order() {
    let server = MockServer::start().await;
    // Earlier names answer slower so completions arrive in reverse order
    let input = names(&["alpha", "bravo", "charlie", "delta", "echo", "foxtrot"]);
    for (i, name) in input.iter().enumerate() {
        let delay = Duration::from_millis(20 * (input.len() - i) as u64);
        mount_package(&server, name, (i as u64 + 1) * 100, "MIT", delay).await;
    }

    let records = aggregator_for(&server, 3).enrich(&input).await;

    assert_eq!(records.len(), input.len());
    for (i, record) in records.iter().enumerate() {
        assert_eq!(record.name, input[i]);
        assert_eq!(record.weekly_downloads, (i as u64 + 1) * 100);
        assert_eq!(record.author, format!("{} author", input[i]));
        assert_eq!(record.npm_url, format!("https://www.npmjs.com/package/{}", input[i]));
    }
}

#[tokio::test]
async fn test_enrich_empty_input() {
    let server = MockServer::start().await;
    let records = aggregator_for(&server, 5).enrich(&[]).await;
    assert!(records.is_empty());
}

#[tokio::test]
async fn test_cache_idempotence() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/downloads/point/last-week/zod"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "downloads": 7 })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/zod/latest"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "version": "3.22.4", "license": "MIT" })))
        .expect(1)
        .mount(&server)
        .await;

    let aggregator = aggregator_for(&server, 5);
    let first = aggregator.enrich(&names(&["zod"])).await;
    let second = aggregator.enrich(&names(&["zod"])).await;

    assert_eq!(first, second);
    assert_eq!(second[0].weekly_downloads, 7);
    assert!(aggregator.cache().metadata.contains("zod"));
    // `expect(1)` on both mocks is verified when the server drops
}

#[tokio::test]
async fn test_partial_failure_degrades_fields() {
    let server = MockServer::start().await;

    // Downloads fail, metadata succeeds
    Mock::given(method("GET"))
        .and(path("/downloads/point/last-week/half"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/half/latest"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "license": "ISC" })))
        .mount(&server)
        .await;

    // Metadata fails, downloads succeed
    Mock::given(method("GET"))
        .and(path("/downloads/point/last-week/other"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "downloads": 55 })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/other/latest"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{ broken"))
        .mount(&server)
        .await;

    let aggregator = aggregator_for(&server, 5);
    let records = aggregator.enrich(&names(&["half", "other", "ghost"])).await;

    assert_eq!(records[0].weekly_downloads, 0);
    assert_eq!(records[0].license, "ISC");

    assert_eq!(records[1].weekly_downloads, 55);
    assert_eq!(records[1].license, "");
    assert_eq!(records[1].author, "");

    assert_eq!(records[2].name, "ghost");
    assert_eq!(records[2].weekly_downloads, 0);

    // Failed fetches are cached too
    assert_eq!(aggregator.cache().metadata.len(), 3);
}

/// Answers `/<name>/latest` after `delay`, logging when each request arrived
#[derive(Clone)]
struct ArrivalLog {
    arrivals: Arc<Mutex<Vec<Instant>>>,
    delay: Duration,
}

impl ArrivalLog {
    fn new(delay: Duration) -> Self {
        Self {
            arrivals: Arc::new(Mutex::new(Vec::new())),
            delay,
        }
    }

    fn count(&self) -> usize {
        self.arrivals.lock().unwrap().len()
    }

    /// Most requests that arrived within half a delay of each other.
    ///
    /// A permit is held for at least one delay, so each permit contributes
    /// at most one arrival to any such span.
    fn peak(&self) -> usize {
        let mut arrivals = self.arrivals.lock().unwrap().clone();
        arrivals.sort();
        let span = self.delay / 2;
        (0..arrivals.len())
            .map(|i| arrivals[i..].iter().take_while(|t| **t - arrivals[i] < span).count())
            .max()
            .unwrap_or(0)
    }
}

impl Respond for ArrivalLog {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        self.arrivals.lock().unwrap().push(Instant::now());
        let name = request.url.path().trim_start_matches('/').trim_end_matches("/latest").to_string();
        ResponseTemplate::new(200)
            .set_body_json(json!({ "name": name, "version": "1.0.0", "license": "MIT" }))
            .set_delay(self.delay)
    }
}

async fn mount_arrival_log(server: &MockServer, log: &ArrivalLog) {
    Mock::given(method("GET"))
        .and(path_regex(r"^/[^/]+/latest$"))
        .respond_with(log.clone())
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/downloads/point/last-week/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "downloads": 1 })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_concurrency_ceiling() {
    let server = MockServer::start().await;
    let log = ArrivalLog::new(Duration::from_millis(200));
    mount_arrival_log(&server, &log).await;

    let input = names(&["p1", "p2", "p3", "p4", "p5"]);
    let records = aggregator_for(&server, 2).enrich(&input).await;

    assert_eq!(records.len(), 5);
    assert!(records.iter().all(|r| r.version == "1.0.0"));
    assert_eq!(log.count(), 5);
    assert_eq!(log.peak(), 2);
}

#[tokio::test]
async fn test_concurrency_ceiling_shared_across_batches() {
    let server = MockServer::start().await;
    let log = ArrivalLog::new(Duration::from_millis(200));
    mount_arrival_log(&server, &log).await;

    let aggregator = aggregator_for(&server, 2);
    let first = names(&["a1", "a2", "a3"]);
    let second = names(&["b1", "b2", "b3"]);

    let (left, right) = tokio::join!(aggregator.enrich(&first), aggregator.enrich(&second));

    assert_eq!(left.iter().map(|r| r.name.as_str()).collect::<Vec<_>>(), vec!["a1", "a2", "a3"]);
    assert_eq!(right.iter().map(|r| r.name.as_str()).collect::<Vec<_>>(), vec!["b1", "b2", "b3"]);
    assert_eq!(log.count(), 6);
    assert_eq!(log.peak(), 2);
}

#[tokio::test]
async fn test_oversized_concurrency_is_clamped() {
    let server = MockServer::start().await;
    mount_package(&server, "lodash", 7, "MIT", Duration::ZERO).await;

    let record = aggregator_for(&server, usize::MAX).resolve("lodash").await;
    assert_eq!(record.weekly_downloads, 7);
}

#[tokio::test]
async fn test_augment_search_result() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/-/v1/search"))
        .and(query_param("text", "fetch"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "objects": [
                { "package": {
                    "name": "node-fetch",
                    "version": "3.3.2",
                    "description": "A light-weight module",
                    "links": { "repository": "https://github.com/node-fetch/node-fetch" },
                    "publisher": { "username": "endless" }
                } },
                { "package": {
                    "name": "cross-fetch",
                    "version": "4.0.0",
                    "publisher": { "username": "lquixada" }
                } }
            ],
            "total": 2,
            "time": "now"
        })))
        .mount(&server)
        .await;

    mount_package(&server, "node-fetch", 1000, "MIT", Duration::ZERO).await;

    Mock::given(method("GET"))
        .and(path("/downloads/point/last-week/cross-fetch"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "downloads": 500 })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/cross-fetch/latest"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "version": "9.9.9",
            "description": "from latest",
            "license": { "type": "MIT" },
            "repository": "github:lquixada/cross-fetch"
        })))
        .mount(&server)
        .await;

    let result = aggregator_for(&server, 5).search("fetch", 10).await.unwrap();

    assert_eq!(result.names(), vec!["node-fetch", "cross-fetch"]);

    let node_fetch = &result.packages[0];
    assert_eq!(node_fetch.weekly_downloads, 1000);
    assert_eq!(node_fetch.author, "node-fetch author");
    assert_eq!(node_fetch.repository, "https://github.com/node-fetch/node-fetch");

    let cross_fetch = &result.packages[1];
    // Search fields win over latest metadata
    assert_eq!(cross_fetch.version, "4.0.0");
    assert_eq!(cross_fetch.description, "");
    assert_eq!(cross_fetch.license, "MIT");
    // Empty search link is filled from the resolved record
    assert_eq!(cross_fetch.repository, "github:lquixada/cross-fetch");
    // Publisher fallback
    assert_eq!(cross_fetch.author, "lquixada");
}

#[tokio::test]
async fn test_search_failure_propagates() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/-/v1/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    tokio_test::assert_err!(aggregator_for(&server, 5).search("x", 10).await);
}

#[tokio::test]
async fn test_resolve_single() {
    let server = MockServer::start().await;
    mount_package(&server, "lodash", 42, "MIT", Duration::ZERO).await;

    let record = aggregator_for(&server, 1).resolve("lodash").await;
    assert_eq!(record.weekly_downloads, 42);
    assert_eq!(record.version, "1.0.0");
}
