//! Unit tests for registry client

use super::*;

use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fast_retry() -> RetryConfig {
    RetryConfig {
        max_retries: 2,
        initial_delay: Duration::from_millis(5),
        max_delay: Duration::from_millis(20),
        multiplier: 2.0,
    }
}

fn client_for(server: &MockServer) -> RegistryClient {
    RegistryClient::with_config(Endpoints::all_at(&server.uri()), Duration::from_secs(2), fast_retry()).unwrap()
}

#[tokio::test]
async fn test_registry_client_creation() {
    let client = tokio_test::assert_ok!(RegistryClient::new());
    assert_eq!(client.endpoints().registry, "https://registry.npmjs.org");
    assert_eq!(client.retry_config.max_retries, 2);
}

#[test]
fn test_encode_package_name() {
    assert_eq!(encode_package_name("lodash"), "lodash");
    assert_eq!(encode_package_name("@types/node"), "@types%2fnode");
}

#[test]
fn test_retry_config_default() {
    let config = RetryConfig::default();
    assert_eq!(config.max_retries, 2);
    assert_eq!(config.initial_delay, Duration::from_millis(100));
    assert_eq!(config.multiplier, 2.0);
}

#[tokio::test]
async fn test_search_success() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/-/v1/search"))
        .and(query_param("text", "react"))
        .and(query_param("size", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "objects": [
                { "package": { "name": "react", "version": "18.2.0", "publisher": { "username": "gnoff" } } },
                { "package": { "name": "react-dom", "version": "18.2.0" } }
            ],
            "total": 2,
            "time": "Mon Jan 01 2024"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let result = client_for(&server).search("react", 10).await.unwrap();
    assert_eq!(result.names(), vec!["react", "react-dom"]);
    assert_eq!(result.total, 2);
    assert_eq!(result.packages[0].publisher, "gnoff");
    assert_eq!(result.packages[1].npm_url, "https://www.npmjs.com/package/react-dom");
}

#[tokio::test]
async fn test_search_blank_query_skips_request() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let result = client_for(&server).search("   ", 10).await.unwrap();
    assert!(result.is_empty());
}

#[tokio::test]
async fn test_search_retries_then_fails() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/-/v1/search"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let err = client_for(&server).search("react", 10).await.unwrap_err();
    assert!(matches!(err, SproutError::Network { .. }));
}

#[tokio::test]
async fn test_downloads_last_week() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/downloads/point/last-week/@types%2fnode"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "downloads": 41234567,
            "start": "2024-01-01",
            "end": "2024-01-07",
            "package": "@types/node"
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert_eq!(client.downloads_last_week("@types/node").await, 41234567);
}

#[tokio::test]
async fn test_downloads_last_week_degrades_to_zero() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/downloads/point/last-week/broken"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert_eq!(client.downloads_last_week("broken").await, 0);
    // No mock at all: 404
    assert_eq!(client.downloads_last_week("missing").await, 0);
}

#[tokio::test]
async fn test_latest_metadata() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/express/latest"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "express",
            "version": "4.18.2",
            "license": "MIT",
            "author": { "name": "TJ Holowaychuk" },
            "repository": { "type": "git", "url": "git+https://github.com/expressjs/express.git" }
        })))
        .mount(&server)
        .await;

    let meta = client_for(&server).latest_metadata("express").await.unwrap();
    assert_eq!(meta.version, "4.18.2");
    assert_eq!(meta.license, "MIT");
    assert_eq!(meta.author, "TJ Holowaychuk");
    assert_eq!(meta.repository, "git+https://github.com/expressjs/express.git");
    assert_eq!(meta.homepage, "");
}

#[tokio::test]
async fn test_latest_metadata_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/nonexistent-package/latest"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    match client_for(&server).latest_metadata("nonexistent-package").await.unwrap_err() {
        SproutError::PackageNotFound { name } => assert_eq!(name, "nonexistent-package"),
        other => panic!("Expected PackageNotFound error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_downloads_range() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/downloads/range/2024-01-01:2024-01-03/zod"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "start": "2024-01-01",
            "end": "2024-01-03",
            "package": "zod",
            "downloads": [
                { "day": "2024-01-01", "downloads": 10 },
                { "day": "2024-01-02", "downloads": 20 },
                { "day": "2024-01-03", "downloads": 30 }
            ]
        })))
        .mount(&server)
        .await;

    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let end = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
    let days = client_for(&server).downloads_range("zod", start, end).await.unwrap();
    assert_eq!(days.len(), 3);
    assert_eq!(days[2], DayDownloads::new("2024-01-03", 30));
}

#[tokio::test]
async fn test_downloads_range_not_found_is_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let err = client_for(&server).downloads_range("nope", day, day).await.unwrap_err();
    assert!(matches!(err, SproutError::PackageNotFound { .. }));
}

#[tokio::test]
async fn test_fetch_text() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/ok"))
        .respond_with(ResponseTemplate::new(200).set_body_string("# Title"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/empty"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let timeout = Duration::from_secs(1);
    assert_eq!(
        client.fetch_text(&format!("{}/ok", server.uri()), timeout).await.unwrap(),
        Some("# Title".to_string())
    );
    assert_eq!(client.fetch_text(&format!("{}/empty", server.uri()), timeout).await.unwrap(), None);
    assert_eq!(client.fetch_text(&format!("{}/missing", server.uri()), timeout).await.unwrap(), None);
}
