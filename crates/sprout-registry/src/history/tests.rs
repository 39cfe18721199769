//! Unit tests for weekly download history

use super::*;

use std::time::Duration;

use chrono::Duration as ChronoDuration;

use proptest::prelude::*;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::client::{Endpoints, RetryConfig};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn history_for(server: &MockServer) -> HistoryAggregator {
    let client = RegistryClient::with_config(
        Endpoints::all_at(&server.uri()),
        Duration::from_secs(5),
        RetryConfig {
            max_retries: 0,
            ..RetryConfig::default()
        },
    )
    .unwrap();
    HistoryAggregator::new(Arc::new(client), SessionCache::new())
}

#[test]
fn test_window() {
    assert_eq!(window(date(2024, 3, 10), 7), Some((date(2024, 3, 4), date(2024, 3, 10))));
    assert_eq!(window(date(2024, 3, 10), 1), Some((date(2024, 3, 10), date(2024, 3, 10))));
    assert_eq!(window(date(2024, 3, 10), i64::MAX), None);
    assert_eq!(window(NaiveDate::MIN, 2), None);
}

#[test]
fn test_bucket_weekly_split_weeks() {
    // 2024-01-04 is a Thursday; ISO week 1 runs Mon 01-01 .. Sun 01-07
    let days = vec![
        DayDownloads::new("2024-01-04", 10),
        DayDownloads::new("2024-01-05", 20),
        DayDownloads::new("2024-01-06", 30),
        DayDownloads::new("2024-01-07", 40),
        DayDownloads::new("2024-01-08", 100),
        DayDownloads::new("2024-01-09", 200),
    ];

    let points = bucket_weekly(&days);
    assert_eq!(
        points,
        vec![
            DownloadPoint::new(date(2024, 1, 7), 25.0),
            DownloadPoint::new(date(2024, 1, 11), 150.0),
        ]
    );
}

#[test]
fn test_bucket_weekly_skips_unparsable_days() {
    let days = vec![
        DayDownloads::new("2024-01-01", 10),
        DayDownloads::new("garbage", 1_000_000),
        DayDownloads::new("2024-01-02", 30),
    ];
    assert_eq!(bucket_weekly(&days), vec![DownloadPoint::new(date(2024, 1, 4), 20.0)]);
}

#[test]
fn test_bucket_weekly_iso_year_boundary() {
    // 2020-12-31 (Thu) and 2021-01-01 (Fri) are both in ISO week 2020-W53
    let days = vec![
        DayDownloads::new("2020-12-31", 4),
        DayDownloads::new("2021-01-01", 6),
        DayDownloads::new("2021-01-04", 8),
    ];
    let points = bucket_weekly(&days);
    assert_eq!(points.len(), 2);
    assert_eq!(points[0].value, 5.0);
    assert_eq!(points[1], DownloadPoint::new(date(2021, 1, 7), 8.0));
}

#[test]
fn test_bucket_weekly_empty() {
    assert!(bucket_weekly(&[]).is_empty());
}

#[tokio::test]
async fn test_history_fetches_and_caches() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/downloads/range/2024-01-01:2024-01-14/react"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "downloads": [
                { "day": "2024-01-01", "downloads": 7 },
                { "day": "2024-01-02", "downloads": 7 },
                { "day": "2024-01-08", "downloads": 14 }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let history = history_for(&server);
    let end = date(2024, 1, 14);
    let first = history.history_ending("react", 14, end).await.unwrap();
    let second = history.history_ending("react", 14, end).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(
        first,
        vec![
            DownloadPoint::new(date(2024, 1, 4), 7.0),
            DownloadPoint::new(date(2024, 1, 11), 14.0),
        ]
    );
    assert!(history.cache.history.contains("react|14"));
}

#[tokio::test]
async fn test_history_invalid_input_skips_request() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let history = history_for(&server);
    assert!(history.history("react", 0).await.unwrap().is_empty());
    assert!(history.history("", 30).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_history_oversized_window_is_empty() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let history = history_for(&server);
    let end = date(2024, 1, 14);
    assert!(history.history_ending("react", 1_000_000_000, end).await.unwrap().is_empty());
    assert!(history.history_ending("react", i64::MAX, end).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_history_error_propagates_and_is_not_cached() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let history = history_for(&server);
    tokio_test::assert_err!(history.history_ending("react", 30, date(2024, 6, 1)).await);
    assert!(history.cache.history.is_empty());
}

#[tokio::test]
async fn test_history_empty_series() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "downloads": [] })))
        .mount(&server)
        .await;

    let history = history_for(&server);
    assert!(history.history_ending("fresh", 7, date(2024, 6, 1)).await.unwrap().is_empty());
}

proptest! {
    #[test]
    fn constant_series_averages_to_constant(
        start_offset in 0i64..3650,
        len in 1usize..120,
        value in 0u64..1_000_000,
    ) {
        let start = date(2015, 1, 1) + ChronoDuration::days(start_offset);
        let days: Vec<DayDownloads> = (0..len)
            .map(|i| {
                let day = start + ChronoDuration::days(i as i64);
                DayDownloads::new(day.format("%Y-%m-%d").to_string(), value)
            })
            .collect();

        let points = bucket_weekly(&days);

        // One point per distinct ISO week touched by the window
        let mut weeks: Vec<(i32, u32)> = days
            .iter()
            .filter_map(|d| d.date())
            .map(|d| (d.iso_week().year(), d.iso_week().week()))
            .collect();
        weeks.dedup();
        prop_assert_eq!(points.len(), weeks.len());

        for point in &points {
            prop_assert_eq!(point.value, value as f64);
        }
        prop_assert_eq!(points[0].date, start + ChronoDuration::days(3));
        for pair in points.windows(2) {
            prop_assert!(pair[0].date < pair[1].date);
        }
    }
}
