//! Weekly download trend over a window of days

use std::sync::Arc;

use chrono::{Datelike, Days, Local, NaiveDate};
use tracing::debug;

use sprout_core::types::{DayDownloads, DownloadPoint};

use crate::cache::{DownloadHistoryCache, SessionCache};
use crate::client::RegistryClient;
use crate::RegistryResult;

/// Default trend window
pub const DEFAULT_WINDOW_DAYS: i64 = 90;

/// Fetches daily downloads and averages them per ISO week
#[derive(Debug, Clone)]
pub struct HistoryAggregator {
    client: Arc<RegistryClient>,
    cache: Arc<SessionCache>,
}

impl HistoryAggregator {
    pub fn new(client: Arc<RegistryClient>, cache: Arc<SessionCache>) -> Self {
        Self { client, cache }
    }

    /// Weekly averages for the `days` days ending yesterday
    pub async fn history(&self, name: &str, days: i64) -> RegistryResult<Vec<DownloadPoint>> {
        let today = Local::now().date_naive();
        let yesterday = today.checked_sub_days(Days::new(1)).unwrap_or(today);
        self.history_ending(name, days, yesterday).await
    }

    /// Weekly averages for the `days` days ending on `end`, inclusive
    pub async fn history_ending(&self, name: &str, days: i64, end: NaiveDate) -> RegistryResult<Vec<DownloadPoint>> {
        if name.is_empty() || days < 1 {
            return Ok(Vec::new());
        }

        let key = DownloadHistoryCache::key(name, days);
        if let Some(series) = self.cache.history.get(&key) {
            return Ok(series);
        }

        let Some((start, end)) = window(end, days) else {
            debug!("{} day window ending {} is out of range", days, end);
            return Ok(Vec::new());
        };
        let raw = self.client.downloads_range(name, start, end).await?;
        let series = bucket_weekly(&raw);
        debug!("{} days of downloads for {} -> {} weekly points", raw.len(), name, series.len());

        self.cache.history.insert(key, &series);
        Ok(series)
    }
}

/// Inclusive window of `days` days ending on `end`.
///
/// `None` when the start date falls outside the calendar range.
pub fn window(end: NaiveDate, days: i64) -> Option<(NaiveDate, NaiveDate)> {
    let span = u64::try_from(days.max(1) - 1).ok()?;
    let start = end.checked_sub_days(Days::new(span))?;
    Some((start, end))
}

/// Average consecutive days per ISO week.
///
/// A bucket closes whenever the (ISO year, ISO week) of the next parsable
/// day differs from the current one. Each point is dated three days after
/// the first day observed in its bucket. Days that fail to parse are
/// skipped.
pub fn bucket_weekly(days: &[DayDownloads]) -> Vec<DownloadPoint> {
    struct Bucket {
        week: (i32, u32),
        first_day: NaiveDate,
        sum: u64,
        count: u64,
    }

    impl Bucket {
        fn point(&self) -> DownloadPoint {
            let mid_week = self.first_day.checked_add_days(Days::new(3)).unwrap_or(self.first_day);
            DownloadPoint::new(mid_week, self.sum as f64 / self.count as f64)
        }
    }

    let mut points = Vec::new();
    let mut current: Option<Bucket> = None;

    for day in days {
        let Some(date) = day.date() else {
            continue;
        };
        let iso = date.iso_week();
        let week = (iso.year(), iso.week());

        match current.as_mut() {
            Some(bucket) if bucket.week == week => {
                bucket.sum += day.downloads;
                bucket.count += 1;
            }
            _ => {
                if let Some(done) = current.take() {
                    points.push(done.point());
                }
                current = Some(Bucket {
                    week,
                    first_day: date,
                    sum: day.downloads,
                    count: 1,
                });
            }
        }
    }

    if let Some(done) = current {
        points.push(done.point());
    }
    points
}

#[cfg(test)]
mod tests;
