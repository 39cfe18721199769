//! Download statistics types.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One bucketed observation of a download series
///
/// `date` sits in the middle of the bucket (bucket start plus three days),
/// not at its start.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DownloadPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// Raw per-day entry of the downloads range endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayDownloads {
    /// Day formatted as `YYYY-MM-DD`
    pub day: String,
    pub downloads: u64,
}

impl DownloadPoint {
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self { date, value }
    }
}

impl DayDownloads {
    pub fn new(day: impl Into<String>, downloads: u64) -> Self {
        Self {
            day: day.into(),
            downloads,
        }
    }

    /// Parse the day, `None` when it is not a `YYYY-MM-DD` date
    pub fn date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.day, "%Y-%m-%d").ok()
    }
}

/// Values of a series, oldest first
pub fn series_values(points: &[DownloadPoint]) -> Vec<f64> {
    points.iter().map(|p| p.value).collect()
}
