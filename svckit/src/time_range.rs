// svckit/src/time_range.rs
//
// Symbolic dashboard ranges resolved against a reference instant

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeRange {
    #[default]
    Last24Hours,
    Last7Days,
    Last30Days,
}

impl TimeRange {
    pub fn duration(&self) -> Duration {
        match self {
            TimeRange::Last24Hours => Duration::hours(24),
            TimeRange::Last7Days => Duration::days(7),
            TimeRange::Last30Days => Duration::days(30),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeRange::Last24Hours => "24h",
            TimeRange::Last7Days => "7d",
            TimeRange::Last30Days => "30d",
        }
    }

    /// `start = now - duration`, `end = now`.
    pub fn resolve(&self, now: DateTime<Utc>) -> TimeWindow {
        TimeWindow {
            start: now - self.duration(),
            end: now,
        }
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "24h" | "last24h" => Ok(TimeRange::Last24Hours),
            "7d" | "last7d" => Ok(TimeRange::Last7Days),
            "30d" | "last30d" => Ok(TimeRange::Last30Days),
            other => Err(format!("unknown time range: {} (expected 24h, 7d or 30d)", other)),
        }
    }
}

impl Serialize for TimeRange {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TimeRange {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Inclusive `[start, end]` window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, instant: &DateTime<Utc>) -> bool {
        *instant >= self.start && *instant <= self.end
    }

    /// Calendar day the window ends on, used for the hourly histogram.
    pub fn end_date(&self) -> NaiveDate {
        self.end.date_naive()
    }
}
