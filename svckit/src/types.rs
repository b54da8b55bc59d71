// svckit/src/types.rs
//
// Wire types of the LogPulse REST API (camelCase JSON)

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Severity of a log line. Closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
}

impl LogLevel {
    pub const ALL: [LogLevel; 4] = [LogLevel::Error, LogLevel::Warn, LogLevel::Info, LogLevel::Debug];

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ERROR" => Ok(LogLevel::Error),
            "WARN" | "WARNING" => Ok(LogLevel::Warn),
            "INFO" => Ok(LogLevel::Info),
            "DEBUG" => Ok(LogLevel::Debug),
            other => Err(format!("unknown log level: {}", other)),
        }
    }
}

impl Serialize for LogLevel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for LogLevel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// One ingested log line, read-only on the client side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(alias = "createdAt", with = "timestamp")]
    pub timestamp: DateTime<Utc>,
    pub source: String,
    pub log_level: LogLevel,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

/// Body of `POST /logs`; the backend assigns the id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLogEntry {
    pub source: String,
    pub content: String,
    pub log_level: LogLevel,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "timestamp::option")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

// Ids arrive as numbers from the list endpoints and as strings from search.
fn deserialize_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Unsigned(u64),
        Signed(i64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Unsigned(n) => n.to_string(),
        RawId::Signed(n) => n.to_string(),
    })
}

/// Paginated query result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    pub total_elements: u64,
    pub total_pages: u32,
    #[serde(default)]
    pub number: u32,
    #[serde(default)]
    pub size: u32,
}

impl<T> Page<T> {
    pub fn empty() -> Self {
        Self {
            content: Vec::new(),
            total_elements: 0,
            total_pages: 0,
            number: 0,
            size: 0,
        }
    }

    /// Cuts page `number` of length `size` out of the full, already ordered result.
    pub fn slice(rows: Vec<T>, number: u32, size: u32) -> Self {
        let total_elements = rows.len() as u64;
        let start = (number as usize).saturating_mul(size as usize);
        let content = rows
            .into_iter()
            .skip(start)
            .take(size as usize)
            .collect();

        Self {
            content,
            total_elements,
            total_pages: total_pages(total_elements, size),
            number,
            size,
        }
    }

    /// Wraps a bare list answer from the legacy endpoints into one page.
    pub fn from_list(items: Vec<T>) -> Self {
        let len = items.len();
        Self {
            content: items,
            total_elements: len as u64,
            total_pages: if len == 0 { 0 } else { 1 },
            number: 0,
            size: len as u32,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn has_next(&self) -> bool {
        self.number + 1 < self.total_pages
    }
}

pub fn total_pages(total_elements: u64, size: u32) -> u32 {
    if size == 0 {
        return 0;
    }
    total_elements.div_ceil(size as u64) as u32
}

/// Either a page envelope or the bare array some list endpoints return.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum PageBody<T> {
    Page(Page<T>),
    List(Vec<T>),
}

impl<T> From<PageBody<T>> for Page<T> {
    fn from(body: PageBody<T>) -> Self {
        match body {
            PageBody::Page(page) => page,
            PageBody::List(items) => Page::from_list(items),
        }
    }
}

/// Percentage rounded to two decimals, 0 for an empty denominator.
pub fn rate_percent(part: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let rate = part as f64 / total as f64 * 100.0;
    (rate * 100.0).round() / 100.0
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogCounts {
    pub error: u64,
    pub warn: u64,
    pub info: u64,
    pub debug: u64,
    pub total: u64,
    #[serde(default)]
    pub error_rate: f64,
}

impl LogCounts {
    pub fn from_entries<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = &'a LogEntry>,
    {
        let mut counts = Self::default();
        for entry in entries {
            counts.record(entry.log_level);
        }
        counts.error_rate = rate_percent(counts.error, counts.total);
        counts
    }

    pub fn record(&mut self, level: LogLevel) {
        match level {
            LogLevel::Error => self.error += 1,
            LogLevel::Warn => self.warn += 1,
            LogLevel::Info => self.info += 1,
            LogLevel::Debug => self.debug += 1,
        }
        self.total += 1;
    }

    pub fn get(&self, level: LogLevel) -> u64 {
        match level {
            LogLevel::Error => self.error,
            LogLevel::Warn => self.warn,
            LogLevel::Info => self.info,
            LogLevel::Debug => self.debug,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HourlyBucket {
    pub hour: String,
    pub error: u64,
    pub warn: u64,
    pub info: u64,
    pub debug: u64,
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HourlyStats {
    pub date: NaiveDate,
    pub hourly_stats: Vec<HourlyBucket>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceCount {
    pub source: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceStats {
    #[serde(default, with = "timestamp::option")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, with = "timestamp::option")]
    pub end_time: Option<DateTime<Utc>>,
    pub source_stats: Vec<SourceCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceLevelCount {
    pub source: String,
    pub error: u64,
    pub warn: u64,
    pub info: u64,
    pub debug: u64,
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceLevelStats {
    #[serde(default, with = "timestamp::option")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, with = "timestamp::option")]
    pub end_time: Option<DateTime<Utc>>,
    pub source_level_stats: Vec<SourceLevelCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyErrorStat {
    pub date: NaiveDate,
    pub total_logs: u64,
    pub error_logs: u64,
    pub error_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorTrends {
    #[serde(default, with = "date::option")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, with = "date::option")]
    pub end_date: Option<NaiveDate>,
    pub daily_stats: Vec<DailyErrorStat>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SystemHealth {
    Up,
    Warning,
    Degraded,
    Error,
}

impl SystemHealth {
    pub fn from_metrics(error_rate: f64, avg_response_time: u32) -> Self {
        if error_rate > 15.0 || avg_response_time > 500 {
            SystemHealth::Degraded
        } else if error_rate > 5.0 || avg_response_time > 200 {
            SystemHealth::Warning
        } else {
            SystemHealth::Up
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemStatus {
    pub uptime: String,
    pub memory_usage: f64,
    pub processed_rate: u64,
    pub error_rate: f64,
    pub avg_response_time: u32,
    pub status: SystemHealth,
    #[serde(default, with = "timestamp::option")]
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentErrors {
    #[serde(default, with = "timestamp::option")]
    pub timestamp: Option<DateTime<Utc>>,
    pub recent_errors: Vec<LogEntry>,
}

/// Combined `/dashboard/stats` payload. Every field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_counts: Option<LogCounts>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hourly_stats: Option<HourlyStats>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_stats: Option<SourceStats>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_level_stats: Option<SourceLevelStats>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_status: Option<SystemStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recent_errors: Option<RecentErrors>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_trends: Option<ErrorTrends>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "timestamp::option")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl DashboardStats {
    pub fn has(&self, field: DashboardField) -> bool {
        match field {
            DashboardField::LogCounts => self.log_counts.is_some(),
            DashboardField::HourlyStats => self.hourly_stats.is_some(),
            DashboardField::SourceStats => self.source_stats.is_some(),
            DashboardField::SourceLevelStats => self.source_level_stats.is_some(),
            DashboardField::ErrorTrends => self.error_trends.is_some(),
            DashboardField::SystemStatus => self.system_status.is_some(),
            DashboardField::RecentErrors => self.recent_errors.is_some(),
        }
    }

    pub fn clear(&mut self, field: DashboardField) {
        match field {
            DashboardField::LogCounts => self.log_counts = None,
            DashboardField::HourlyStats => self.hourly_stats = None,
            DashboardField::SourceStats => self.source_stats = None,
            DashboardField::SourceLevelStats => self.source_level_stats = None,
            DashboardField::ErrorTrends => self.error_trends = None,
            DashboardField::SystemStatus => self.system_status = None,
            DashboardField::RecentErrors => self.recent_errors = None,
        }
    }

    pub fn missing(&self) -> Vec<DashboardField> {
        DashboardField::ALL.into_iter().filter(|f| !self.has(*f)).collect()
    }
}

/// The aggregations that make up a dashboard, in fallback order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DashboardField {
    LogCounts,
    HourlyStats,
    SourceStats,
    SourceLevelStats,
    ErrorTrends,
    SystemStatus,
    RecentErrors,
}

impl DashboardField {
    pub const ALL: [DashboardField; 7] = [
        DashboardField::LogCounts,
        DashboardField::HourlyStats,
        DashboardField::SourceStats,
        DashboardField::SourceLevelStats,
        DashboardField::ErrorTrends,
        DashboardField::SystemStatus,
        DashboardField::RecentErrors,
    ];

    /// Key in the combined payload.
    pub fn key(&self) -> &'static str {
        match self {
            DashboardField::LogCounts => "logCounts",
            DashboardField::HourlyStats => "hourlyStats",
            DashboardField::SourceStats => "sourceStats",
            DashboardField::SourceLevelStats => "sourceLevelStats",
            DashboardField::ErrorTrends => "errorTrends",
            DashboardField::SystemStatus => "systemStatus",
            DashboardField::RecentErrors => "recentErrors",
        }
    }

    /// Path segment of the dedicated sub-resource under `/dashboard`.
    pub fn resource(&self) -> &'static str {
        match self {
            DashboardField::LogCounts => "log-counts",
            DashboardField::HourlyStats => "hourly-stats",
            DashboardField::SourceStats => "source-stats",
            DashboardField::SourceLevelStats => "source-level-stats",
            DashboardField::ErrorTrends => "error-trends",
            DashboardField::SystemStatus => "system-status",
            DashboardField::RecentErrors => "recent-errors",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.key() == key || f.resource() == key)
    }
}

impl fmt::Display for DashboardField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl Serialize for DashboardField {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.key())
    }
}

impl<'de> Deserialize<'de> for DashboardField {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DashboardField::from_key(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown dashboard field: {}", raw)))
    }
}

/// Instants on the wire: RFC 3339, or a zone-less local date-time read as UTC.
pub mod timestamp {
    use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    const NAIVE_FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M",
    ];

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        let raw = raw.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        NAIVE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
            .map(|naive| naive.and_utc())
    }

    pub fn format(value: &DateTime<Utc>) -> String {
        value.to_rfc3339_opts(SecondsFormat::Secs, true)
    }

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {}", raw)))
    }

    pub mod option {
        use chrono::{DateTime, Utc};
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            value: &Option<DateTime<Utc>>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(v) => serializer.serialize_str(&super::format(v)),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            match Option::<String>::deserialize(deserializer)? {
                Some(raw) if raw.trim().is_empty() => Ok(None),
                Some(raw) => super::parse(&raw)
                    .map(Some)
                    .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {}", raw))),
                None => Ok(None),
            }
        }
    }
}

/// Calendar dates that may arrive as empty strings.
pub mod date {
    pub mod option {
        use chrono::NaiveDate;
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(value: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error> {
            match value {
                Some(d) => serializer.serialize_str(&d.format("%Y-%m-%d").to_string()),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<NaiveDate>, D::Error> {
            match Option::<String>::deserialize(deserializer)? {
                Some(raw) if raw.trim().is_empty() => Ok(None),
                Some(raw) => NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
                    .map(Some)
                    .map_err(serde::de::Error::custom),
                None => Ok(None),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_log_level_parsing() {
        assert_eq!("error".parse::<LogLevel>().unwrap(), LogLevel::Error);
        assert_eq!("Warning".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert!("TRACE".parse::<LogLevel>().is_err());
        assert_eq!(serde_json::to_value(LogLevel::Debug).unwrap(), json!("DEBUG"));
    }

    #[test]
    fn test_log_entry_accepts_list_endpoint_shape() {
        let entry: LogEntry = serde_json::from_value(json!({
            "id": 42,
            "source": "api-service",
            "content": "Failed to connect to database",
            "logLevel": "ERROR",
            "createdAt": "2024-01-01T10:30:00"
        }))
        .unwrap();

        assert_eq!(entry.id, "42");
        assert_eq!(entry.timestamp, Utc.with_ymd_and_hms(2024, 1, 1, 10, 30, 0).unwrap());
        assert_eq!(entry.ip, None);
    }

    #[test]
    fn test_log_entry_serializes_rfc3339() {
        let entry = LogEntry {
            id: "log-1".into(),
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            source: "auth-service".into(),
            log_level: LogLevel::Info,
            content: "ok".into(),
            ip: Some("192.168.1.1".into()),
            user: None,
        };

        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["timestamp"], json!("2024-01-01T00:00:00Z"));
        assert_eq!(value["logLevel"], json!("INFO"));
        assert!(value.get("user").is_none());
    }

    #[test]
    fn test_page_slice_boundaries() {
        let rows: Vec<u32> = (0..45).collect();

        let last = Page::slice(rows.clone(), 2, 20);
        assert_eq!(last.total_pages, 3);
        assert_eq!(last.content.len(), 5);
        assert!(!last.has_next());

        let beyond = Page::slice(rows, 3, 20);
        assert!(beyond.is_empty());
        assert_eq!(beyond.total_elements, 45);
    }

    #[test]
    fn test_page_body_accepts_bare_list() {
        let body: PageBody<u32> = serde_json::from_value(json!([1, 2, 3])).unwrap();
        let page: Page<u32> = body.into();
        assert_eq!(page.total_elements, 3);
        assert_eq!(page.total_pages, 1);

        let body: PageBody<u32> =
            serde_json::from_value(json!({"content": [], "totalElements": 0, "totalPages": 0})).unwrap();
        assert_eq!(Page::from(body), Page::empty());
    }

    #[test]
    fn test_rate_percent_rounding() {
        assert_eq!(rate_percent(1, 3), 33.33);
        assert_eq!(rate_percent(0, 0), 0.0);
        assert_eq!(rate_percent(5, 5), 100.0);
    }

    #[test]
    fn test_system_health_thresholds() {
        assert_eq!(SystemHealth::from_metrics(1.2, 85), SystemHealth::Up);
        assert_eq!(SystemHealth::from_metrics(6.0, 85), SystemHealth::Warning);
        assert_eq!(SystemHealth::from_metrics(1.0, 250), SystemHealth::Warning);
        assert_eq!(SystemHealth::from_metrics(20.0, 85), SystemHealth::Degraded);
    }

    #[test]
    fn test_dashboard_stats_missing_fields() {
        let stats: DashboardStats = serde_json::from_value(json!({
            "logCounts": {"error": 1, "warn": 0, "info": 3, "debug": 0, "total": 4, "errorRate": 25.0}
        }))
        .unwrap();

        assert!(stats.log_counts.is_some());
        assert!(stats.recent_errors.is_none());
        assert_eq!(DashboardField::from_key("recent-errors"), Some(DashboardField::RecentErrors));
    }

    #[test]
    fn test_error_trends_tolerates_blank_dates() {
        let trends: ErrorTrends =
            serde_json::from_value(json!({"startDate": "", "endDate": "", "dailyStats": []})).unwrap();
        assert_eq!(trends.start_date, None);
    }
}
