// svckit/src/store.rs
//
// In-memory log store implementing the server side of the LogPulse API
// Backs the fixture transport and the mock backend
//

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use chrono::{DateTime, Duration, NaiveDate, Timelike, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::errors::StoreError;
use crate::filter::{contains_ignore_case, non_empty, non_empty_instant, LogFilter, SortDir};
use crate::mock::MockDataGenerator;
use crate::time_range::TimeWindow;
use crate::types::{
    rate_percent, DailyErrorStat, DashboardStats, ErrorTrends, HourlyBucket, HourlyStats, LogCounts, LogEntry,
    LogLevel, NewLogEntry, Page, RecentErrors, SourceCount, SourceLevelCount, SourceLevelStats, SourceStats,
    SystemHealth, SystemStatus,
};

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const RECENT_ERROR_LIMIT: usize = 5;
/// Longest error-trends window, in days.
pub const MAX_TREND_DAYS: i64 = 366;

/// Which listing or search endpoint a query arrived on.
#[derive(Debug, Clone, PartialEq)]
pub enum LogRoute {
    List,
    Level(LogLevel),
    Period,
    Search,
    SearchLevel(LogLevel),
    SearchSource,
    SearchContent,
    SearchKeyword,
    SearchPeriod,
}

impl LogRoute {
    fn criteria(&self, filter: &LogFilter) -> Result<Criteria, StoreError> {
        let criteria = match self {
            LogRoute::List => Criteria {
                level: filter.level,
                source_exact: filter.source.clone(),
                content: filter.content.clone(),
                keyword: filter.keyword.clone(),
                start: filter.start,
                end: filter.end,
                ..Criteria::default()
            },
            LogRoute::Search => Criteria {
                level: filter.level,
                source_contains: filter.source.clone(),
                content: filter.content.clone(),
                keyword: filter.keyword.clone(),
                start: filter.start,
                end: filter.end,
                ..Criteria::default()
            },
            LogRoute::Level(level) | LogRoute::SearchLevel(level) => Criteria {
                level: Some(*level),
                ..Criteria::default()
            },
            LogRoute::Period | LogRoute::SearchPeriod => {
                let (start, end) = filter
                    .period()
                    .ok_or_else(|| StoreError::InvalidRequest("start and end are required".to_string()))?;
                Criteria {
                    start: Some(start),
                    end: Some(end),
                    ..Criteria::default()
                }
            }
            LogRoute::SearchSource => Criteria {
                source_contains: Some(required(&filter.source, "source")?),
                ..Criteria::default()
            },
            LogRoute::SearchContent => Criteria {
                content: Some(required(&filter.content, "content")?),
                ..Criteria::default()
            },
            LogRoute::SearchKeyword => Criteria {
                keyword: Some(required(&filter.keyword, "keyword")?),
                ..Criteria::default()
            },
        };
        Ok(criteria)
    }
}

fn required(value: &Option<String>, name: &str) -> Result<String, StoreError> {
    value
        .clone()
        .ok_or_else(|| StoreError::InvalidRequest(format!("{} is required", name)))
}

#[derive(Debug, Default)]
struct Criteria {
    level: Option<LogLevel>,
    source_exact: Option<String>,
    source_contains: Option<String>,
    content: Option<String>,
    keyword: Option<String>,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
}

impl Criteria {
    fn matches(&self, entry: &LogEntry) -> bool {
        self.level.map_or(true, |level| entry.log_level == level)
            && self.source_exact.as_ref().map_or(true, |s| &entry.source == s)
            && self
                .source_contains
                .as_ref()
                .map_or(true, |s| contains_ignore_case(&entry.source, s))
            && self
                .content
                .as_ref()
                .map_or(true, |c| contains_ignore_case(&entry.content, c))
            && self.keyword.as_ref().map_or(true, |k| {
                contains_ignore_case(&entry.content, k) || contains_ignore_case(&entry.source, k)
            })
            && self.start.map_or(true, |start| entry.timestamp >= start)
            && self.end.map_or(true, |end| entry.timestamp <= end)
    }
}

/// Query parameters of the dashboard sub-resources.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AggregateQuery {
    #[serde(default, deserialize_with = "non_empty_instant")]
    pub start: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "non_empty_instant")]
    pub end: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "non_empty")]
    pub source: Option<String>,
    #[serde(default, deserialize_with = "non_empty")]
    pub date: Option<NaiveDate>,
}

impl AggregateQuery {
    /// Window ending at `end` (or `now`) and reaching back `fallback` when `start` is absent.
    pub fn window(&self, fallback: Duration, now: DateTime<Utc>) -> Result<TimeWindow, StoreError> {
        let end = self.end.unwrap_or(now);
        let start = self.start.unwrap_or(end - fallback);
        if end < start {
            return Err(StoreError::InvalidRequest("end must not be before start".to_string()));
        }
        Ok(TimeWindow::new(start, end))
    }
}

/// Host figures the store cannot derive from its rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemProfile {
    pub memory_usage: f64,
    pub avg_response_time: u32,
}

impl Default for SystemProfile {
    fn default() -> Self {
        Self {
            memory_usage: 42.5,
            avg_response_time: 85,
        }
    }
}

pub struct LogStore {
    rows: RwLock<Vec<LogEntry>>,
    next_id: AtomicU64,
    started_at: DateTime<Utc>,
    profile: SystemProfile,
}

impl LogStore {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self::with_profile(started_at, SystemProfile::default())
    }

    pub fn with_profile(started_at: DateTime<Utc>, profile: SystemProfile) -> Self {
        Self {
            rows: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
            started_at,
            profile,
        }
    }

    /// Store pre-filled with `count` generated rows from the three days before `now`.
    pub async fn seeded(count: usize, seed: u64, now: DateTime<Utc>) -> Self {
        let store = Self::new(now);
        let rows = MockDataGenerator::new(seed, now).generate(count);
        store.extend(rows, now).await;
        info!("Log store seeded with {} rows (seed {})", count, seed);
        store
    }

    pub async fn insert(&self, entry: NewLogEntry, now: DateTime<Utc>) -> LogEntry {
        let stored = self.materialize(entry, now);
        self.rows.write().await.push(stored.clone());
        debug!("Stored log entry {}", stored.id);
        stored
    }

    pub async fn extend<I>(&self, entries: I, now: DateTime<Utc>)
    where
        I: IntoIterator<Item = NewLogEntry>,
    {
        let stored: Vec<LogEntry> = entries.into_iter().map(|e| self.materialize(e, now)).collect();
        self.rows.write().await.extend(stored);
    }

    fn materialize(&self, entry: NewLogEntry, now: DateTime<Utc>) -> LogEntry {
        let id = self.next_id.fetch_add(1, AtomicOrdering::SeqCst);
        LogEntry {
            id: id.to_string(),
            timestamp: entry.timestamp.unwrap_or(now),
            source: entry.source,
            log_level: entry.log_level,
            content: entry.content,
            ip: entry.ip,
            user: entry.user,
        }
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }

    pub async fn query(&self, route: &LogRoute, filter: &LogFilter) -> Result<Page<LogEntry>, StoreError> {
        let size = filter.size.unwrap_or(DEFAULT_PAGE_SIZE);
        if size == 0 {
            return Err(StoreError::InvalidRequest("page size must not be less than one".to_string()));
        }
        let page = filter.page.unwrap_or(0);
        let criteria = route.criteria(filter)?;

        let mut matched: Vec<LogEntry> = {
            let rows = self.rows.read().await;
            rows.iter().filter(|e| criteria.matches(e)).cloned().collect()
        };
        sort_entries(
            &mut matched,
            filter.sort_by.as_deref(),
            filter.sort_dir.unwrap_or_default(),
        );

        debug!("{:?}: {} rows matched, serving page {} of size {}", route, matched.len(), page, size);
        Ok(Page::slice(matched, page, size))
    }

    pub async fn log_counts(&self, window: &TimeWindow, source: Option<&str>) -> LogCounts {
        let rows = self.rows.read().await;
        LogCounts::from_entries(rows.iter().filter(|e| {
            window.contains(&e.timestamp) && source.map_or(true, |s| contains_ignore_case(&e.source, s))
        }))
    }

    pub async fn hourly_stats(&self, date: NaiveDate) -> HourlyStats {
        let mut buckets = vec![LogCounts::default(); 24];
        {
            let rows = self.rows.read().await;
            for entry in rows.iter().filter(|e| e.timestamp.date_naive() == date) {
                buckets[entry.timestamp.hour() as usize].record(entry.log_level);
            }
        }

        HourlyStats {
            date,
            hourly_stats: buckets
                .iter()
                .enumerate()
                .map(|(hour, counts)| HourlyBucket {
                    hour: format!("{:02}:00", hour),
                    error: counts.error,
                    warn: counts.warn,
                    info: counts.info,
                    debug: counts.debug,
                    total: counts.total,
                })
                .collect(),
        }
    }

    async fn counts_by_source(&self, window: &TimeWindow) -> Vec<(String, LogCounts)> {
        let mut by_source: BTreeMap<String, LogCounts> = BTreeMap::new();
        {
            let rows = self.rows.read().await;
            for entry in rows.iter().filter(|e| window.contains(&e.timestamp)) {
                by_source.entry(entry.source.clone()).or_default().record(entry.log_level);
            }
        }
        let mut counts: Vec<(String, LogCounts)> = by_source.into_iter().collect();
        // BTreeMap order gives the source-ascending tie break.
        counts.sort_by(|a, b| b.1.total.cmp(&a.1.total));
        counts
    }

    pub async fn source_stats(&self, window: &TimeWindow) -> SourceStats {
        let counts = self.counts_by_source(window).await;
        SourceStats {
            start_time: Some(window.start),
            end_time: Some(window.end),
            source_stats: counts
                .into_iter()
                .map(|(source, c)| SourceCount { source, count: c.total })
                .collect(),
        }
    }

    pub async fn source_level_stats(&self, window: &TimeWindow) -> SourceLevelStats {
        let counts = self.counts_by_source(window).await;
        SourceLevelStats {
            start_time: Some(window.start),
            end_time: Some(window.end),
            source_level_stats: counts
                .into_iter()
                .map(|(source, c)| SourceLevelCount {
                    source,
                    error: c.error,
                    warn: c.warn,
                    info: c.info,
                    debug: c.debug,
                    total: c.total,
                })
                .collect(),
        }
    }

    pub async fn error_trends(&self, window: &TimeWindow) -> Result<ErrorTrends, StoreError> {
        let start_date = window.start.date_naive();
        let end_date = window.end.date_naive();
        if (end_date - start_date).num_days() > MAX_TREND_DAYS {
            return Err(StoreError::InvalidRequest(format!(
                "error trends window must not exceed {} days",
                MAX_TREND_DAYS
            )));
        }

        let mut per_day: BTreeMap<NaiveDate, LogCounts> = BTreeMap::new();
        {
            let rows = self.rows.read().await;
            for entry in rows.iter() {
                let day = entry.timestamp.date_naive();
                if day >= start_date && day <= end_date {
                    per_day.entry(day).or_default().record(entry.log_level);
                }
            }
        }

        let daily_stats = start_date
            .iter_days()
            .take_while(|day| *day <= end_date)
            .map(|date| {
                let counts = per_day.get(&date).cloned().unwrap_or_default();
                DailyErrorStat {
                    date,
                    total_logs: counts.total,
                    error_logs: counts.error,
                    error_rate: rate_percent(counts.error, counts.total),
                }
            })
            .collect();

        Ok(ErrorTrends {
            start_date: Some(start_date),
            end_date: Some(end_date),
            daily_stats,
        })
    }

    /// Processed rate is the average number of rows per hour over the last 24 hours;
    /// error rate is the error share over the same day.
    pub async fn system_status(&self, now: DateTime<Utc>) -> SystemStatus {
        let day = TimeWindow::new(now - Duration::hours(24), now);
        let counts = self.log_counts(&day, None).await;

        let error_rate = counts.error_rate;
        let avg_response_time = self.profile.avg_response_time;

        SystemStatus {
            uptime: format_uptime(now - self.started_at),
            memory_usage: self.profile.memory_usage,
            processed_rate: counts.total / 24,
            error_rate,
            avg_response_time,
            status: SystemHealth::from_metrics(error_rate, avg_response_time),
            timestamp: Some(now),
        }
    }

    pub async fn recent_errors(&self, now: DateTime<Utc>) -> RecentErrors {
        let mut errors: Vec<LogEntry> = {
            let rows = self.rows.read().await;
            rows.iter()
                .filter(|e| e.log_level == LogLevel::Error)
                .cloned()
                .collect()
        };
        sort_entries(&mut errors, Some("timestamp"), SortDir::Desc);
        errors.truncate(RECENT_ERROR_LIMIT);

        RecentErrors {
            timestamp: Some(now),
            recent_errors: errors,
        }
    }

    pub async fn dashboard_stats(&self, window: &TimeWindow, source: Option<&str>, now: DateTime<Utc>) -> DashboardStats {
        let error_trends = match self.error_trends(window).await {
            Ok(trends) => Some(trends),
            Err(e) => {
                warn!("Omitting error trends from combined stats: {}", e);
                None
            }
        };
        DashboardStats {
            log_counts: Some(self.log_counts(window, source).await),
            hourly_stats: Some(self.hourly_stats(window.end_date()).await),
            source_stats: Some(self.source_stats(window).await),
            source_level_stats: Some(self.source_level_stats(window).await),
            system_status: Some(self.system_status(now).await),
            recent_errors: Some(self.recent_errors(now).await),
            error_trends,
            timestamp: Some(now),
        }
    }
}

/// Stable sort; unknown fields sort by timestamp.
pub fn sort_entries(entries: &mut [LogEntry], sort_by: Option<&str>, dir: SortDir) {
    let key = sort_by.unwrap_or("timestamp");
    entries.sort_by(|a, b| {
        let ord = match key {
            "logLevel" | "level" => a.log_level.as_str().cmp(b.log_level.as_str()),
            "source" => a.source.cmp(&b.source),
            "id" => compare_ids(&a.id, &b.id),
            _ => a.timestamp.cmp(&b.timestamp),
        };
        match dir {
            SortDir::Asc => ord,
            SortDir::Desc => ord.reverse(),
        }
    });
}

fn compare_ids(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        _ => a.cmp(b),
    }
}

pub fn format_uptime(uptime: Duration) -> String {
    let uptime = uptime.max(Duration::zero());
    format!(
        "{}d {}h {}m",
        uptime.num_days(),
        uptime.num_hours() % 24,
        uptime.num_minutes() % 60
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, hour, 0, 0).unwrap()
    }

    fn new_entry(level: LogLevel, source: &str, content: &str, ts: DateTime<Utc>) -> NewLogEntry {
        NewLogEntry {
            source: source.to_string(),
            content: content.to_string(),
            log_level: level,
            timestamp: Some(ts),
            ip: None,
            user: None,
        }
    }

    async fn twelve_row_store() -> LogStore {
        let store = LogStore::new(at(1, 0));
        let rows = vec![
            new_entry(LogLevel::Error, "api-service", "Failed to connect to database", at(1, 1)),
            new_entry(LogLevel::Error, "payment-service", "Failed to process payment", at(1, 5)),
            new_entry(LogLevel::Error, "auth-service", "Failed to validate token", at(1, 23)),
            new_entry(LogLevel::Error, "api-service", "Failed to send notification", at(3, 2)),
            new_entry(LogLevel::Error, "user-service", "Failed to update profile", at(5, 9)),
            new_entry(LogLevel::Warn, "api-service", "Potential issue with cache", at(1, 2)),
            new_entry(LogLevel::Warn, "auth-service", "Potential issue with token", at(1, 3)),
            new_entry(LogLevel::Info, "user-service", "Successfully processed login", at(1, 4)),
            new_entry(LogLevel::Info, "api-service", "Successfully processed request", at(1, 6)),
            new_entry(LogLevel::Debug, "payment-service", "Checking status of payment", at(1, 7)),
            new_entry(LogLevel::Debug, "api-service", "Checking status of queue", at(4, 8)),
            new_entry(LogLevel::Info, "auth-service", "Successfully processed logout", at(6, 10)),
        ];
        store.extend(rows, at(7, 0)).await;
        store
    }

    #[tokio::test]
    async fn test_list_applies_all_filters() {
        let store = twelve_row_store().await;
        let filter = LogFilter::new()
            .page(0)
            .size(10)
            .level(LogLevel::Error)
            .between(at(1, 0), at(2, 0));

        let page = store.query(&LogRoute::List, &filter).await.unwrap();
        assert_eq!(page.content.len(), 3);
        assert_eq!(page.total_elements, 3);
        assert_eq!(page.total_pages, 1);
        // Newest first by default.
        assert_eq!(page.content[0].content, "Failed to validate token");
    }

    #[tokio::test]
    async fn test_pagination_past_the_end() {
        let store = LogStore::new(at(1, 0));
        let rows = (0..45).map(|i| new_entry(LogLevel::Info, "api-service", &format!("row {}", i), at(1, 0)));
        store.extend(rows, at(1, 0)).await;

        let filter = LogFilter::new().size(20);
        let page = store.query(&LogRoute::List, &filter.clone().page(2)).await.unwrap();
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.content.len(), 5);

        let beyond = store.query(&LogRoute::List, &filter.page(3)).await.unwrap();
        assert!(beyond.content.is_empty());
        assert_eq!(beyond.total_elements, 45);
    }

    #[tokio::test]
    async fn test_zero_page_size_rejected() {
        let store = twelve_row_store().await;
        let err = store.query(&LogRoute::List, &LogFilter::new().size(0)).await.unwrap_err();
        assert_eq!(err, StoreError::InvalidRequest("page size must not be less than one".into()));
    }

    #[tokio::test]
    async fn test_period_requires_both_bounds() {
        let store = twelve_row_store().await;
        let mut filter = LogFilter::new();
        filter.start = Some(at(1, 0));
        assert!(store.query(&LogRoute::Period, &filter).await.is_err());
    }

    #[tokio::test]
    async fn test_search_routes() {
        let store = twelve_row_store().await;

        let by_source = store
            .query(&LogRoute::SearchSource, &LogFilter::new().source("PAYMENT"))
            .await
            .unwrap();
        assert_eq!(by_source.total_elements, 2);

        let by_keyword = store
            .query(&LogRoute::SearchKeyword, &LogFilter::new().keyword("auth"))
            .await
            .unwrap();
        assert_eq!(by_keyword.total_elements, 3);

        // Specialized routes ignore unrelated criteria.
        let by_level = store
            .query(&LogRoute::SearchLevel(LogLevel::Warn), &LogFilter::new().source("nope"))
            .await
            .unwrap();
        assert_eq!(by_level.total_elements, 2);

        let missing = store.query(&LogRoute::SearchContent, &LogFilter::new()).await;
        assert!(missing.is_err());
    }

    #[tokio::test]
    async fn test_sort_by_source_ascending() {
        let store = twelve_row_store().await;
        let page = store
            .query(&LogRoute::List, &LogFilter::new().sort("source", SortDir::Asc))
            .await
            .unwrap();
        let sources: Vec<&str> = page.content.iter().map(|e| e.source.as_str()).collect();
        let mut sorted = sources.clone();
        sorted.sort();
        assert_eq!(sources, sorted);
    }

    #[tokio::test]
    async fn test_aggregations() {
        let store = twelve_row_store().await;
        let window = TimeWindow::new(at(1, 0), at(1, 23));

        let counts = store.log_counts(&window, None).await;
        assert_eq!(counts.total, 8);
        assert_eq!(counts.error, 3);
        assert_eq!(counts.error_rate, 37.5);

        let hourly = store.hourly_stats(at(1, 0).date_naive()).await;
        assert_eq!(hourly.hourly_stats.len(), 24);
        assert_eq!(hourly.hourly_stats[5].hour, "05:00");
        assert_eq!(hourly.hourly_stats[5].error, 1);

        let sources = store.source_stats(&window).await;
        assert_eq!(sources.source_stats[0].source, "api-service");
        assert_eq!(sources.source_stats[0].count, 3);

        let levels = store.source_level_stats(&window).await;
        let auth = levels.source_level_stats.iter().find(|s| s.source == "auth-service").unwrap();
        assert_eq!((auth.error, auth.warn, auth.total), (1, 1, 2));
    }

    #[tokio::test]
    async fn test_error_trends_cover_every_day() {
        let store = twelve_row_store().await;
        let trends = store.error_trends(&TimeWindow::new(at(1, 0), at(6, 12))).await.unwrap();

        assert_eq!(trends.daily_stats.len(), 6);
        assert_eq!(trends.daily_stats[0].total_logs, 8);
        assert_eq!(trends.daily_stats[0].error_logs, 3);
        assert_eq!(trends.daily_stats[0].error_rate, 37.5);
        assert_eq!(trends.daily_stats[1].total_logs, 0);
        assert_eq!(trends.daily_stats[1].error_rate, 0.0);
    }

    #[tokio::test]
    async fn test_error_trends_reject_unbounded_window() {
        let store = twelve_row_store().await;
        let ancient = Utc.with_ymd_and_hms(1, 1, 1, 0, 0, 0).unwrap();

        let err = store.error_trends(&TimeWindow::new(ancient, at(6, 0))).await.unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.to_string(), "error trends window must not exceed 366 days");

        let year = store
            .error_trends(&TimeWindow::new(at(1, 0) - Duration::days(MAX_TREND_DAYS), at(1, 0)))
            .await
            .unwrap();
        assert_eq!(year.daily_stats.len(), MAX_TREND_DAYS as usize + 1);

        let combined = store.dashboard_stats(&TimeWindow::new(ancient, at(6, 0)), None, at(7, 0)).await;
        assert!(combined.error_trends.is_none());
        assert!(combined.log_counts.is_some());
    }

    #[tokio::test]
    async fn test_recent_errors_newest_first() {
        let store = twelve_row_store().await;
        let recent = store.recent_errors(at(7, 0)).await;
        assert_eq!(recent.recent_errors.len(), 5);
        assert_eq!(recent.recent_errors[0].content, "Failed to update profile");
    }

    #[tokio::test]
    async fn test_system_status() {
        let store = twelve_row_store().await;
        let status = store.system_status(at(2, 0)).await;
        assert_eq!(status.uptime, "1d 0h 0m");
        assert_eq!(status.error_rate, 37.5);
        assert_eq!(status.processed_rate, 0);
        assert_eq!(status.status, SystemHealth::Degraded);
    }

    #[test]
    fn test_aggregate_query_window() {
        let now = at(3, 0);
        let query: AggregateQuery = serde_urlencoded::from_str("start=&source=api").unwrap();
        let window = query.window(Duration::hours(24), now).unwrap();
        assert_eq!(window.start, at(2, 0));
        assert_eq!(query.source.as_deref(), Some("api"));

        let reversed = AggregateQuery {
            start: Some(at(3, 0)),
            end: Some(at(2, 0)),
            ..AggregateQuery::default()
        };
        assert!(reversed.window(Duration::hours(24), now).is_err());
    }
}
