// services/logpulse-client/src/dashboard.rs
//
// Dashboard aggregations: one call per aggregate, or the combined call with
// per-field fallback to the dedicated endpoints
//

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use svckit::errors::ApiError;
use svckit::query_builder::QueryBuilder;
use svckit::time_range::{TimeRange, TimeWindow};
use svckit::types::{
    timestamp, DashboardField, DashboardStats, ErrorTrends, HourlyStats, LogCounts, RecentErrors, SourceLevelStats,
    SourceStats, SystemStatus,
};

use crate::client::LogPulseClient;

/// Aggregation that could not be filled, neither from the combined payload
/// nor from its own endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldFailure {
    pub field: DashboardField,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
    pub stats: DashboardStats,
    #[serde(skip)]
    pub window: Option<TimeWindow>,
    /// Fields taken from dedicated calls rather than the combined payload.
    pub fallbacks: Vec<DashboardField>,
    pub failures: Vec<FieldFailure>,
}

impl DashboardSnapshot {
    pub fn is_complete(&self) -> bool {
        self.stats.missing().is_empty()
    }

    pub fn failure(&self, field: DashboardField) -> Option<&FieldFailure> {
        self.failures.iter().find(|f| f.field == field)
    }
}

fn window_query(window: &TimeWindow) -> QueryBuilder {
    QueryBuilder::new()
        .param("start", Some(timestamp::format(&window.start)))
        .param("end", Some(timestamp::format(&window.end)))
}

impl LogPulseClient {
    async fn fetch<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, ApiError> {
        self.api
            .get(endpoint)
            .await?
            .ok_or_else(|| ApiError::Decode(format!("{} answered without a body", endpoint)))
    }

    pub async fn get_log_counts(&self, window: &TimeWindow, source: Option<&str>) -> Result<LogCounts, ApiError> {
        let query = window_query(window).param("source", source);
        self.fetch(&query.append_to("/dashboard/log-counts")).await
    }

    pub async fn get_hourly_stats(&self, date: NaiveDate) -> Result<HourlyStats, ApiError> {
        let query = QueryBuilder::new().param("date", Some(date));
        self.fetch(&query.append_to("/dashboard/hourly-stats")).await
    }

    pub async fn get_source_stats(&self, window: &TimeWindow) -> Result<SourceStats, ApiError> {
        self.fetch(&window_query(window).append_to("/dashboard/source-stats")).await
    }

    pub async fn get_source_level_stats(&self, window: &TimeWindow) -> Result<SourceLevelStats, ApiError> {
        self.fetch(&window_query(window).append_to("/dashboard/source-level-stats")).await
    }

    pub async fn get_error_trends(&self, window: &TimeWindow) -> Result<ErrorTrends, ApiError> {
        self.fetch(&window_query(window).append_to("/dashboard/error-trends")).await
    }

    pub async fn get_system_status(&self) -> Result<SystemStatus, ApiError> {
        self.fetch("/dashboard/system-status").await
    }

    pub async fn get_recent_errors(&self) -> Result<RecentErrors, ApiError> {
        self.fetch("/dashboard/recent-errors").await
    }

    /// Superseded by `get_system_status`; kept for older backends.
    pub async fn get_legacy_system_status(&self) -> Result<SystemStatus, ApiError> {
        self.fetch("/system/status").await
    }

    /// The combined payload as sent, missing fields included.
    pub async fn get_combined_stats(&self, window: &TimeWindow, source: Option<&str>) -> Result<DashboardStats, ApiError> {
        let query = window_query(window).param("source", source);
        self.fetch(&query.append_to("/dashboard/stats")).await
    }

    /// Dashboard for `range` ending now.
    pub async fn get_dashboard_stats(&self, range: TimeRange, source: Option<&str>) -> DashboardSnapshot {
        let window = range.resolve(self.now());
        self.get_dashboard_window(&window, source).await
    }

    /// Combined call first; every field it lacks, or all of them when it
    /// fails, comes from its own endpoint. Fallbacks run one after another
    /// and a failing one does not stop the rest.
    pub async fn get_dashboard_window(&self, window: &TimeWindow, source: Option<&str>) -> DashboardSnapshot {
        let mut stats = match self.get_combined_stats(window, source).await {
            Ok(stats) => stats,
            Err(e) => {
                warn!("Combined dashboard call failed, falling back to individual calls: {}", e);
                DashboardStats::default()
            }
        };

        let mut fallbacks = Vec::new();
        let mut failures = Vec::new();
        for field in stats.missing() {
            debug!("Fetching {} individually", field);
            fallbacks.push(field);
            if let Err(e) = self.fill_field(&mut stats, field, window, source).await {
                warn!("Dashboard field {} unavailable: {}", field, e);
                failures.push(FieldFailure {
                    field,
                    message: e.to_string(),
                });
            }
        }

        if stats.timestamp.is_none() {
            stats.timestamp = Some(self.now());
        }
        info!(
            "Dashboard assembled: {} fallbacks, {} failures",
            fallbacks.len(),
            failures.len()
        );

        DashboardSnapshot {
            stats,
            window: Some(*window),
            fallbacks,
            failures,
        }
    }

    async fn fill_field(
        &self,
        stats: &mut DashboardStats,
        field: DashboardField,
        window: &TimeWindow,
        source: Option<&str>,
    ) -> Result<(), ApiError> {
        match field {
            DashboardField::LogCounts => stats.log_counts = Some(self.get_log_counts(window, source).await?),
            DashboardField::HourlyStats => stats.hourly_stats = Some(self.get_hourly_stats(window.end_date()).await?),
            DashboardField::SourceStats => stats.source_stats = Some(self.get_source_stats(window).await?),
            DashboardField::SourceLevelStats => {
                stats.source_level_stats = Some(self.get_source_level_stats(window).await?)
            }
            DashboardField::ErrorTrends => stats.error_trends = Some(self.get_error_trends(window).await?),
            DashboardField::SystemStatus => stats.system_status = Some(self.get_system_status().await?),
            DashboardField::RecentErrors => stats.recent_errors = Some(self.get_recent_errors().await?),
        }
        Ok(())
    }
}
