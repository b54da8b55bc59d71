// services/logpulse-client/src/logs.rs
//
// Log listing and search: endpoint selection plus paging
//

use tracing::debug;

use svckit::errors::ApiError;
use svckit::filter::LogFilter;
use svckit::query_builder::QueryBuilder;
use svckit::types::{timestamp, LogEntry, NewLogEntry, Page, PageBody};

use crate::client::LogPulseClient;

/// Endpoint for `get_logs`.
///
/// Level-only and period-only listings without explicit paging go to their
/// dedicated routes; everything else goes to `/logs` with the full filter.
pub fn logs_endpoint(filter: &LogFilter) -> String {
    if !filter.has_paging() {
        if let Some(level) = filter.level {
            return sort_only(filter, QueryBuilder::new()).append_to(&format!("/logs/level/{}", level));
        }
        if let Some((start, end)) = filter.period() {
            let query = QueryBuilder::new()
                .param("start", Some(timestamp::format(&start)))
                .param("end", Some(timestamp::format(&end)));
            return sort_only(filter, query).append_to("/logs/period");
        }
    }
    filter.to_query().append_to("/logs")
}

/// Endpoint for `search_logs`: level, source, content, keyword, period, in
/// that precedence, then the generic search.
pub fn search_endpoint(filter: &LogFilter) -> String {
    if let Some(level) = filter.level {
        return filter
            .push_paging(QueryBuilder::new())
            .append_to(&format!("/logs/search/level/{}", level));
    }
    if let Some(source) = filter.source.as_deref().filter(|s| !s.is_empty()) {
        let query = QueryBuilder::new().param("source", Some(source));
        return filter.push_paging(query).append_to("/logs/search/source");
    }
    if let Some(content) = filter.content.as_deref().filter(|s| !s.is_empty()) {
        let query = QueryBuilder::new().param("content", Some(content));
        return filter.push_paging(query).append_to("/logs/search/content");
    }
    if let Some(keyword) = filter.keyword.as_deref().filter(|s| !s.is_empty()) {
        let query = QueryBuilder::new().param("keyword", Some(keyword));
        return filter.push_paging(query).append_to("/logs/search/keyword");
    }
    if let Some((start, end)) = filter.period() {
        let query = QueryBuilder::new()
            .param("start", Some(timestamp::format(&start)))
            .param("end", Some(timestamp::format(&end)));
        return filter.push_paging(query).append_to("/logs/search/period");
    }
    filter.to_query().append_to("/logs/search")
}

fn sort_only(filter: &LogFilter, builder: QueryBuilder) -> QueryBuilder {
    builder
        .param("sortBy", filter.sort_by.as_deref())
        .param("sortDir", filter.sort_dir)
}

impl LogPulseClient {
    pub async fn get_logs(&self, filter: &LogFilter) -> Result<Page<LogEntry>, ApiError> {
        self.fetch_page(&logs_endpoint(filter)).await
    }

    pub async fn search_logs(&self, filter: &LogFilter) -> Result<Page<LogEntry>, ApiError> {
        self.fetch_page(&search_endpoint(filter)).await
    }

    pub async fn create_log(&self, entry: &NewLogEntry) -> Result<LogEntry, ApiError> {
        self.api
            .post("/logs", entry)
            .await?
            .ok_or_else(|| ApiError::Decode("create log answered without a body".to_string()))
    }

    async fn fetch_page(&self, endpoint: &str) -> Result<Page<LogEntry>, ApiError> {
        let page = match self.api.get::<PageBody<LogEntry>>(endpoint).await? {
            Some(body) => Page::from(body),
            None => Page::empty(),
        };
        debug!(
            "{}: {} of {} entries (page {} of {})",
            endpoint,
            page.content.len(),
            page.total_elements,
            page.number,
            page.total_pages
        );
        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::{DateTime, TimeZone, Utc};
    use svckit::filter::SortDir;
    use svckit::store::LogStore;
    use svckit::types::LogLevel;

    use crate::api::RawResponse;
    use crate::fixture::FixtureTransport;

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, hour, 0, 0).unwrap()
    }

    fn entry(level: LogLevel, source: &str, content: &str, ts: DateTime<Utc>) -> NewLogEntry {
        NewLogEntry {
            source: source.to_string(),
            content: content.to_string(),
            log_level: level,
            timestamp: Some(ts),
            ip: None,
            user: None,
        }
    }

    /// Twelve rows, three of them ERROR on 2024-01-01.
    async fn twelve_rows() -> Arc<LogStore> {
        let store = LogStore::new(at(1, 0));
        store
            .extend(
                vec![
                    entry(LogLevel::Error, "api-service", "Failed to connect to database", at(1, 1)),
                    entry(LogLevel::Error, "payment-service", "Failed to process payment", at(1, 5)),
                    entry(LogLevel::Error, "auth-service", "Failed to validate token", at(1, 23)),
                    entry(LogLevel::Error, "api-service", "Failed to send notification", at(3, 2)),
                    entry(LogLevel::Warn, "api-service", "Potential issue with cache", at(1, 2)),
                    entry(LogLevel::Warn, "auth-service", "Potential issue with token", at(1, 3)),
                    entry(LogLevel::Info, "user-service", "Successfully processed login", at(1, 4)),
                    entry(LogLevel::Info, "api-service", "Successfully processed request", at(1, 6)),
                    entry(LogLevel::Debug, "payment-service", "Checking status of payment", at(1, 7)),
                    entry(LogLevel::Debug, "api-service", "Checking status of queue", at(4, 8)),
                    entry(LogLevel::Info, "auth-service", "Successfully processed logout", at(6, 10)),
                    entry(LogLevel::Warn, "user-service", "Potential issue with profile", at(2, 1)),
                ],
                at(7, 0),
            )
            .await;
        Arc::new(store)
    }

    #[test]
    fn test_level_without_paging_uses_level_route() {
        let filter = LogFilter::new().level(LogLevel::Warn).sort("source", SortDir::Asc);
        assert_eq!(logs_endpoint(&filter), "/logs/level/WARN?sortBy=source&sortDir=asc");
    }

    #[test]
    fn test_period_without_paging_uses_period_route() {
        let filter = LogFilter::new().between(at(1, 0), at(2, 0));
        assert_eq!(
            logs_endpoint(&filter),
            "/logs/period?start=2024-01-01T00%3A00%3A00Z&end=2024-01-02T00%3A00%3A00Z"
        );
    }

    #[test]
    fn test_paging_uses_generic_route() {
        let filter = LogFilter::new().page(0).size(10).level(LogLevel::Error);
        assert_eq!(logs_endpoint(&filter), "/logs?page=0&size=10&level=ERROR");
        assert_eq!(logs_endpoint(&LogFilter::new()), "/logs");
    }

    #[test]
    fn test_search_precedence() {
        let filter = LogFilter::new().level(LogLevel::Error).source("api").keyword("disk");
        assert_eq!(search_endpoint(&filter), "/logs/search/level/ERROR");

        let filter = LogFilter::new().source("api").content("disk").page(1);
        assert_eq!(search_endpoint(&filter), "/logs/search/source?source=api&page=1");

        let filter = LogFilter::new().keyword("disk full").size(5);
        assert_eq!(search_endpoint(&filter), "/logs/search/keyword?keyword=disk+full&size=5");

        let filter = LogFilter::new().between(at(1, 0), at(2, 0)).sort("id", SortDir::Desc);
        assert_eq!(
            search_endpoint(&filter),
            "/logs/search/period?start=2024-01-01T00%3A00%3A00Z&end=2024-01-02T00%3A00%3A00Z&sortBy=id&sortDir=desc"
        );

        assert_eq!(search_endpoint(&LogFilter::new().page(0)), "/logs/search?page=0");
    }

    #[tokio::test]
    async fn test_error_rows_for_one_day() {
        let client = LogPulseClient::fixture(twelve_rows().await);
        let filter = LogFilter::new()
            .page(0)
            .size(10)
            .level(LogLevel::Error)
            .between(at(1, 0), at(2, 0));

        let page = client.get_logs(&filter).await.unwrap();
        assert_eq!(page.content.len(), 3);
        assert_eq!(page.total_elements, 3);
        assert_eq!(page.total_pages, 1);
        assert!(page.content.iter().all(|e| e.log_level == LogLevel::Error));
    }

    #[tokio::test]
    async fn test_level_route_without_paging_gets_server_defaults() {
        let client = LogPulseClient::fixture(twelve_rows().await);
        let page = client.get_logs(&LogFilter::new().level(LogLevel::Warn)).await.unwrap();
        assert_eq!(page.total_elements, 3);
        assert_eq!(page.size, 20);
        assert_eq!(page.number, 0);
    }

    #[tokio::test]
    async fn test_search_by_source_substring() {
        let client = LogPulseClient::fixture(twelve_rows().await);
        let page = client.search_logs(&LogFilter::new().source("Auth")).await.unwrap();
        assert_eq!(page.total_elements, 3);
    }

    #[tokio::test]
    async fn test_pages_of_forty_five() {
        let store = LogStore::new(at(1, 0));
        store
            .extend(
                (0..45).map(|i| entry(LogLevel::Info, "api-service", &format!("row {}", i), at(1, 0))),
                at(1, 0),
            )
            .await;
        let client = LogPulseClient::fixture(Arc::new(store));

        let third = client.get_logs(&LogFilter::new().page(2).size(20)).await.unwrap();
        assert_eq!(third.total_pages, 3);
        assert_eq!(third.content.len(), 5);

        let fourth = client.get_logs(&LogFilter::new().page(3).size(20)).await.unwrap();
        assert!(fourth.is_empty());
        assert_eq!(fourth.total_elements, 45);
    }

    #[tokio::test]
    async fn test_no_content_is_empty_page() {
        let transport = FixtureTransport::new(twelve_rows().await).respond("/logs", RawResponse::new(204, Vec::new()));
        let client = LogPulseClient::new(Arc::new(transport));
        let page = client.get_logs(&LogFilter::new().page(0)).await.unwrap();
        assert!(page.is_empty());
        assert_eq!(page.total_elements, 0);
    }

    #[tokio::test]
    async fn test_bare_array_becomes_one_page() {
        let body = br#"[{"id":7,"createdAt":"2024-01-01T10:00:00","source":"api","logLevel":"INFO","content":"ok"}]"#;
        let transport = FixtureTransport::new(twelve_rows().await)
            .respond("/logs/level/INFO", RawResponse::new(200, body.to_vec()));
        let client = LogPulseClient::new(Arc::new(transport));

        let page = client.get_logs(&LogFilter::new().level(LogLevel::Info)).await.unwrap();
        assert_eq!(page.total_elements, 1);
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.content[0].id, "7");
        assert_eq!(page.content[0].timestamp, at(1, 10));
    }

    #[tokio::test]
    async fn test_create_log_assigns_id() {
        let store = twelve_rows().await;
        let client = LogPulseClient::fixture(store.clone());
        let created = client
            .create_log(&entry(LogLevel::Info, "cli", "manual entry", at(7, 0)))
            .await
            .unwrap();

        assert_eq!(created.id, "13");
        assert_eq!(created.source, "cli");
        assert_eq!(store.len().await, 13);
    }
}
