// services/logpulse-client/src/fixture.rs
//
// In-process transport that answers the REST surface from a LogStore
// Used by demo mode and the client tests
//

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use tokio::sync::Mutex;
use tracing::debug;

use svckit::errors::{ApiError, StoreError};
use svckit::filter::LogFilter;
use svckit::store::{AggregateQuery, LogRoute, LogStore};
use svckit::types::{DashboardField, LogLevel, NewLogEntry};

use crate::api::{Method, OutboundRequest, RawResponse, Transport};

pub struct FixtureTransport {
    store: Arc<LogStore>,
    clock: Option<DateTime<Utc>>,
    omitted: HashSet<DashboardField>,
    canned: HashMap<String, RawResponse>,
    requests: Mutex<Vec<String>>,
}

impl FixtureTransport {
    pub fn new(store: Arc<LogStore>) -> Self {
        Self {
            store,
            clock: None,
            omitted: HashSet::new(),
            canned: HashMap::new(),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Pins "now" for windows, uptime and created entries.
    pub fn with_clock(mut self, now: DateTime<Utc>) -> Self {
        self.clock = Some(now);
        self
    }

    /// Leaves `field` out of the combined `/dashboard/stats` payload.
    pub fn omit_combined(mut self, field: DashboardField) -> Self {
        self.omitted.insert(field);
        self
    }

    /// Answers `path` (query ignored) with `response` instead of the store.
    pub fn respond(mut self, path: &str, response: RawResponse) -> Self {
        self.canned.insert(path.to_string(), response);
        self
    }

    /// Makes `path` fail with `status` and a `{"message"}` body.
    pub fn fail(self, path: &str, status: u16, message: &str) -> Self {
        let body = json!({ "message": message }).to_string().into_bytes();
        self.respond(path, RawResponse::new(status, body))
    }

    pub fn store(&self) -> &Arc<LogStore> {
        &self.store
    }

    /// Every request seen so far as `"METHOD endpoint"`.
    pub async fn requests(&self) -> Vec<String> {
        self.requests.lock().await.clone()
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.unwrap_or_else(Utc::now)
    }

    async fn dispatch(&self, request: &OutboundRequest) -> Result<RawResponse, ApiError> {
        let (path, query) = split_endpoint(&request.endpoint);

        if let Some(canned) = self.canned.get(path) {
            return Ok(canned.clone());
        }

        let result = match request.method {
            Method::Get => self.get(path, query).await,
            Method::Post => self.post(path, request.body.as_deref()).await,
        };

        match result {
            Ok(response) => Ok(response),
            Err(Rejection::Store(e)) => RawResponse::json(e.status_code(), &json!({ "message": e.to_string() })),
            Err(Rejection::Api(e)) => Err(e),
        }
    }

    async fn get(&self, path: &str, query: &str) -> Result<RawResponse, Rejection> {
        let now = self.now();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        match segments.as_slice() {
            ["logs"] => self.page(LogRoute::List, query).await,
            ["logs", "level", level] => self.page(LogRoute::Level(parse_level(level)?), query).await,
            ["logs", "period"] => self.page(LogRoute::Period, query).await,
            ["logs", "search"] => self.page(LogRoute::Search, query).await,
            ["logs", "search", "level", level] => self.page(LogRoute::SearchLevel(parse_level(level)?), query).await,
            ["logs", "search", "source"] => self.page(LogRoute::SearchSource, query).await,
            ["logs", "search", "content"] => self.page(LogRoute::SearchContent, query).await,
            ["logs", "search", "keyword"] => self.page(LogRoute::SearchKeyword, query).await,
            ["logs", "search", "period"] => self.page(LogRoute::SearchPeriod, query).await,
            ["dashboard", "stats"] => {
                let params: AggregateQuery = parse_query(query)?;
                let window = params.window(Duration::hours(24), now)?;
                let mut stats = self.store.dashboard_stats(&window, params.source.as_deref(), now).await;
                for field in &self.omitted {
                    stats.clear(*field);
                }
                ok(&stats)
            }
            ["dashboard", "log-counts"] => {
                let params: AggregateQuery = parse_query(query)?;
                let window = params.window(Duration::hours(24), now)?;
                ok(&self.store.log_counts(&window, params.source.as_deref()).await)
            }
            ["dashboard", "hourly-stats"] => {
                let params: AggregateQuery = parse_query(query)?;
                let date: NaiveDate = params.date.unwrap_or_else(|| now.date_naive());
                ok(&self.store.hourly_stats(date).await)
            }
            ["dashboard", "source-stats"] => {
                let params: AggregateQuery = parse_query(query)?;
                ok(&self.store.source_stats(&params.window(Duration::hours(24), now)?).await)
            }
            ["dashboard", "source-level-stats"] => {
                let params: AggregateQuery = parse_query(query)?;
                ok(&self.store.source_level_stats(&params.window(Duration::hours(24), now)?).await)
            }
            ["dashboard", "error-trends"] => {
                let params: AggregateQuery = parse_query(query)?;
                ok(&self.store.error_trends(&params.window(Duration::days(7), now)?).await?)
            }
            ["dashboard", "system-status"] | ["system", "status"] => ok(&self.store.system_status(now).await),
            ["dashboard", "recent-errors"] => ok(&self.store.recent_errors(now).await),
            _ => Err(StoreError::NotFound(format!("no route for GET {}", path)).into()),
        }
    }

    async fn post(&self, path: &str, body: Option<&[u8]>) -> Result<RawResponse, Rejection> {
        if path.trim_end_matches('/') != "/logs" {
            return Err(StoreError::NotFound(format!("no route for POST {}", path)).into());
        }
        let entry: NewLogEntry = serde_json::from_slice(body.unwrap_or_default())
            .map_err(|e| StoreError::InvalidRequest(format!("invalid log entry: {}", e)))?;
        let stored = self.store.insert(entry, self.now()).await;
        Ok(RawResponse::json(201, &stored)?)
    }

    async fn page(&self, route: LogRoute, query: &str) -> Result<RawResponse, Rejection> {
        let filter: LogFilter = parse_query(query)?;
        let page = self.store.query(&route, &filter).await?;
        ok(&page)
    }
}

#[async_trait]
impl Transport for FixtureTransport {
    async fn send(&self, request: OutboundRequest) -> Result<RawResponse, ApiError> {
        self.requests
            .lock()
            .await
            .push(format!("{} {}", request.method, request.endpoint));

        let response = self.dispatch(&request).await?;
        debug!("fixture {} {} -> {}", request.method, request.endpoint, response.status);
        Ok(response)
    }

    fn name(&self) -> &'static str {
        "fixture"
    }
}

enum Rejection {
    Store(StoreError),
    Api(ApiError),
}

impl From<StoreError> for Rejection {
    fn from(err: StoreError) -> Self {
        Rejection::Store(err)
    }
}

impl From<ApiError> for Rejection {
    fn from(err: ApiError) -> Self {
        Rejection::Api(err)
    }
}

fn ok<T: Serialize>(value: &T) -> Result<RawResponse, Rejection> {
    Ok(RawResponse::json(200, value)?)
}

fn split_endpoint(endpoint: &str) -> (&str, &str) {
    match endpoint.split_once('?') {
        Some((path, query)) => (path, query),
        None => (endpoint, ""),
    }
}

fn parse_query<T: DeserializeOwned>(query: &str) -> Result<T, StoreError> {
    serde_urlencoded::from_str(query).map_err(|e| StoreError::InvalidRequest(e.to_string()))
}

fn parse_level(raw: &str) -> Result<LogLevel, StoreError> {
    raw.parse()
        .map_err(|_| StoreError::InvalidRequest(format!("unknown log level: {}", raw)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{interpret, ApiResponse};
    use chrono::TimeZone;
    use svckit::types::{ErrorTrends, HourlyStats};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn get(endpoint: &str) -> OutboundRequest {
        OutboundRequest {
            method: Method::Get,
            endpoint: endpoint.to_string(),
            headers: Vec::new(),
            body: None,
        }
    }

    async fn fixture() -> FixtureTransport {
        let store = Arc::new(LogStore::seeded(60, 3, now()).await);
        FixtureTransport::new(store).with_clock(now())
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let transport = fixture().await;
        let response = transport.send(get("/nope")).await.unwrap();
        assert_eq!(response.status, 404);
        let err = interpret(response).unwrap_err();
        assert_eq!(err.to_string(), "no route for GET /nope");
    }

    #[tokio::test]
    async fn test_bad_level_is_400() {
        let transport = fixture().await;
        let response = transport.send(get("/logs/level/TRACE")).await.unwrap();
        assert_eq!(response.status, 400);
    }

    #[tokio::test]
    async fn test_zero_size_is_400() {
        let transport = fixture().await;
        let err = interpret(transport.send(get("/logs?size=0")).await.unwrap()).unwrap_err();
        assert_eq!(err.to_string(), "page size must not be less than one");
    }

    #[tokio::test]
    async fn test_omitted_field_is_absent() {
        let transport = fixture().await.omit_combined(DashboardField::RecentErrors);
        let response = interpret(transport.send(get("/dashboard/stats")).await.unwrap()).unwrap();
        let ApiResponse::Json(value) = response else {
            panic!("expected a body");
        };
        assert!(value.get("recentErrors").is_none());
        assert!(value.get("logCounts").is_some());
    }

    #[tokio::test]
    async fn test_canned_and_recorded() {
        let transport = fixture()
            .await
            .respond("/logs", RawResponse::new(204, Vec::new()))
            .fail("/dashboard/stats", 503, "maintenance");

        let logs = transport.send(get("/logs?page=1")).await.unwrap();
        assert_eq!(logs.status, 204);
        let stats = interpret(transport.send(get("/dashboard/stats")).await.unwrap()).unwrap_err();
        assert_eq!(stats.to_string(), "maintenance");

        assert_eq!(
            transport.requests().await,
            vec!["GET /logs?page=1".to_string(), "GET /dashboard/stats".to_string()]
        );
    }

    #[tokio::test]
    async fn test_post_creates_entry() {
        let transport = fixture().await;
        let before = transport.store().len().await;
        let request = OutboundRequest {
            method: Method::Post,
            endpoint: "/logs".to_string(),
            headers: Vec::new(),
            body: Some(br#"{"source":"api-service","content":"hello","logLevel":"info"}"#.to_vec()),
        };

        let response = transport.send(request).await.unwrap();
        assert_eq!(response.status, 201);
        assert_eq!(transport.store().len().await, before + 1);
    }

    #[tokio::test]
    async fn test_post_rejects_incomplete_entry() {
        let transport = fixture().await;
        let request = OutboundRequest {
            method: Method::Post,
            endpoint: "/logs".to_string(),
            headers: Vec::new(),
            body: Some(br#"{"source":"x"}"#.to_vec()),
        };

        let response = transport.send(request).await.unwrap();
        assert_eq!(response.status, 400);
        let err = interpret(response).unwrap_err();
        assert!(err.to_string().starts_with("invalid log entry: missing field"));
    }

    #[tokio::test]
    async fn test_hourly_stats_default_to_today() {
        let transport = fixture().await;
        let response = interpret(transport.send(get("/dashboard/hourly-stats")).await.unwrap()).unwrap();
        let stats: HourlyStats = response.into_json().unwrap().unwrap();
        assert_eq!(stats.date, now().date_naive());
        assert_eq!(stats.hourly_stats.len(), 24);
    }

    #[tokio::test]
    async fn test_error_trends_default_to_seven_days() {
        let transport = fixture().await;
        let response = interpret(transport.send(get("/dashboard/error-trends")).await.unwrap()).unwrap();
        let trends: ErrorTrends = response.into_json().unwrap().unwrap();
        assert_eq!(trends.start_date, Some(now().date_naive() - Duration::days(7)));
        assert_eq!(trends.end_date, Some(now().date_naive()));
        assert_eq!(trends.daily_stats.len(), 8);
    }

    #[tokio::test]
    async fn test_error_trends_window_is_capped() {
        let transport = fixture().await;
        let response = transport
            .send(get("/dashboard/error-trends?start=0001-01-01T00:00:00Z"))
            .await
            .unwrap();
        assert_eq!(response.status, 400);
    }
}
