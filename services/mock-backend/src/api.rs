// services/mock-backend/src/api.rs
//
// axum router serving the LogPulse REST API from a LogStore
//

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{rejection::PathRejection, Path, RawQuery, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use chrono::{Duration, Utc};
use serde::de::DeserializeOwned;
use serde_json::json;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};

use svckit::errors::StoreError;
use svckit::filter::LogFilter;
use svckit::metrics;
use svckit::store::{AggregateQuery, LogRoute, LogStore};
use svckit::types::{
    DashboardStats, ErrorTrends, HourlyStats, LogCounts, LogEntry, LogLevel, NewLogEntry, Page, RecentErrors,
    SourceLevelStats, SourceStats, SystemStatus,
};

type Store = State<Arc<LogStore>>;
type ApiResult<T> = Result<Json<T>, ApiFailure>;

/// Store rejection rendered as `{"message": ...}` with its status code.
pub struct ApiFailure(StoreError);

impl From<StoreError> for ApiFailure {
    fn from(err: StoreError) -> Self {
        ApiFailure(err)
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(json!({ "message": self.0.to_string() }))).into_response()
    }
}

pub fn router(store: Arc<LogStore>) -> Router {
    let api = Router::new()
        .route("/logs", get(list_logs).post(create_log))
        .route("/logs/level/:level", get(logs_by_level))
        .route("/logs/period", get(logs_by_period))
        .route("/logs/search", get(search_logs))
        .route("/logs/search/level/:level", get(search_by_level))
        .route("/logs/search/source", get(search_by_source))
        .route("/logs/search/content", get(search_by_content))
        .route("/logs/search/keyword", get(search_by_keyword))
        .route("/logs/search/period", get(search_by_period))
        .route("/dashboard/stats", get(dashboard_stats))
        .route("/dashboard/log-counts", get(log_counts))
        .route("/dashboard/hourly-stats", get(hourly_stats))
        .route("/dashboard/source-stats", get(source_stats))
        .route("/dashboard/source-level-stats", get(source_level_stats))
        .route("/dashboard/error-trends", get(error_trends))
        .route("/dashboard/system-status", get(system_status))
        .route("/dashboard/recent-errors", get(recent_errors))
        .route("/system/status", get(system_status))
        .fallback(no_route)
        .layer(middleware::from_fn(count_requests));

    Router::new()
        .nest("/api/v1", api)
        .route("/health", get(handle_health))
        .route("/metrics", get(handle_metrics))
        .fallback(no_route)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(store)
}

pub async fn start_server(store: Arc<LogStore>, host: &str, port: u16) -> anyhow::Result<()> {
    let app = router(store);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("LogPulse mock backend listening on {}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}

async fn count_requests(request: Request, next: Next) -> Response {
    metrics::record_served(&metrics::operation_label(request.uri().path()));
    next.run(request).await
}

fn parse_query<T: DeserializeOwned>(query: Option<String>) -> Result<T, StoreError> {
    serde_urlencoded::from_str(query.as_deref().unwrap_or_default())
        .map_err(|e| StoreError::InvalidRequest(e.to_string()))
}

fn parse_level(path: Result<Path<String>, PathRejection>) -> Result<LogLevel, StoreError> {
    let Path(raw) = path.map_err(|e| StoreError::InvalidRequest(e.body_text()))?;
    raw.parse()
        .map_err(|_| StoreError::InvalidRequest(format!("unknown log level: {}", raw)))
}

async fn no_route(request: Request) -> ApiFailure {
    ApiFailure(StoreError::NotFound(format!(
        "no route for {} {}",
        request.method(),
        request.uri().path()
    )))
}

async fn page(store: &LogStore, route: LogRoute, query: Option<String>) -> ApiResult<Page<LogEntry>> {
    let filter: LogFilter = parse_query(query)?;
    Ok(Json(store.query(&route, &filter).await?))
}

async fn list_logs(State(store): Store, RawQuery(query): RawQuery) -> ApiResult<Page<LogEntry>> {
    page(&store, LogRoute::List, query).await
}

async fn logs_by_level(
    State(store): Store,
    level: Result<Path<String>, PathRejection>,
    RawQuery(query): RawQuery,
) -> ApiResult<Page<LogEntry>> {
    page(&store, LogRoute::Level(parse_level(level)?), query).await
}

async fn logs_by_period(State(store): Store, RawQuery(query): RawQuery) -> ApiResult<Page<LogEntry>> {
    page(&store, LogRoute::Period, query).await
}

async fn search_logs(State(store): Store, RawQuery(query): RawQuery) -> ApiResult<Page<LogEntry>> {
    page(&store, LogRoute::Search, query).await
}

async fn search_by_level(
    State(store): Store,
    level: Result<Path<String>, PathRejection>,
    RawQuery(query): RawQuery,
) -> ApiResult<Page<LogEntry>> {
    page(&store, LogRoute::SearchLevel(parse_level(level)?), query).await
}

async fn search_by_source(State(store): Store, RawQuery(query): RawQuery) -> ApiResult<Page<LogEntry>> {
    page(&store, LogRoute::SearchSource, query).await
}

async fn search_by_content(State(store): Store, RawQuery(query): RawQuery) -> ApiResult<Page<LogEntry>> {
    page(&store, LogRoute::SearchContent, query).await
}

async fn search_by_keyword(State(store): Store, RawQuery(query): RawQuery) -> ApiResult<Page<LogEntry>> {
    page(&store, LogRoute::SearchKeyword, query).await
}

async fn search_by_period(State(store): Store, RawQuery(query): RawQuery) -> ApiResult<Page<LogEntry>> {
    page(&store, LogRoute::SearchPeriod, query).await
}

async fn create_log(State(store): Store, body: Bytes) -> Result<(StatusCode, Json<LogEntry>), ApiFailure> {
    let entry: NewLogEntry = serde_json::from_slice(&body)
        .map_err(|e| StoreError::InvalidRequest(format!("invalid log entry: {}", e)))?;
    let stored = store.insert(entry, Utc::now()).await;
    info!("Created log entry {} from {}", stored.id, stored.source);
    Ok((StatusCode::CREATED, Json(stored)))
}

async fn dashboard_stats(State(store): Store, RawQuery(query): RawQuery) -> ApiResult<DashboardStats> {
    let now = Utc::now();
    let params: AggregateQuery = parse_query(query)?;
    let window = params.window(Duration::hours(24), now)?;
    Ok(Json(store.dashboard_stats(&window, params.source.as_deref(), now).await))
}

async fn log_counts(State(store): Store, RawQuery(query): RawQuery) -> ApiResult<LogCounts> {
    let params: AggregateQuery = parse_query(query)?;
    let window = params.window(Duration::hours(24), Utc::now())?;
    Ok(Json(store.log_counts(&window, params.source.as_deref()).await))
}

async fn hourly_stats(State(store): Store, RawQuery(query): RawQuery) -> ApiResult<HourlyStats> {
    let params: AggregateQuery = parse_query(query)?;
    let date = params.date.unwrap_or_else(|| Utc::now().date_naive());
    Ok(Json(store.hourly_stats(date).await))
}

async fn source_stats(State(store): Store, RawQuery(query): RawQuery) -> ApiResult<SourceStats> {
    let params: AggregateQuery = parse_query(query)?;
    let window = params.window(Duration::hours(24), Utc::now())?;
    Ok(Json(store.source_stats(&window).await))
}

async fn source_level_stats(State(store): Store, RawQuery(query): RawQuery) -> ApiResult<SourceLevelStats> {
    let params: AggregateQuery = parse_query(query)?;
    let window = params.window(Duration::hours(24), Utc::now())?;
    Ok(Json(store.source_level_stats(&window).await))
}

async fn error_trends(State(store): Store, RawQuery(query): RawQuery) -> ApiResult<ErrorTrends> {
    let params: AggregateQuery = parse_query(query)?;
    let window = params.window(Duration::days(7), Utc::now())?;
    Ok(Json(store.error_trends(&window).await?))
}

async fn system_status(State(store): Store) -> Json<SystemStatus> {
    Json(store.system_status(Utc::now()).await)
}

async fn recent_errors(State(store): Store) -> Json<RecentErrors> {
    Json(store.recent_errors(Utc::now()).await)
}

async fn handle_health(State(store): Store) -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "service": "mock-backend",
        "rows": store.len().await,
        "timestamp": Utc::now(),
    }))
}

async fn handle_metrics() -> impl IntoResponse {
    match metrics::render() {
        Ok(body) => (StatusCode::OK, body).into_response(),
        Err(e) => {
            error!("Failed to render metrics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}
