// svckit/src/metrics.rs
//
// Prometheus instruments for API calls (client side) and served routes (mock backend)

use lazy_static::lazy_static;
use prometheus::{register_histogram_vec, register_int_counter_vec, Encoder, HistogramVec, IntCounterVec, TextEncoder};

lazy_static! {
    pub static ref API_REQUEST_DURATION: HistogramVec = register_histogram_vec!(
        "logpulse_api_request_duration_seconds",
        "LogPulse API request duration in seconds",
        &["operation", "status"]
    ).unwrap();

    pub static ref API_REQUEST_COUNTER: IntCounterVec = register_int_counter_vec!(
        "logpulse_api_requests_total",
        "Total number of LogPulse API requests",
        &["operation", "status"]
    ).unwrap();

    pub static ref BACKEND_REQUEST_COUNTER: IntCounterVec = register_int_counter_vec!(
        "logpulse_backend_requests_total",
        "Total number of requests served by the mock backend",
        &["route"]
    ).unwrap();
}

pub fn record_request(operation: &str, success: bool, duration: f64) {
    let status = if success { "success" } else { "failure" };
    API_REQUEST_DURATION
        .with_label_values(&[operation, status])
        .observe(duration);
    API_REQUEST_COUNTER
        .with_label_values(&[operation, status])
        .inc();
}

pub fn record_served(route: &str) {
    BACKEND_REQUEST_COUNTER.with_label_values(&[route]).inc();
}

/// Default registry in the Prometheus text exposition format.
pub fn render() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&prometheus::gather(), &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}

/// Metric label for an endpoint: the path with ids and query stripped.
pub fn operation_label(endpoint: &str) -> String {
    let path = endpoint.split('?').next().unwrap_or_default();
    let mut segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    // Level-scoped routes end in the level itself.
    if segments.len() >= 2 && segments[segments.len() - 2] == "level" {
        segments.pop();
    }
    segments.join(".")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_label() {
        assert_eq!(operation_label("/logs?page=0"), "logs");
        assert_eq!(operation_label("/logs/search/level/ERROR"), "logs.search.level");
        assert_eq!(operation_label("/dashboard/recent-errors"), "dashboard.recent-errors");
    }

    #[test]
    fn test_record_and_render() {
        record_request("logs", true, 0.01);
        record_served("logs");
        let text = render().unwrap();
        assert!(text.contains("logpulse_api_requests_total"));
        assert!(text.contains("logpulse_backend_requests_total"));
    }
}
