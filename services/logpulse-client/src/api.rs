// services/logpulse-client/src/api.rs
//
// HTTP client primitive: one JSON request per call against a pluggable transport
//

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use svckit::errors::ApiError;
use svckit::metrics::{operation_label, record_request};

pub const CONTENT_TYPE: &str = "Content-Type";
pub const JSON_MEDIA_TYPE: &str = "application/json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Method {
    #[default]
    Get,
    Post,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => f.write_str("GET"),
            Method::Post => f.write_str("POST"),
        }
    }
}

/// Request as handed to a transport: endpoint relative to the base URL,
/// headers already merged.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundRequest {
    pub method: Method,
    pub endpoint: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl OutboundRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Status line and undecoded body of a response.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    pub status_text: String,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn new(status: u16, body: Vec<u8>) -> Self {
        Self {
            status,
            status_text: status_text(status).to_string(),
            body,
        }
    }

    pub fn json<T: Serialize>(status: u16, value: &T) -> Result<Self, ApiError> {
        Ok(Self::new(status, serde_json::to_vec(value)?))
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

pub fn status_text(status: u16) -> &'static str {
    reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("")
}

/// Moves bytes for the client. Implementations never interpret status codes.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: OutboundRequest) -> Result<RawResponse, ApiError>;

    /// Short name for logs.
    fn name(&self) -> &'static str;
}

#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse {
    Json(Value),
    NoContent,
}

impl ApiResponse {
    /// Decodes the body, `None` for 204.
    pub fn into_json<T: DeserializeOwned>(self) -> Result<Option<T>, ApiError> {
        match self {
            ApiResponse::Json(value) => Ok(Some(serde_json::from_value(value)?)),
            ApiResponse::NoContent => Ok(None),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub method: Method,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl RequestOptions {
    pub fn get() -> Self {
        Self::default()
    }

    pub fn post<B: Serialize>(body: &B) -> Result<Self, ApiError> {
        Ok(Self {
            method: Method::Post,
            headers: Vec::new(),
            body: Some(serde_json::to_value(body)?),
        })
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Later layers win; names compare case-insensitively and keep the spelling
/// of the layer that set them last.
pub fn merge_headers<'a, I>(layers: I) -> Vec<(String, String)>
where
    I: IntoIterator<Item = &'a [(String, String)]>,
{
    let mut merged: Vec<(String, String)> = Vec::new();
    for layer in layers {
        for (name, value) in layer {
            match merged.iter_mut().find(|(n, _)| n.eq_ignore_ascii_case(name)) {
                Some(slot) => *slot = (name.clone(), value.clone()),
                None => merged.push((name.clone(), value.clone())),
            }
        }
    }
    merged
}

#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    headers: Vec<(String, String)>,
}

impl ApiClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            headers: Vec::new(),
        }
    }

    /// Headers sent with every request, between the default content type and per-call headers.
    pub fn with_headers(mut self, headers: &BTreeMap<String, String>) -> Self {
        self.headers = headers.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        self
    }

    pub fn transport_name(&self) -> &'static str {
        self.transport.name()
    }

    pub async fn request(&self, endpoint: &str, options: RequestOptions) -> Result<ApiResponse, ApiError> {
        let defaults = [(CONTENT_TYPE.to_string(), JSON_MEDIA_TYPE.to_string())];
        let headers = merge_headers([&defaults[..], &self.headers[..], &options.headers[..]]);
        let body = options.body.as_ref().map(serde_json::to_vec).transpose()?;

        let request = OutboundRequest {
            method: options.method,
            endpoint: endpoint.to_string(),
            headers,
            body,
        };

        let operation = operation_label(endpoint);
        let started = Instant::now();
        let result = self.exchange(request).await;
        let elapsed = started.elapsed();
        record_request(&operation, result.is_ok(), elapsed.as_secs_f64());

        match &result {
            Ok(_) => debug!(
                "{} {} {} ok in {:?}",
                self.transport.name(),
                options.method,
                endpoint,
                elapsed
            ),
            Err(e) => warn!(
                "{} {} {} failed in {:?}: {}",
                self.transport.name(),
                options.method,
                endpoint,
                elapsed,
                e
            ),
        }
        result
    }

    async fn exchange(&self, request: OutboundRequest) -> Result<ApiResponse, ApiError> {
        let response = self.transport.send(request).await?;
        interpret(response)
    }

    pub async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<Option<T>, ApiError> {
        self.request(endpoint, RequestOptions::get()).await?.into_json()
    }

    pub async fn post<B: Serialize, T: DeserializeOwned>(&self, endpoint: &str, body: &B) -> Result<Option<T>, ApiError> {
        self.request(endpoint, RequestOptions::post(body)?).await?.into_json()
    }
}

/// Non-2xx becomes `ApiError::Status`, 204 is `NoContent`, anything else must be JSON.
pub fn interpret(response: RawResponse) -> Result<ApiResponse, ApiError> {
    if !response.is_success() {
        return Err(ApiError::from_status(
            response.status,
            &response.status_text,
            error_message(&response.body),
        ));
    }

    if response.status == 204 {
        return Ok(ApiResponse::NoContent);
    }

    let value: Value = serde_json::from_slice(&response.body)?;
    Ok(ApiResponse::Json(value))
}

fn error_message(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).unwrap_or_else(|_| Value::Object(Default::default()));
    value.get("message").and_then(Value::as_str).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::Mutex;

    /// Answers every request with one canned response and keeps what it was sent.
    struct Canned {
        response: RawResponse,
        seen: Mutex<Vec<OutboundRequest>>,
    }

    impl Canned {
        fn new(status: u16, body: &str) -> Arc<Self> {
            Arc::new(Self {
                response: RawResponse::new(status, body.as_bytes().to_vec()),
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl Transport for Canned {
        async fn send(&self, request: OutboundRequest) -> Result<RawResponse, ApiError> {
            self.seen.lock().await.push(request);
            Ok(self.response.clone())
        }

        fn name(&self) -> &'static str {
            "canned"
        }
    }

    struct Unreachable;

    #[async_trait]
    impl Transport for Unreachable {
        async fn send(&self, _request: OutboundRequest) -> Result<RawResponse, ApiError> {
            Err(ApiError::Transport("connection refused".to_string()))
        }

        fn name(&self) -> &'static str {
            "unreachable"
        }
    }

    #[tokio::test]
    async fn test_no_content_is_not_parsed() {
        let transport = Canned::new(204, "not json at all");
        let client = ApiClient::new(transport);
        let response = client.request("/logs", RequestOptions::get()).await.unwrap();
        assert_eq!(response, ApiResponse::NoContent);
    }

    #[tokio::test]
    async fn test_error_message_from_body() {
        let client = ApiClient::new(Canned::new(500, r#"{"message":"boom"}"#));
        let err = client.request("/logs", RequestOptions::get()).await.unwrap_err();
        assert_eq!(err.to_string(), "boom");
        assert_eq!(err.status(), Some(500));
    }

    #[tokio::test]
    async fn test_error_message_synthesized() {
        let client = ApiClient::new(Canned::new(404, "<html>nope</html>"));
        let err = client.request("/logs", RequestOptions::get()).await.unwrap_err();
        assert_eq!(err.to_string(), "request failed: 404 Not Found");

        // A non-string message counts as missing.
        let client = ApiClient::new(Canned::new(400, r#"{"message":42}"#));
        let err = client.request("/logs", RequestOptions::get()).await.unwrap_err();
        assert_eq!(err.to_string(), "request failed: 400 Bad Request");
    }

    #[tokio::test]
    async fn test_malformed_success_body_is_an_error() {
        let client = ApiClient::new(Canned::new(200, "{truncated"));
        let err = client.request("/logs", RequestOptions::get()).await.unwrap_err();
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn test_transport_failure_propagates() {
        let client = ApiClient::new(Arc::new(Unreachable));
        let err = client.request("/logs", RequestOptions::get()).await.unwrap_err();
        assert_eq!(err, ApiError::Transport("connection refused".to_string()));
    }

    #[tokio::test]
    async fn test_header_layers() {
        let transport = Canned::new(200, "{}");
        let mut configured = BTreeMap::new();
        configured.insert("X-Team".to_string(), "ops".to_string());
        configured.insert("content-type".to_string(), "text/plain".to_string());

        let client = ApiClient::new(transport.clone()).with_headers(&configured);
        let options = RequestOptions::get().header("x-team", "payments");
        client.request("/dashboard/stats", options).await.unwrap();

        let seen = transport.seen.lock().await;
        let request = &seen[0];
        assert_eq!(request.header("Content-Type"), Some("text/plain"));
        assert_eq!(request.header("X-TEAM"), Some("payments"));
        assert_eq!(request.headers.len(), 2);
    }

    #[test]
    fn test_merge_keeps_first_position() {
        let a = vec![("Accept".to_string(), "a".to_string()), ("B".to_string(), "b".to_string())];
        let b = vec![("accept".to_string(), "c".to_string())];
        let merged = merge_headers([&a[..], &b[..]]);
        assert_eq!(merged[0], ("accept".to_string(), "c".to_string()));
        assert_eq!(merged.len(), 2);
    }

    #[tokio::test]
    async fn test_post_serializes_body() {
        let transport = Canned::new(201, r#"{"ok":true}"#);
        let client = ApiClient::new(transport.clone());
        let reply: Option<Value> = client.post("/logs", &serde_json::json!({"source": "api"})).await.unwrap();
        assert_eq!(reply, Some(serde_json::json!({"ok": true})));

        let seen = transport.seen.lock().await;
        assert_eq!(seen[0].method, Method::Post);
        assert_eq!(seen[0].body.as_deref(), Some(br#"{"source":"api"}"#.as_slice()));
    }
}
