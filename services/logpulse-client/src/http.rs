// services/logpulse-client/src/http.rs
//
// reqwest transport against a live LogPulse backend

use async_trait::async_trait;
use tracing::debug;

use svckit::errors::ApiError;

use crate::api::{Method, OutboundRequest, RawResponse, Transport};

pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// `base_url` is the origin plus the `/api/v1` prefix; a trailing `/` is dropped.
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        reqwest::Url::parse(base_url)
            .map_err(|e| ApiError::Config(format!("invalid base url {:?}: {}", base_url, e)))?;

        // No timeout: each call is a single unbounded attempt.
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| ApiError::Config(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: OutboundRequest) -> Result<RawResponse, ApiError> {
        let url = self.url(&request.endpoint);
        let mut builder = match request.method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ApiError::Transport(format!("{} {}: {}", request.method, url, e)))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| ApiError::Transport(format!("reading body of {}: {}", url, e)))?;
        debug!("{} {} -> {} ({} bytes)", request.method, url, status, body.len());

        Ok(RawResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            body: body.to_vec(),
        })
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
