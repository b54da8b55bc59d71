// services/logpulse-client/src/client.rs
//
// LogPulse client facade; the transport is picked once at construction

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use svckit::config::ClientConfig;
use svckit::errors::ApiError;
use svckit::store::LogStore;
use svckit::time_range::TimeRange;

use crate::api::{ApiClient, Transport};
use crate::fixture::FixtureTransport;
use crate::http::HttpTransport;

#[derive(Clone)]
pub struct LogPulseClient {
    pub(crate) api: ApiClient,
    default_range: TimeRange,
    clock: Option<DateTime<Utc>>,
}

impl LogPulseClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            api: ApiClient::new(transport),
            default_range: TimeRange::default(),
            clock: None,
        }
    }

    /// Real backend at `config.base_url`.
    pub fn http(config: &ClientConfig) -> Result<Self, ApiError> {
        let transport = HttpTransport::new(&config.base_url)?;
        info!("LogPulse client targeting {}", transport.base_url());
        Ok(Self {
            api: ApiClient::new(Arc::new(transport)).with_headers(&config.headers),
            default_range: config.default_time_range,
            clock: None,
        })
    }

    /// In-process backend over `store`.
    pub fn fixture(store: Arc<LogStore>) -> Self {
        Self::new(Arc::new(FixtureTransport::new(store)))
    }

    /// Resolves symbolic ranges against `now` instead of the wall clock.
    pub fn with_clock(mut self, now: DateTime<Utc>) -> Self {
        self.clock = Some(now);
        self
    }

    pub fn with_default_range(mut self, range: TimeRange) -> Self {
        self.default_range = range;
        self
    }

    pub fn default_range(&self) -> TimeRange {
        self.default_range
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.unwrap_or_else(Utc::now)
    }
}
