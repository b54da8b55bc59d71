// svckit/src/config.rs
//
// Configuration shared by the LogPulse client and services

use std::collections::BTreeMap;

use anyhow::Result;
use config::{Config, Environment, File};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::time_range::TimeRange;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/api/v1";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Origin plus the `/api/v1` prefix.
    pub base_url: String,
    /// Sent with every request, below per-call headers.
    pub headers: BTreeMap<String, String>,
    pub default_time_range: TimeRange,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            headers: BTreeMap::new(),
            default_time_range: TimeRange::Last24Hours,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// `EnvFilter` directives used when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LogPulseConfig {
    pub client: ClientConfig,
    pub observability: ObservabilityConfig,
}

/// Loads `T` from an optional YAML file overlaid with `<PREFIX>__SECTION__KEY`
/// environment variables.
pub fn load<T: DeserializeOwned>(path: Option<&str>, env_prefix: &str) -> Result<T> {
    let mut builder = Config::builder();
    if let Some(path) = path {
        builder = builder.add_source(File::with_name(path).required(false));
    }
    let config = builder
        .add_source(Environment::with_prefix(env_prefix).separator("__"))
        .build()?;

    Ok(config.try_deserialize()?)
}

pub fn load_config(path: Option<&str>) -> Result<LogPulseConfig> {
    load(path, "LOGPULSE")
}
