// services/mock-backend/src/config.rs
//
// Mock backend settings: bind address, seed data and reported host figures

use anyhow::Result;
use serde::{Deserialize, Serialize};

use svckit::config::ObservabilityConfig;
use svckit::store::SystemProfile;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MockBackendConfig {
    pub server: ServerConfig,
    pub seed: SeedConfig,
    pub system: SystemProfile,
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedConfig {
    /// Generated rows loaded at startup.
    pub rows: usize,
    pub seed: u64,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self { rows: 500, seed: 42 }
    }
}

pub fn load_config(path: &str) -> Result<MockBackendConfig> {
    svckit::config::load(Some(path), "MOCK_BACKEND")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config: MockBackendConfig = serde_json::from_str(r#"{"seed":{"rows":10}}"#).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.seed.rows, 10);
        assert_eq!(config.seed.seed, 42);
        assert_eq!(config.system.avg_response_time, 85);
    }
}
