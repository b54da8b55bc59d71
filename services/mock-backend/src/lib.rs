// services/mock-backend/src/lib.rs
//
// LogPulse mock backend - Library exports
//

pub mod api;
pub mod config;

pub use api::{router, start_server};
pub use config::{load_config, MockBackendConfig};
