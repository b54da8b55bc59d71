// services/logpulse-client/src/lib.rs
//
// LogPulse client - Library exports
//

pub mod api;
pub mod client;
pub mod dashboard;
pub mod export;
pub mod fixture;
pub mod http;
pub mod logs;
pub mod session;
pub mod state;

pub use api::{ApiClient, ApiResponse, RawResponse, RequestOptions, Transport};
pub use client::LogPulseClient;
pub use dashboard::{DashboardSnapshot, FieldFailure};
pub use export::{export_csv, export_filename, ExportColumns};
pub use fixture::FixtureTransport;
pub use http::HttpTransport;
pub use session::Session;
pub use state::{filter_entries, reduce, Action, ViewState};
