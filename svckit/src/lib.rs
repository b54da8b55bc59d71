// svckit/src/lib.rs
//
// Shared domain model, query encoding and the in-memory log store
//

pub mod config;
pub mod errors;
pub mod filter;
pub mod metrics;
pub mod mock;
pub mod query_builder;
pub mod store;
pub mod time_range;
pub mod types;

pub use errors::{ApiError, StoreError};
pub use filter::{LogFilter, SortDir};
pub use query_builder::QueryBuilder;
pub use store::{AggregateQuery, LogRoute, LogStore};
pub use time_range::{TimeRange, TimeWindow};
pub use types::{DashboardField, DashboardStats, LogEntry, LogLevel, NewLogEntry, Page};
