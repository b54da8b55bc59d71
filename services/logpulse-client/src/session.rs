// services/logpulse-client/src/session.rs
//
// Drives fetches for the view state: tags each request with a sequence
// number and feeds completions back through the reducer

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use svckit::errors::ApiError;
use svckit::filter::LogFilter;
use svckit::time_range::TimeRange;
use svckit::types::{DashboardField, LogEntry, Page};

use crate::client::LogPulseClient;
use crate::dashboard::DashboardSnapshot;
use crate::state::{reduce, Action, ViewState};

pub struct Session {
    id: Uuid,
    client: LogPulseClient,
    state: Mutex<ViewState>,
    next_seq: AtomicU64,
}

impl Session {
    pub fn new(client: LogPulseClient) -> Self {
        let range = client.default_range();
        let id = Uuid::new_v4();
        info!("Session {} started ({} transport)", id, client.api().transport_name());
        Self {
            id,
            client,
            state: Mutex::new(ViewState::new(LogFilter::new(), range)),
            next_seq: AtomicU64::new(1),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn client(&self) -> &LogPulseClient {
        &self.client
    }

    pub async fn state(&self) -> ViewState {
        self.state.lock().await.clone()
    }

    pub async fn dispatch(&self, action: Action) {
        let mut state = self.state.lock().await;
        *state = reduce(std::mem::take(&mut *state), action);
    }

    fn issue(&self) -> u64 {
        self.next_seq.fetch_add(1, Ordering::SeqCst)
    }

    /// Issues a logs request for the current filter; the caller completes it
    /// with `complete_logs`.
    pub async fn begin_logs(&self) -> (u64, LogFilter) {
        let seq = self.issue();
        self.dispatch(Action::LogsRequested { seq }).await;
        let filter = self.state.lock().await.filter.clone();
        (seq, filter)
    }

    pub async fn complete_logs(&self, seq: u64, result: Result<Page<LogEntry>, ApiError>) {
        let action = match result {
            Ok(page) => Action::LogsLoaded { seq, page },
            Err(e) => Action::LogsFailed {
                seq,
                message: e.to_string(),
            },
        };
        self.dispatch(action).await;
    }

    pub async fn refresh_logs(&self) -> u64 {
        let (seq, filter) = self.begin_logs().await;
        debug!("Session {} logs request #{}", self.id, seq);
        let result = self.client.get_logs(&filter).await;
        self.complete_logs(seq, result).await;
        seq
    }

    pub async fn begin_dashboard(&self) -> (u64, TimeRange) {
        let seq = self.issue();
        self.dispatch(Action::DashboardRequested { seq }).await;
        let range = self.state.lock().await.time_range;
        (seq, range)
    }

    /// A snapshot where every field failed counts as a failed load.
    pub async fn complete_dashboard(&self, seq: u64, snapshot: DashboardSnapshot) {
        let action = if snapshot.failures.len() == DashboardField::ALL.len() {
            let message = snapshot
                .failures
                .first()
                .map(|f| f.message.clone())
                .unwrap_or_default();
            Action::DashboardFailed { seq, message }
        } else {
            Action::DashboardLoaded { seq, snapshot }
        };
        self.dispatch(action).await;
    }

    pub async fn refresh_dashboard(&self, source: Option<&str>) -> u64 {
        let (seq, range) = self.begin_dashboard().await;
        debug!("Session {} dashboard request #{} ({})", self.id, seq, range);
        let snapshot = self.client.get_dashboard_stats(range, source).await;
        self.complete_dashboard(seq, snapshot).await;
        seq
    }
}
