// services/logpulse-client/src/state.rs
//
// View state for the log list and the dashboard
// All changes go through `reduce`; completions carry the sequence number
// of the request that produced them

use serde::Serialize;

use svckit::filter::{contains_ignore_case, LogFilter};
use svckit::time_range::TimeRange;
use svckit::types::{LogEntry, LogLevel, Page};

use crate::dashboard::DashboardSnapshot;

/// Request bookkeeping for one view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Sequence {
    /// Highest sequence number issued for this view.
    pub issued: u64,
    /// Highest sequence number whose completion was applied.
    pub applied: u64,
}

impl Sequence {
    pub fn is_loading(&self) -> bool {
        self.issued > self.applied
    }

    fn issue(&mut self, seq: u64) {
        self.issued = self.issued.max(seq);
    }

    /// Records `seq` as applied unless something newer already was.
    fn accept(&mut self, seq: u64) -> bool {
        if seq < self.applied {
            return false;
        }
        self.applied = seq;
        self.issued = self.issued.max(seq);
        true
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewState {
    pub filter: LogFilter,
    pub time_range: TimeRange,
    pub logs: Option<Page<LogEntry>>,
    pub logs_error: Option<String>,
    pub logs_seq: Sequence,
    pub dashboard: Option<DashboardSnapshot>,
    pub dashboard_error: Option<String>,
    pub dashboard_seq: Sequence,
}

impl ViewState {
    pub fn new(filter: LogFilter, time_range: TimeRange) -> Self {
        Self {
            filter,
            time_range,
            ..Self::default()
        }
    }

    pub fn logs_loading(&self) -> bool {
        self.logs_seq.is_loading()
    }

    pub fn dashboard_loading(&self) -> bool {
        self.dashboard_seq.is_loading()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    SetFilter(LogFilter),
    SetPage(u32),
    SetTimeRange(TimeRange),
    LogsRequested { seq: u64 },
    LogsLoaded { seq: u64, page: Page<LogEntry> },
    LogsFailed { seq: u64, message: String },
    DashboardRequested { seq: u64 },
    DashboardLoaded { seq: u64, snapshot: DashboardSnapshot },
    DashboardFailed { seq: u64, message: String },
}

pub fn reduce(mut state: ViewState, action: Action) -> ViewState {
    match action {
        Action::SetFilter(filter) => state.filter = filter,
        Action::SetPage(page) => state.filter.page = Some(page),
        Action::SetTimeRange(range) => state.time_range = range,

        Action::LogsRequested { seq } => state.logs_seq.issue(seq),
        Action::LogsLoaded { seq, page } => {
            if state.logs_seq.accept(seq) {
                state.logs = Some(page);
                state.logs_error = None;
            }
        }
        Action::LogsFailed { seq, message } => {
            if state.logs_seq.accept(seq) {
                state.logs_error = Some(message);
            }
        }

        Action::DashboardRequested { seq } => state.dashboard_seq.issue(seq),
        Action::DashboardLoaded { seq, snapshot } => {
            if state.dashboard_seq.accept(seq) {
                state.dashboard = Some(snapshot);
                state.dashboard_error = None;
            }
        }
        Action::DashboardFailed { seq, message } => {
            if state.dashboard_seq.accept(seq) {
                state.dashboard_error = Some(message);
            }
        }
    }
    state
}

/// Client-side narrowing of fetched rows: free text against content or
/// source, plus optional exact level and source substring.
pub fn filter_entries<'a>(
    entries: &'a [LogEntry],
    query: &str,
    level: Option<LogLevel>,
    source: Option<&str>,
) -> Vec<&'a LogEntry> {
    entries
        .iter()
        .filter(|e| LogFilter::matches_text(e, query))
        .filter(|e| level.map_or(true, |l| e.log_level == l))
        .filter(|e| source.map_or(true, |s| contains_ignore_case(&e.source, s)))
        .collect()
}
