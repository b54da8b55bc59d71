// services/logpulse-cli/src/main.rs
//
// LogPulse CLI - query logs and dashboards from the terminal
//
// Run with: cargo run --bin logpulse -- --demo dashboard --range 7d

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::{Args as ClapArgs, Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use logpulse_client::{export_csv, export_filename, filter_entries, Action, ExportColumns, LogPulseClient, Session};
use svckit::config::load_config;
use svckit::filter::{LogFilter, SortDir};
use svckit::store::LogStore;
use svckit::time_range::TimeRange;
use svckit::types::{timestamp, LogEntry, LogLevel, NewLogEntry, Page};

#[derive(Parser, Debug)]
#[command(name = "logpulse")]
#[command(about = "Query LogPulse logs and dashboard aggregates")]
#[command(version = "0.1.0")]
struct Args {
    /// Run against generated in-memory data (no backend required)
    #[arg(long, short)]
    demo: bool,

    /// Rows generated in demo mode
    #[arg(long, default_value = "500")]
    demo_rows: usize,

    /// Seed for demo data
    #[arg(long, default_value = "42")]
    demo_seed: u64,

    /// LogPulse API base URL (overrides the config file)
    #[arg(long, env = "LOGPULSE_API_URL")]
    api_url: Option<String>,

    /// Path to configuration file
    #[arg(short, long, default_value = "config/logpulse.yaml")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List logs (level-only and period-only queries use the dedicated routes)
    Logs(FilterArgs),
    /// Search logs
    Search(FilterArgs),
    /// Submit a log entry
    Create {
        #[arg(long)]
        source: String,
        #[arg(long)]
        level: LogLevel,
        #[arg(long)]
        content: String,
        #[arg(long)]
        ip: Option<String>,
        #[arg(long)]
        user: Option<String>,
    },
    /// Dashboard aggregates for a time range
    Dashboard {
        /// 24h, 7d or 30d
        #[arg(long)]
        range: Option<TimeRange>,
        #[arg(long)]
        source: Option<String>,
    },
    /// Backend health summary
    Status {
        /// Use the superseded /system/status endpoint
        #[arg(long)]
        legacy: bool,
    },
    /// Write fetched logs to a CSV file
    Export {
        #[command(flatten)]
        filter: FilterArgs,
        /// Output path (defaults to logpulse_logs_<timestamp>.csv)
        #[arg(long, short)]
        output: Option<PathBuf>,
        /// Include IP and user columns
        #[arg(long)]
        provenance: bool,
    },
}

#[derive(ClapArgs, Debug, Clone, Default)]
struct FilterArgs {
    #[arg(long)]
    page: Option<u32>,
    #[arg(long)]
    size: Option<u32>,
    #[arg(long)]
    sort_by: Option<String>,
    #[arg(long)]
    sort_dir: Option<SortDir>,
    #[arg(long)]
    level: Option<LogLevel>,
    #[arg(long)]
    source: Option<String>,
    /// RFC 3339 or local ISO date-time (read as UTC)
    #[arg(long, value_parser = parse_instant)]
    start: Option<DateTime<Utc>>,
    #[arg(long, value_parser = parse_instant)]
    end: Option<DateTime<Utc>>,
    #[arg(long)]
    keyword: Option<String>,
    #[arg(long)]
    content: Option<String>,
    /// Narrow fetched rows by free text in content or source
    #[arg(long, short)]
    query: Option<String>,
}

impl FilterArgs {
    fn to_filter(&self) -> LogFilter {
        LogFilter {
            page: self.page,
            size: self.size,
            sort_by: self.sort_by.clone(),
            sort_dir: self.sort_dir,
            level: self.level,
            source: self.source.clone(),
            start: self.start,
            end: self.end,
            keyword: self.keyword.clone(),
            content: self.content.clone(),
        }
    }

    /// Rows of `page` that pass the client-side text, level and source filters.
    fn narrow(&self, page: Page<LogEntry>) -> Page<LogEntry> {
        match self.query.as_deref() {
            Some(query) => {
                let rows = filter_entries(&page.content, query, self.level, self.source.as_deref());
                Page::from_list(rows.into_iter().cloned().collect())
            }
            None => page,
        }
    }
}

fn parse_instant(raw: &str) -> Result<DateTime<Utc>, String> {
    timestamp::parse(raw).ok_or_else(|| format!("not a timestamp: {}", raw))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = load_config(Some(&args.config))?;

    // Initialize tracing; stdout carries the command output.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.observability.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let client = if args.demo {
        let store = LogStore::seeded(args.demo_rows, args.demo_seed, Utc::now()).await;
        info!("DEMO mode: {} generated rows", args.demo_rows);
        LogPulseClient::fixture(Arc::new(store)).with_default_range(config.client.default_time_range)
    } else {
        let mut client_config = config.client.clone();
        if let Some(url) = args.api_url {
            client_config.base_url = url;
        }
        LogPulseClient::http(&client_config)?
    };

    run(client, args.command).await
}

async fn run(client: LogPulseClient, command: Command) -> Result<()> {
    match command {
        Command::Logs(filter) => {
            let session = Session::new(client);
            session.dispatch(Action::SetFilter(filter.to_filter())).await;
            session.refresh_logs().await;
            let state = session.state().await;
            if let Some(message) = state.logs_error {
                bail!(message);
            }
            print_json(&state.logs.map(|page| filter.narrow(page)))
        }
        Command::Search(filter) => print_json(&client.search_logs(&filter.to_filter()).await?),
        Command::Create {
            source,
            level,
            content,
            ip,
            user,
        } => {
            let entry = NewLogEntry {
                source,
                content,
                log_level: level,
                timestamp: None,
                ip,
                user,
            };
            print_json(&client.create_log(&entry).await?)
        }
        Command::Dashboard { range, source } => {
            let session = Session::new(client);
            if let Some(range) = range {
                session.dispatch(Action::SetTimeRange(range)).await;
            }
            session.refresh_dashboard(source.as_deref()).await;
            let state = session.state().await;
            match (state.dashboard, state.dashboard_error) {
                (Some(snapshot), _) => print_json(&snapshot),
                (None, Some(message)) => bail!(message),
                (None, None) => bail!("dashboard request did not complete"),
            }
        }
        Command::Status { legacy } => {
            let status = if legacy {
                client.get_legacy_system_status().await?
            } else {
                client.get_system_status().await?
            };
            print_json(&status)
        }
        Command::Export {
            filter,
            output,
            provenance,
        } => {
            let columns = if provenance {
                ExportColumns::WithProvenance
            } else {
                ExportColumns::Basic
            };
            let (csv, rows) = export_logs(&client, &filter, columns).await?;
            let path = output.unwrap_or_else(|| PathBuf::from(export_filename(Utc::now())));
            std::fs::write(&path, csv).with_context(|| format!("writing {}", path.display()))?;
            info!("Exported {} entries to {}", rows, path.display());
            println!("{}", path.display());
            Ok(())
        }
    }
}

/// Fetches one page, narrows it client-side and renders it as CSV.
async fn export_logs(client: &LogPulseClient, filter: &FilterArgs, columns: ExportColumns) -> Result<(String, usize)> {
    let page = filter.narrow(client.get_logs(&filter.to_filter()).await?);
    let csv = export_csv(&page.content, columns)?;
    Ok((csv, page.content.len()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
