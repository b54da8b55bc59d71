// services/mock-backend/src/main.rs
//
// LogPulse mock backend - REST API over seeded in-memory logs
//
// Run with: cargo run --bin mock-backend -- --seed-rows 1000

use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mock_backend::{api, config};
use svckit::mock::MockDataGenerator;
use svckit::store::LogStore;

#[derive(Parser, Debug)]
#[command(name = "mock-backend")]
#[command(about = "In-memory LogPulse API for local development and client tests")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/mock-backend.yaml")]
    config: String,

    /// API server port (overrides the config file)
    #[arg(short, long)]
    port: Option<u16>,

    /// Number of generated log rows loaded at startup
    #[arg(long)]
    seed_rows: Option<usize>,

    /// Random seed for generated rows
    #[arg(long)]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut config = config::load_config(&args.config)?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.observability.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(rows) = args.seed_rows {
        config.seed.rows = rows;
    }
    if let Some(seed) = args.seed {
        config.seed.seed = seed;
    }

    info!("Starting LogPulse mock backend on port {}", config.server.port);
    info!("Configuration: {}", args.config);

    let now = Utc::now();
    let store = LogStore::with_profile(now, config.system.clone());
    let rows = MockDataGenerator::new(config.seed.seed, now).generate(config.seed.rows);
    store.extend(rows, now).await;
    info!(
        "Seeded {} log rows from {} sources (seed {})",
        store.len().await,
        MockDataGenerator::sources().len(),
        config.seed.seed
    );

    api::start_server(Arc::new(store), &config.server.host, config.server.port).await?;

    Ok(())
}
