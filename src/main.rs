mod auth;
mod config;
mod db;
mod error;
mod export;
mod ipc;
mod model;
mod seed;
mod service;
mod store;
mod summary;
mod validate;
mod view;

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tokio::io::BufReader;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::seed::SeedOptions;

/// Health check-in sidecar: newline-delimited JSON requests on stdin,
/// one response per line on stdout.
#[derive(Parser)]
#[command(name = "kesehatand", version)]
struct Cli {
    /// Workspace directory holding kesehatan.sqlite3
    #[arg(long)]
    workspace: Option<PathBuf>,

    /// Path to a TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Delay before each request reaches the store
    #[arg(long, env = "KESEHATAN_LATENCY_MS")]
    latency_ms: Option<u64>,

    /// Start without the sample health records
    #[arg(long)]
    no_seed_records: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout carries the protocol; logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let cfg = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    let latency_ms = cli.latency_ms.unwrap_or(cfg.runtime.latency_ms);
    let seed = SeedOptions {
        records: cfg.runtime.seed_records && !cli.no_seed_records,
    };

    let mut state = ipc::AppState::new(seed::demo_store(seed), cfg.app_settings());
    if let Some(ws) = &cli.workspace {
        state.open_workspace(ws)?;
    }
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        latency_ms,
        seed_records = seed.records,
        "kesehatand ready"
    );

    let (store, actor) = service::spawn_store_actor(state);
    service::serve(
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
        store,
        Duration::from_millis(latency_ms),
    )
    .await?;
    actor.await?;
    Ok(())
}
