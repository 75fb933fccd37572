//! central console
//!
//! Interactive management console for server instances, backed by the
//! kameo actors in central-core.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use color_eyre::Result;
use tokio::sync::broadcast;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use central_api::events::OutcomeEvent;
use central_core::Console;

mod config;
mod logs;
mod repl;

use config::Config;
use logs::DemoLogSource;

/// Instance management console
#[derive(Parser, Debug)]
#[command(name = "central", version, about)]
struct Args {
    /// Path to central.toml
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level override (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    let args = Args::parse();
    let (config, config_path) = Config::load_default(args.config.as_deref())?;

    // Initialize logging; CENTRAL_LOG wins over flag and config
    let level = args.log_level.as_deref().unwrap_or(&config.console.log_level);
    let filter = EnvFilter::try_from_env("CENTRAL_LOG").unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match &config_path {
        Some(path) => info!(path = %path.display(), "loaded config"),
        None => warn!("no config file found, using defaults"),
    }

    let (event_tx, event_rx) = broadcast::channel(config.lifecycle.event_channel_capacity);
    let console = Console::spawn(
        config.lifecycle.clone(),
        Arc::new(event_tx),
        Arc::new(DemoLogSource),
    )?;

    let seeded = console.seed(&config.seed_instances()).await?;
    info!(instances = seeded.len(), "console ready");

    let printer = tokio::spawn(print_outcomes(event_rx));

    let result = repl::run(&console).await;

    console.shutdown().await;
    printer.abort();

    result
}

/// Print lifecycle outcomes as they arrive
async fn print_outcomes(mut rx: broadcast::Receiver<OutcomeEvent>) {
    loop {
        match rx.recv().await {
            Ok(event) => {
                let icon = if event.kind.is_failure() { "⚠️" } else { "🔔" };
                println!("\n{icon} [{}] {}", event.kind, event.message);
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(skipped, "outcome printer lagged");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
