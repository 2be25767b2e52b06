//! Seatwatch CLI
//!
//! Command-line entry point for the train seat availability monitor.

use std::path::PathBuf;

use clap::Parser;
use seatwatch::{load_config, Config};
use tracing::Level;

#[derive(Parser)]
#[command(name = "seatwatch")]
#[command(about = "Train seat availability monitor with Telegram notifications")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: Level,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .init();

    tracing::debug!(
        "Parsed command line arguments: config={:?}, log_level={:?}",
        args.config,
        args.log_level
    );

    let mut config = if let Some(config_path) = &args.config {
        tracing::debug!("Loading configuration from {:?}", config_path);
        load_config(config_path)?
    } else {
        tracing::debug!("Using default configuration");
        Config::default()
    };

    config.apply_environment()?;

    tracing::info!("Starting seatwatch");
    tracing::debug!(
        "Targets: {}, interval: {:?}, timeout: {:?}",
        config.targets.len(),
        config.poll_interval,
        config.request_timeout
    );

    seatwatch::run(config).await?;

    Ok(())
}
