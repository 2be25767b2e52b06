//! Seatwatch - train seat availability monitor
//!
//! Polls the railway booking backend for coach availability on configured
//! trips, detects seats becoming available, and sends Telegram notifications.

pub mod config;
pub mod engine;
pub mod error;
pub mod fetcher;
pub mod io;
pub mod message;
pub mod notifier;
pub mod railway;
pub mod session;
pub mod snapshot;
pub mod telegram;
pub mod tracker;

pub use config::{load_config, Config, Target};
pub use error::{Result, SeatwatchError};

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::engine::{Engine, EngineSettings, PollState};
use crate::fetcher::Fetcher;
use crate::io::{HttpClient, ReqwestHttpClient};
use crate::notifier::Notifier;
use crate::railway::RailwayFetcher;
use crate::telegram::TelegramNotifier;

/// Build the engine for a validated configuration
pub fn build_engine(
    config: &Config,
    http: Arc<dyn HttpClient>,
    cancel: CancellationToken,
) -> Result<Engine> {
    config.validate()?;

    let fetcher: Arc<dyn Fetcher> = Arc::new(RailwayFetcher::new(config, Arc::clone(&http)));
    let notifier: Arc<dyn Notifier> = Arc::new(TelegramNotifier::new(&config.telegram, http)?);
    let settings = EngineSettings::from_config(config)?;

    Ok(Engine::new(
        fetcher,
        notifier,
        config.targets.clone(),
        config.session.clone(),
        settings,
        cancel,
    ))
}

/// Run the seatwatch service with the given configuration until Ctrl-C or
/// SIGTERM
pub async fn run(config: Config) -> Result<()> {
    let http: Arc<dyn HttpClient> = Arc::new(ReqwestHttpClient::new(config.request_timeout)?);
    let cancel = CancellationToken::new();
    let engine = build_engine(&config, http, cancel.clone())?;

    let cancel_for_signal = cancel.clone();
    tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        tracing::info!("Shutdown signal received");
        cancel_for_signal.cancel();
    });

    tracing::info!(
        "Monitoring {} targets every {}",
        engine.targets().len(),
        humantime::format_duration(config.poll_interval)
    );

    let mut state = PollState::default();
    engine.run(&mut state).await;

    tracing::info!("Seatwatch stopped");
    Ok(())
}

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = term.recv() => {}
                }
            }
            Err(e) => {
                tracing::warn!("Failed to register SIGTERM handler: {}", e);
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
