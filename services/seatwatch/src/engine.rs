//! Engine: the poll loop tying fetcher, tracker and notifier together

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::config::{Config, Target};
use crate::fetcher::Fetcher;
use crate::message;
use crate::notifier::Notifier;
use crate::session::SessionContext;
use crate::tracker::{AvailabilityTracker, Decision};
use crate::SeatwatchError;

/// Consecutive `SessionExpired` results for one target before the operator
/// is asked to refresh the session cookies
pub const SESSION_WARN_THRESHOLD: u32 = 3;

/// Phase of the poll loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopPhase {
    /// Waiting for the next tick
    Idle,
    /// Iterating over the targets
    Polling,
}

/// Per-target failure bookkeeping
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetHealth {
    pub consecutive_failures: u32,
    pub consecutive_session_failures: u32,
    pub last_error: Option<String>,
}

/// Everything the loop remembers between ticks
#[derive(Debug, Default)]
pub struct PollState {
    pub tracker: AvailabilityTracker,
    pub health: HashMap<String, TargetHealth>,
    pub ticks: u64,
}

impl PollState {
    pub fn health(&self, target: &str) -> TargetHealth {
        self.health.get(target).cloned().unwrap_or_default()
    }

    fn record_success(&mut self, target: &str) {
        self.health.insert(target.to_string(), TargetHealth::default());
    }

    /// Returns the updated consecutive session-failure count
    fn record_failure(&mut self, target: &str, error: &SeatwatchError) -> u32 {
        let health = self.health.entry(target.to_string()).or_default();
        health.consecutive_failures += 1;
        if matches!(error, SeatwatchError::SessionExpired(_)) {
            health.consecutive_session_failures += 1;
        } else {
            health.consecutive_session_failures = 0;
        }
        health.last_error = Some(error.to_string());
        health.consecutive_session_failures
    }
}

/// Outcome of one tick
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    pub processed: usize,
    pub failed: usize,
    pub notified: usize,
    pub cancelled: bool,
}

/// Loop settings taken from the configuration
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub search_name: String,
    pub destination: String,
    pub poll_interval: Duration,
    pub target_delay: Duration,
    pub notify_on_sold_out: bool,
}

impl EngineSettings {
    pub fn from_config(config: &Config) -> crate::Result<Self> {
        let destination = config
            .telegram
            .chat_id
            .clone()
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| SeatwatchError::Config("Telegram chat id is not set".to_string()))?;

        Ok(Self {
            search_name: config.search_name.clone(),
            destination,
            poll_interval: config.poll_interval,
            target_delay: config.target_delay,
            notify_on_sold_out: config.notify_on_sold_out,
        })
    }
}

/// The engine drives one sequential poll loop over all targets
pub struct Engine {
    fetcher: Arc<dyn Fetcher>,
    notifier: Arc<dyn Notifier>,
    targets: Vec<Target>,
    session: SessionContext,
    settings: EngineSettings,
    cancel: CancellationToken,
}

impl Engine {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        notifier: Arc<dyn Notifier>,
        targets: Vec<Target>,
        session: SessionContext,
        settings: EngineSettings,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            fetcher,
            notifier,
            targets,
            session,
            settings,
            cancel,
        }
    }

    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    /// Send the startup message, then alternate ticks and sleeps until
    /// cancelled. The shutdown message goes out on the way out.
    pub async fn run(&self, state: &mut PollState) {
        let startup = message::startup(
            &self.settings.search_name,
            &self.targets,
            self.settings.poll_interval,
            chrono::Local::now(),
        );
        self.deliver(&startup).await;

        let mut phase = LoopPhase::Polling;
        loop {
            match phase {
                LoopPhase::Polling => {
                    let report = self.poll_once(state).await;
                    tracing::info!(
                        "Tick {} done: {} processed, {} failed, {} notified",
                        state.ticks,
                        report.processed,
                        report.failed,
                        report.notified
                    );
                    if report.cancelled {
                        break;
                    }
                    tracing::info!(
                        "Next check in {}",
                        humantime::format_duration(self.settings.poll_interval)
                    );
                    phase = LoopPhase::Idle;
                }
                LoopPhase::Idle => {
                    tokio::select! {
                        _ = tokio::time::sleep(self.settings.poll_interval) => {
                            phase = LoopPhase::Polling;
                        }
                        _ = self.cancel.cancelled() => {
                            tracing::debug!("Poll loop cancelled while idle");
                            break;
                        }
                    }
                }
            }
        }

        self.deliver(message::SHUTDOWN_MESSAGE).await;
    }

    /// Run one tick over every target. A failing target is logged and
    /// skipped; the rest of the batch still runs.
    pub async fn poll_once(&self, state: &mut PollState) -> TickReport {
        state.ticks += 1;
        let mut report = TickReport::default();
        tracing::info!("Checking availability of {} targets", self.targets.len());

        for (index, target) in self.targets.iter().enumerate() {
            if self.cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }
            if index > 0 && !self.pause_between_targets().await {
                report.cancelled = true;
                break;
            }

            report.processed += 1;
            match self.fetcher.fetch(target, &self.session).await {
                Ok(snapshot) => {
                    state.record_success(&target.name);
                    let total = snapshot.total();
                    let decision = state.tracker.observe(&target.name, snapshot);
                    let Some(text) = self.message_for(state, target, &decision, total) else {
                        continue;
                    };
                    if self.deliver(&text).await {
                        report.notified += 1;
                    }
                }
                Err(e) => {
                    report.failed += 1;
                    let session_failures = state.record_failure(&target.name, &e);
                    if e.is_fetch_failure() {
                        tracing::warn!("'{}': fetch failed: {}", target.name, e);
                    } else {
                        tracing::error!("'{}': unexpected fetch error: {}", target.name, e);
                    }
                    if session_failures == SESSION_WARN_THRESHOLD {
                        tracing::error!(
                            "'{}' failed {} times in a row with an expired session; \
                             refresh the session cookies",
                            target.name,
                            session_failures
                        );
                    }
                }
            }
        }

        if self.cancel.is_cancelled() {
            report.cancelled = true;
        }
        report
    }

    fn message_for(
        &self,
        state: &PollState,
        target: &Target,
        decision: &Decision,
        total: u32,
    ) -> Option<String> {
        match decision {
            Decision::NotifyAvailable { classes } => {
                tracing::info!(
                    "'{}': {} seats available, new: {:?}",
                    target.name,
                    total,
                    classes
                );
                let snapshot = state.tracker.last_known(&target.name)?;
                Some(message::availability(
                    &self.settings.search_name,
                    target,
                    snapshot,
                    classes,
                ))
            }
            Decision::SoldOut { classes } => {
                tracing::info!("'{}': seats gone for {:?}", target.name, classes);
                self.settings
                    .notify_on_sold_out
                    .then(|| message::sold_out(&self.settings.search_name, target, classes))
            }
            Decision::NoChange => {
                if total > 0 {
                    tracing::info!(
                        "'{}': {} seats available (already notified)",
                        target.name,
                        total
                    );
                } else {
                    tracing::info!("'{}': no seats", target.name);
                }
                None
            }
        }
    }

    /// One delivery attempt; a failure is logged and the message is lost
    async fn deliver(&self, text: &str) -> bool {
        match self.notifier.notify(&self.settings.destination, text).await {
            Ok(()) => {
                tracing::info!("Notification sent via '{}'", self.notifier.type_name());
                true
            }
            Err(e) => {
                tracing::warn!(
                    "Notification via '{}' failed: {}",
                    self.notifier.type_name(),
                    e
                );
                false
            }
        }
    }

    /// Returns false if cancelled during the pause
    async fn pause_between_targets(&self) -> bool {
        if self.settings.target_delay.is_zero() {
            return true;
        }
        tokio::select! {
            _ = tokio::time::sleep(self.settings.target_delay) => true,
            _ = self.cancel.cancelled() => false,
        }
    }
}
