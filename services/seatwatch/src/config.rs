//! Configuration types for the seatwatch service

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::session::SessionContext;

pub const ENV_BOT_TOKEN: &str = "TELEGRAM_BOT_TOKEN";
pub const ENV_CHAT_ID: &str = "TELEGRAM_CHAT_ID";
pub const ENV_INTERVAL_MINUTES: &str = "CHECK_INTERVAL_MINUTES";
pub const ENV_COOKIE: &str = "SEATWATCH_COOKIE";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_search_name")]
    pub search_name: String,
    #[serde(default = "default_poll_interval", with = "humantime_serde")]
    pub poll_interval: Duration,
    #[serde(default = "default_request_timeout", with = "humantime_serde")]
    pub request_timeout: Duration,
    #[serde(default = "default_target_delay", with = "humantime_serde")]
    pub target_delay: Duration,
    #[serde(default)]
    pub notify_on_sold_out: bool,
    #[serde(default = "default_ignored_seat_types")]
    pub ignored_seat_types: Vec<String>,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub session: SessionContext,
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub targets: Vec<Target>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            search_name: default_search_name(),
            poll_interval: default_poll_interval(),
            request_timeout: default_request_timeout(),
            target_delay: default_target_delay(),
            notify_on_sold_out: false,
            ignored_seat_types: default_ignored_seat_types(),
            backend: BackendConfig::default(),
            session: SessionContext::default(),
            telegram: TelegramConfig::default(),
            targets: Vec::new(),
        }
    }
}

/// One monitored trip. Field aliases accept the names the booking site uses
/// in its own form posts, so entries can be pasted from captured requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub name: String,
    #[serde(alias = "tripId")]
    pub trip_id: String,
    #[serde(alias = "provinceStartId")]
    pub province_start_id: String,
    #[serde(alias = "provinceEndId")]
    pub province_end_id: String,
    #[serde(alias = "viewStateHolder")]
    pub view_state_holder: String,
}

/// Ticketing backend location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_backend_url")]
    pub base_url: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_backend_url(),
        }
    }
}

/// Telegram bot credentials and destination
#[derive(Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    #[serde(default)]
    pub bot_token: Option<String>,
    #[serde(default)]
    pub chat_id: Option<String>,
    #[serde(default = "default_telegram_api")]
    pub api_base: String,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            chat_id: None,
            api_base: default_telegram_api(),
        }
    }
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &self.bot_token.as_ref().map(|_| "<redacted>"))
            .field("chat_id", &self.chat_id)
            .field("api_base", &self.api_base)
            .finish()
    }
}

fn default_search_name() -> String {
    "Train seat availability".to_string()
}

fn default_poll_interval() -> Duration {
    Duration::from_secs(5 * 60)
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_target_delay() -> Duration {
    Duration::from_secs(1)
}

fn default_ignored_seat_types() -> Vec<String> {
    vec!["Seating Coach".to_string()]
}

fn default_backend_url() -> String {
    "https://dticket.railway.co.th/DTicketPublicWeb".to_string()
}

fn default_telegram_api() -> String {
    "https://api.telegram.org".to_string()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl Config {
    /// Apply environment overrides on top of the file configuration
    pub fn apply_environment(&mut self) -> crate::Result<()> {
        self.apply_env_with(|key| std::env::var(key).ok())
    }

    /// Apply overrides using the given variable lookup
    pub fn apply_env_with<F>(&mut self, lookup: F) -> crate::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = non_blank(lookup(ENV_BOT_TOKEN)) {
            self.telegram.bot_token = Some(token);
        }
        if let Some(chat_id) = non_blank(lookup(ENV_CHAT_ID)) {
            self.telegram.chat_id = Some(chat_id);
        }
        if let Some(minutes) = non_blank(lookup(ENV_INTERVAL_MINUTES)) {
            let minutes: u64 = minutes.trim().parse().map_err(|_| {
                crate::SeatwatchError::Config(format!(
                    "{} must be a whole number of minutes, got '{}'",
                    ENV_INTERVAL_MINUTES, minutes
                ))
            })?;
            let seconds = minutes.checked_mul(60).ok_or_else(|| {
                crate::SeatwatchError::Config(format!(
                    "{} is out of range: {}",
                    ENV_INTERVAL_MINUTES, minutes
                ))
            })?;
            self.poll_interval = Duration::from_secs(seconds);
        }
        if let Some(cookie) = non_blank(lookup(ENV_COOKIE)) {
            self.session.set_cookie_header(&cookie);
        }
        Ok(())
    }

    /// Check that everything required to start polling is present
    pub fn validate(&self) -> crate::Result<()> {
        if non_blank(self.telegram.bot_token.clone()).is_none() {
            return Err(crate::SeatwatchError::Config(format!(
                "{} is not set",
                ENV_BOT_TOKEN
            )));
        }
        if non_blank(self.telegram.chat_id.clone()).is_none() {
            return Err(crate::SeatwatchError::Config(format!(
                "{} is not set",
                ENV_CHAT_ID
            )));
        }
        if self.poll_interval.is_zero() {
            return Err(crate::SeatwatchError::Config(
                "poll interval must be greater than zero".to_string(),
            ));
        }
        if self.targets.is_empty() {
            return Err(crate::SeatwatchError::Config(
                "no targets configured".to_string(),
            ));
        }

        let mut names = HashSet::new();
        for target in &self.targets {
            if target.trip_id.trim().is_empty() {
                return Err(crate::SeatwatchError::Config(format!(
                    "target '{}' has an empty trip id",
                    target.name
                )));
            }
            if !names.insert(target.name.as_str()) {
                return Err(crate::SeatwatchError::Config(format!(
                    "duplicate target name '{}'",
                    target.name
                )));
            }
        }

        if self.session.is_empty() {
            tracing::warn!(
                "No session cookies configured; the backend will likely reject every request"
            );
        }
        Ok(())
    }
}

/// Load configuration from a JSON file
pub fn load_config(path: &Path) -> crate::Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        crate::SeatwatchError::Config(format!("Failed to read config file {:?}: {}", path, e))
    })?;
    let config: Config = serde_json::from_str(&content)?;
    Ok(config)
}
