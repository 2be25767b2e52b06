//! Telegram Bot API notification client

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::TelegramConfig;
use crate::io::HttpClient;
use crate::notifier::Notifier;
use crate::SeatwatchError;

#[derive(Debug, Deserialize)]
struct ApiReply {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Telegram notification sender
pub struct TelegramNotifier {
    send_url: String,
    http: Arc<dyn HttpClient>,
}

impl std::fmt::Debug for TelegramNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramNotifier").finish_non_exhaustive()
    }
}

impl TelegramNotifier {
    pub fn new(config: &TelegramConfig, http: Arc<dyn HttpClient>) -> crate::Result<Self> {
        let token = config
            .bot_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| SeatwatchError::Config("Telegram bot token is not set".to_string()))?;

        let send_url = format!(
            "{}/bot{}/sendMessage",
            config.api_base.trim_end_matches('/'),
            token
        );

        tracing::debug!("Created TelegramNotifier for {}", config.api_base);

        Ok(Self { send_url, http })
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    fn type_name(&self) -> &str {
        "telegram"
    }

    async fn notify(&self, destination: &str, message: &str) -> crate::Result<()> {
        let payload = serde_json::json!({
            "chat_id": destination,
            "text": message,
            "parse_mode": "HTML",
        });

        tracing::debug!(
            "Sending Telegram message to {} ({} chars)",
            destination,
            message.chars().count()
        );

        let response = self
            .http
            .post_json(&self.send_url, &payload)
            .await
            .map_err(|e| SeatwatchError::Delivery(e.to_string()))?;

        let reply = serde_json::from_str::<ApiReply>(&response.body).ok();
        let description = reply
            .as_ref()
            .and_then(|r| r.description.clone())
            .unwrap_or_else(|| response.body.clone());

        if response.status != 200 {
            return Err(SeatwatchError::Delivery(format!(
                "Telegram API returned status {}: {}",
                response.status, description
            )));
        }
        if reply.as_ref().is_some_and(|r| !r.ok) {
            return Err(SeatwatchError::Delivery(format!(
                "Telegram API rejected the message: {}",
                description
            )));
        }

        tracing::debug!("Telegram message sent successfully");
        Ok(())
    }
}
