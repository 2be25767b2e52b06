//! BDD step definitions for notification feature

use std::sync::Arc;

use cucumber::{given, then, when};
use tokio::sync::RwLock;

use seatwatch::config::TelegramConfig;
use seatwatch::io::{HttpClient, HttpResponse};
use seatwatch::notifier::Notifier;
use seatwatch::telegram::TelegramNotifier;
use seatwatch::SeatwatchError;

use crate::world::SeatwatchWorld;

/// Mock HTTP client for the Telegram API that records payloads
struct RecordingTelegramClient {
    reply: HttpResponse,
    payloads: Arc<RwLock<Vec<serde_json::Value>>>,
}

#[async_trait::async_trait]
impl HttpClient for RecordingTelegramClient {
    async fn post_form(
        &self,
        _url: &str,
        _headers: &[(&str, &str)],
        _params: &[(&str, &str)],
    ) -> seatwatch::Result<HttpResponse> {
        Err(SeatwatchError::Network("unexpected form post".to_string()))
    }

    async fn post_json(
        &self,
        _url: &str,
        body: &serde_json::Value,
    ) -> seatwatch::Result<HttpResponse> {
        self.payloads.write().await.push(body.clone());
        Ok(self.reply.clone())
    }
}

#[given("the Telegram API accepts messages")]
fn telegram_accepts(world: &mut SeatwatchWorld) {
    world.telegram_reply = Some(HttpResponse {
        status: 200,
        body: r#"{"ok":true,"result":{"message_id":1}}"#.to_string(),
    });
}

#[given(expr = "the Telegram API answers HTTP {int} saying {string}")]
fn telegram_rejects(world: &mut SeatwatchWorld, status: u16, description: String) {
    world.telegram_reply = Some(HttpResponse {
        status,
        body: serde_json::json!({
            "ok": false,
            "error_code": status,
            "description": description,
        })
        .to_string(),
    });
}

#[when(expr = "the message {string} is sent to chat {string}")]
async fn send_message(world: &mut SeatwatchWorld, message: String, chat: String) {
    let client = RecordingTelegramClient {
        reply: world.telegram_reply.clone().expect("Telegram reply not set"),
        payloads: Arc::clone(&world.telegram_payloads),
    };
    let config = TelegramConfig {
        bot_token: Some("123:abc".to_string()),
        chat_id: Some(chat.clone()),
        ..TelegramConfig::default()
    };
    let notifier = TelegramNotifier::new(&config, Arc::new(client)).expect("valid config");
    world.delivery_result = Some(notifier.notify(&chat, &message).await);
}

#[then("the message should be delivered")]
fn message_delivered(world: &mut SeatwatchWorld) {
    let result = world.delivery_result.as_ref().expect("nothing sent");
    assert!(result.is_ok(), "Expected delivery to succeed, got {:?}", result);
}

#[then(expr = "delivery should fail mentioning {string}")]
fn delivery_failed(world: &mut SeatwatchWorld, expected: String) {
    let result = world.delivery_result.as_ref().expect("nothing sent");
    match result {
        Err(e @ SeatwatchError::Delivery(_)) => assert!(
            e.to_string().contains(&expected),
            "Expected error to contain '{}', got '{}'",
            expected,
            e
        ),
        other => panic!("expected a delivery error, got {:?}", other),
    }
}

#[then(expr = "the Telegram API should have received chat {string} in {string} mode")]
async fn api_received(world: &mut SeatwatchWorld, chat: String, mode: String) {
    let payloads = world.telegram_payloads.read().await;
    let last = payloads.last().expect("no payload recorded");
    assert_eq!(last["chat_id"], serde_json::Value::String(chat));
    assert_eq!(last["parse_mode"], serde_json::Value::String(mode));
}

#[then(expr = "the Telegram API should have received {int} message(s)")]
async fn api_count(world: &mut SeatwatchWorld, expected: usize) {
    assert_eq!(world.telegram_payloads.read().await.len(), expected);
}
