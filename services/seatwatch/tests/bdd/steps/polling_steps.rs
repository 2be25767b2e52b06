//! BDD step definitions for the poll loop features

use std::sync::Arc;
use std::time::Duration;

use cucumber::{given, then, when};
use tokio_util::sync::CancellationToken;

use seatwatch::config::Target;
use seatwatch::engine::{Engine, EngineSettings};
use seatwatch::session::SessionContext;
use seatwatch::snapshot::Snapshot;

use crate::world::{ScriptedResponse, SeatwatchWorld};

/// Parse "1st class=0, 2nd class=3" into a snapshot
fn parse_counts(spec: &str) -> Snapshot {
    Snapshot::from_counts(spec.split(',').filter(|s| !s.trim().is_empty()).map(|pair| {
        let (class, count) = pair
            .split_once('=')
            .unwrap_or_else(|| panic!("bad count '{}'", pair));
        let count: u32 = count
            .trim()
            .parse()
            .unwrap_or_else(|_| panic!("bad count '{}'", pair));
        (class.trim().to_string(), count)
    }))
}

fn parse_failure(kind: &str) -> ScriptedResponse {
    match kind {
        "session expired" => ScriptedResponse::SessionExpired,
        "network error" => ScriptedResponse::NetworkError,
        "unexpected response shape" => ScriptedResponse::UnexpectedShape,
        other => panic!("Unknown failure kind: {}", other),
    }
}

fn target(name: &str) -> Target {
    Target {
        name: name.to_string(),
        trip_id: format!("trip-{}", name.replace(' ', "-")),
        province_start_id: "74".to_string(),
        province_end_id: "1679".to_string(),
        view_state_holder: "opaque".to_string(),
    }
}

#[given(expr = "the watched trips {string}")]
fn watched_trips(world: &mut SeatwatchWorld, names: String) {
    world.targets = names
        .split(',')
        .map(|n| target(n.trim()))
        .collect();
}

#[given(expr = "the backend reports {string} for {string}")]
async fn backend_reports(world: &mut SeatwatchWorld, counts: String, trip: String) {
    world
        .fetcher
        .responses
        .write()
        .await
        .insert(trip, ScriptedResponse::Seats(parse_counts(&counts)));
}

#[given(expr = "the backend fails with {string} for {string}")]
async fn backend_fails(world: &mut SeatwatchWorld, kind: String, trip: String) {
    world
        .fetcher
        .responses
        .write()
        .await
        .insert(trip, parse_failure(&kind));
}

#[given("sold-out notifications are enabled")]
fn sold_out_enabled(world: &mut SeatwatchWorld) {
    world.notify_on_sold_out = true;
}

#[when("the monitor polls")]
async fn monitor_polls(world: &mut SeatwatchWorld) {
    let engine = Engine::new(
        Arc::clone(&world.fetcher) as Arc<dyn seatwatch::fetcher::Fetcher>,
        Arc::clone(&world.notifier) as Arc<dyn seatwatch::notifier::Notifier>,
        world.targets.clone(),
        SessionContext::default(),
        EngineSettings {
            search_name: "BDD search".to_string(),
            destination: "42".to_string(),
            poll_interval: Duration::from_secs(300),
            target_delay: Duration::ZERO,
            notify_on_sold_out: world.notify_on_sold_out,
        },
        CancellationToken::new(),
    );

    world.sent_before_poll = world.notifier.messages.read().await.len();
    let report = engine.poll_once(&mut world.state).await;
    world.last_report = Some(report);
}

#[then(expr = "the poll should send {int} notification(s)")]
async fn poll_sent(world: &mut SeatwatchWorld, expected: usize) {
    let sent = world.notifier.messages.read().await.len() - world.sent_before_poll;
    assert_eq!(
        sent, expected,
        "Expected {} notifications from the last poll, got {}",
        expected, sent
    );
}

#[then(expr = "the last notification should mention {string}")]
async fn last_mentions(world: &mut SeatwatchWorld, expected: String) {
    let messages = world.notifier.messages.read().await;
    let last = messages.last().expect("no notification sent");
    assert!(
        last.contains(&expected),
        "Expected message to contain '{}', got '{}'",
        expected,
        last
    );
}

#[then(expr = "the last notification should not mention {string}")]
async fn last_does_not_mention(world: &mut SeatwatchWorld, unexpected: String) {
    let messages = world.notifier.messages.read().await;
    let last = messages.last().expect("no notification sent");
    // Only the "New:" line names the classes that triggered the message
    let new_line = last
        .lines()
        .find(|l| l.starts_with("New:"))
        .unwrap_or_default();
    assert!(
        !new_line.contains(&unexpected),
        "Expected '{}' not to be listed as new, got '{}'",
        unexpected,
        new_line
    );
}

#[then(expr = "the poll should report {int} failed target(s)")]
fn poll_failed(world: &mut SeatwatchWorld, expected: usize) {
    let report = world.last_report.as_ref().expect("no poll ran");
    assert_eq!(report.failed, expected);
}

#[then(expr = "the poll should have processed {int} target(s)")]
fn poll_processed(world: &mut SeatwatchWorld, expected: usize) {
    let report = world.last_report.as_ref().expect("no poll ran");
    assert_eq!(report.processed, expected);
}

#[then(expr = "{string} should have {int} consecutive failure(s)")]
fn consecutive_failures(world: &mut SeatwatchWorld, trip: String, expected: u32) {
    assert_eq!(world.state.health(&trip).consecutive_failures, expected);
}
