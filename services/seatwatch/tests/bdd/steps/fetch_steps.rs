//! BDD step definitions for the backend fetch feature

use std::sync::Arc;

use cucumber::gherkin::Step;
use cucumber::{given, then, when};

use seatwatch::config::{Config, Target};
use seatwatch::fetcher::Fetcher;
use seatwatch::io::{HttpClient, HttpResponse};
use seatwatch::railway::RailwayFetcher;
use seatwatch::session::SessionContext;
use seatwatch::SeatwatchError;

use crate::world::SeatwatchWorld;

/// A mock HTTP client that returns a fixed response for every POST
struct FixedResponseClient {
    response: Result<HttpResponse, String>,
}

#[async_trait::async_trait]
impl HttpClient for FixedResponseClient {
    async fn post_form(
        &self,
        _url: &str,
        _headers: &[(&str, &str)],
        _params: &[(&str, &str)],
    ) -> seatwatch::Result<HttpResponse> {
        match &self.response {
            Ok(r) => Ok(r.clone()),
            Err(msg) => Err(SeatwatchError::Network(msg.clone())),
        }
    }

    async fn post_json(
        &self,
        _url: &str,
        _body: &serde_json::Value,
    ) -> seatwatch::Result<HttpResponse> {
        Ok(HttpResponse {
            status: 200,
            body: r#"{"ok":true}"#.to_string(),
        })
    }
}

#[given(expr = "the booking backend answers HTTP {int} with:")]
fn backend_answers(world: &mut SeatwatchWorld, status: u16, step: &Step) {
    let body = step.docstring.clone().unwrap_or_default();
    world.backend_response = Some(Ok(HttpResponse { status, body }));
}

#[given(expr = "the booking backend answers HTTP {int}")]
fn backend_answers_empty(world: &mut SeatwatchWorld, status: u16) {
    world.backend_response = Some(Ok(HttpResponse {
        status,
        body: String::new(),
    }));
}

#[given("the booking backend is unreachable")]
fn backend_unreachable(world: &mut SeatwatchWorld) {
    world.backend_response = Some(Err("connection refused".to_string()));
}

#[given("seating coaches are ignored")]
fn seating_ignored(world: &mut SeatwatchWorld) {
    world.ignore_seating = true;
}

#[when("the availability of a trip is fetched")]
async fn fetch_trip(world: &mut SeatwatchWorld) {
    let response = world
        .backend_response
        .clone()
        .expect("backend response not set");
    let mut config = Config::default();
    if !world.ignore_seating {
        config.ignored_seat_types.clear();
    }

    let fetcher = RailwayFetcher::new(&config, Arc::new(FixedResponseClient { response }));
    let target = Target {
        name: "Trip 1".to_string(),
        trip_id: "517922".to_string(),
        province_start_id: "74".to_string(),
        province_end_id: "1679".to_string(),
        view_state_holder: "opaque".to_string(),
    };
    world.fetch_result = Some(fetcher.fetch(&target, &SessionContext::default()).await);
}

#[then(expr = "the fetch should fail with {string}")]
fn fetch_fails_with(world: &mut SeatwatchWorld, kind: String) {
    let result = world.fetch_result.as_ref().expect("fetch not run");
    let err = result.as_ref().err().expect("expected fetch to fail");
    let matched = match kind.as_str() {
        "session expired" => matches!(err, SeatwatchError::SessionExpired(_)),
        "network error" => matches!(err, SeatwatchError::Network(_)),
        "unexpected response shape" => matches!(err, SeatwatchError::UnexpectedResponseShape(_)),
        other => panic!("Unknown failure kind: {}", other),
    };
    assert!(matched, "Expected {}, got {:?}", kind, err);
}

#[then(expr = "the snapshot should show {int} seats for {string}")]
fn snapshot_shows(world: &mut SeatwatchWorld, expected: u32, class: String) {
    let result = world.fetch_result.as_ref().expect("fetch not run");
    let snapshot = result.as_ref().expect("expected fetch to succeed");
    assert_eq!(
        snapshot.count(&class),
        expected,
        "counts were {:?}",
        snapshot.counts
    );
}

#[then(expr = "the snapshot should not contain {string}")]
fn snapshot_lacks(world: &mut SeatwatchWorld, class: String) {
    let result = world.fetch_result.as_ref().expect("fetch not run");
    let snapshot = result.as_ref().expect("expected fetch to succeed");
    assert!(
        !snapshot.counts.contains_key(&class),
        "counts were {:?}",
        snapshot.counts
    );
}
