//! Railway booking backend client
//!
//! Talks to the coach-availability endpoint that the booking site's own
//! seat-selection page calls over XHR. The payload is undocumented and can
//! change without notice, so everything we cannot interpret is reported as
//! a distinct failure instead of being read as "no seats".

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::{Config, Target};
use crate::fetcher::Fetcher;
use crate::io::HttpClient;
use crate::session::SessionContext;
use crate::snapshot::{CoachAvailability, Snapshot};
use crate::SeatwatchError;

const COACH_PATH: &str = "/booking/booking/getTrainCoach";

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/144.0.0.0 Safari/537.36";

/// Headers the site's own XHR sends; some are checked by the backend
const AJAX_HEADERS: &[(&str, &str)] = &[
    ("Accept", "*/*"),
    ("Accept-Language", "en-US,en;q=0.9"),
    ("X-Requested-With", "XMLHttpRequest"),
    ("Sec-Fetch-Dest", "empty"),
    ("Sec-Fetch-Mode", "cors"),
    ("Sec-Fetch-Site", "same-origin"),
    ("User-Agent", USER_AGENT),
];

/// Statuses the backend uses when the session cookies are no longer valid.
/// It answers a stale session with a bare 500 rather than a 401.
const SESSION_STATUSES: &[u16] = &[401, 403, 500];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CoachResponse {
    result: Option<bool>,
    #[serde(default)]
    data: Option<CoachData>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CoachData {
    #[serde(default)]
    results: Option<Vec<Coach>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Coach {
    #[serde(default)]
    available_seat_count: i64,
    #[serde(default)]
    coach_no: Option<serde_json::Value>,
    #[serde(default)]
    coach_class_desc_en: Option<String>,
    #[serde(default)]
    coach_seat_type_en: Option<String>,
    #[serde(default)]
    coach_air_type_en: Option<String>,
}

impl Coach {
    fn seat_type(&self) -> &str {
        self.coach_seat_type_en.as_deref().unwrap_or("Unknown")
    }

    fn seat_class(&self) -> String {
        let class = self.coach_class_desc_en.as_deref().unwrap_or("Unknown");
        let mut desc = format!("{} - {}", class, self.seat_type());
        if let Some(air) = self.coach_air_type_en.as_deref().filter(|a| !a.is_empty()) {
            desc.push_str(&format!(" ({})", air));
        }
        desc
    }

    fn coach_no(&self) -> String {
        match &self.coach_no {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(serde_json::Value::Null) | None => "?".to_string(),
            Some(other) => other.to_string(),
        }
    }

    fn available(&self) -> u32 {
        u32::try_from(self.available_seat_count.max(0)).unwrap_or(u32::MAX)
    }
}

/// Turn a coach-availability response body into a snapshot
///
/// Coaches whose seat type is listed in `ignored_seat_types` are dropped.
pub fn parse_coach_response(body: &str, ignored_seat_types: &[String]) -> crate::Result<Snapshot> {
    if body.trim_start().starts_with('<') {
        return Err(SeatwatchError::SessionExpired(
            "backend returned an HTML page instead of JSON".to_string(),
        ));
    }

    let parsed: CoachResponse = serde_json::from_str(body)
        .map_err(|e| SeatwatchError::UnexpectedResponseShape(format!("invalid JSON: {}", e)))?;

    match parsed.result {
        Some(true) => {}
        Some(false) => {
            return Err(SeatwatchError::SessionExpired(format!(
                "backend rejected the request{}",
                parsed
                    .message
                    .map(|m| format!(": {}", m))
                    .unwrap_or_default()
            )));
        }
        None => {
            return Err(SeatwatchError::UnexpectedResponseShape(
                "missing 'result' flag".to_string(),
            ));
        }
    }

    let coaches = parsed
        .data
        .ok_or_else(|| SeatwatchError::UnexpectedResponseShape("missing 'data'".to_string()))?
        .results
        .ok_or_else(|| {
            SeatwatchError::UnexpectedResponseShape("missing 'data.results'".to_string())
        })?;

    if coaches.is_empty() {
        return Err(SeatwatchError::UnexpectedResponseShape(
            "coach list is empty".to_string(),
        ));
    }

    let coaches = coaches
        .iter()
        .filter(|c| !ignored_seat_types.iter().any(|t| t == c.seat_type()))
        .map(|c| CoachAvailability {
            coach_no: c.coach_no(),
            seat_class: c.seat_class(),
            available: c.available(),
        })
        .collect();

    Ok(Snapshot::from_coaches(coaches))
}

/// Fetcher for the railway booking backend
pub struct RailwayFetcher {
    coach_url: String,
    origin: String,
    referer: String,
    ignored_seat_types: Vec<String>,
    http: Arc<dyn HttpClient>,
}

impl std::fmt::Debug for RailwayFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RailwayFetcher")
            .field("coach_url", &self.coach_url)
            .finish()
    }
}

/// Scheme and host of a URL, e.g. `https://example.com`
fn origin_of(url: &str) -> &str {
    let host_start = url.find("://").map(|i| i + 3).unwrap_or(0);
    match url[host_start..].find('/') {
        Some(i) => &url[..host_start + i],
        None => url,
    }
}

impl RailwayFetcher {
    pub fn new(config: &Config, http: Arc<dyn HttpClient>) -> Self {
        let base = config.backend.base_url.trim_end_matches('/');
        let coach_url = format!("{}{}", base, COACH_PATH);

        tracing::debug!("Created RailwayFetcher for {}", coach_url);

        Self {
            coach_url,
            origin: origin_of(base).to_string(),
            referer: format!("{}/booking/booking", base),
            ignored_seat_types: config.ignored_seat_types.clone(),
            http,
        }
    }

    /// Browser headers first, then the session's own headers; a session
    /// header replaces a default of the same name
    fn headers(&self, session: &SessionContext) -> Vec<(String, String)> {
        let session_headers = session.request_headers();
        let mut headers: Vec<(String, String)> = AJAX_HEADERS
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .chain([
                ("Origin".to_string(), self.origin.clone()),
                ("Referer".to_string(), self.referer.clone()),
            ])
            .filter(|(k, _)| {
                !session_headers
                    .iter()
                    .any(|(name, _)| name.eq_ignore_ascii_case(k))
            })
            .collect();
        headers.extend(session_headers);
        headers
    }
}

#[async_trait]
impl Fetcher for RailwayFetcher {
    async fn fetch(&self, target: &Target, session: &SessionContext) -> crate::Result<Snapshot> {
        tracing::debug!("Fetching coaches for '{}' (trip {})", target.name, target.trip_id);

        let owned_headers = self.headers(session);
        let headers: Vec<(&str, &str)> = owned_headers
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        let params = [
            ("tripId", target.trip_id.as_str()),
            ("provinceStartId", target.province_start_id.as_str()),
            ("provinceEndId", target.province_end_id.as_str()),
            ("viewStateHolder", target.view_state_holder.as_str()),
        ];

        let response = self.http.post_form(&self.coach_url, &headers, &params).await?;

        if SESSION_STATUSES.contains(&response.status) {
            return Err(SeatwatchError::SessionExpired(format!(
                "backend returned HTTP {}",
                response.status
            )));
        }
        if response.status != 200 {
            return Err(SeatwatchError::Network(format!(
                "backend returned HTTP {}",
                response.status
            )));
        }

        let snapshot = parse_coach_response(&response.body, &self.ignored_seat_types)?;
        tracing::debug!(
            "'{}': {} seat classes, {} seats",
            target.name,
            snapshot.counts.len(),
            snapshot.total()
        );
        Ok(snapshot)
    }
}
