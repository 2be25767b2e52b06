//! Operator-supplied session context for the ticketing backend
//!
//! The backend only answers requests carrying the cookies of a live browser
//! session. Those cookies are copied out of a browser by the operator and go
//! stale after a while; nothing here renews them. A stale session shows up as
//! [`SeatwatchError::SessionExpired`](crate::SeatwatchError::SessionExpired)
//! from the fetcher.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Cookies and extra headers replayed on every backend request
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    #[serde(default)]
    pub cookies: BTreeMap<String, String>,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("cookies", &self.cookies.keys().collect::<Vec<_>>())
            .field("headers", &self.headers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl SessionContext {
    /// Replace all cookies with the pairs of a raw `Cookie` header value,
    /// e.g. `JSESSIONID=abc; lang=en`
    pub fn set_cookie_header(&mut self, raw: &str) {
        self.cookies = raw
            .split(';')
            .filter_map(|pair| {
                let (name, value) = pair.split_once('=')?;
                let name = name.trim();
                if name.is_empty() {
                    return None;
                }
                Some((name.to_string(), value.trim().to_string()))
            })
            .collect();
    }

    /// The `Cookie` header value, or `None` when there are no cookies
    pub fn cookie_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        Some(
            self.cookies
                .iter()
                .map(|(name, value)| format!("{}={}", name, value))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }

    /// All session headers as owned pairs, cookie header included.
    /// A `Cookie` entry in `headers` is dropped when cookies are set.
    pub fn request_headers(&self) -> Vec<(String, String)> {
        let cookie = self.cookie_header();
        let mut headers: Vec<(String, String)> = self
            .headers
            .iter()
            .filter(|(k, _)| cookie.is_none() || !k.eq_ignore_ascii_case("cookie"))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        if let Some(cookie) = cookie {
            headers.push(("Cookie".to_string(), cookie));
        }
        headers
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty() && self.headers.is_empty()
    }
}
