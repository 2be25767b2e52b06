//! HTTP client abstraction for testability

use std::time::Duration;

use async_trait::async_trait;

/// HTTP response from a request
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

/// Abstraction over HTTP client for dependency injection
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait HttpClient: Send + Sync {
    /// Send a POST request with extra headers and a form-encoded body
    async fn post_form(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        params: &[(&str, &str)],
    ) -> crate::Result<HttpResponse>;

    /// Send a POST request with a JSON body
    async fn post_json(&self, url: &str, body: &serde_json::Value)
        -> crate::Result<HttpResponse>;
}

/// Production HTTP client using reqwest
///
/// Every request is bounded by the timeout given at construction; a timeout
/// surfaces as a network error for that call only.
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

impl ReqwestHttpClient {
    pub fn new(timeout: Duration) -> crate::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| crate::SeatwatchError::Config(format!("Building HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

fn describe(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        format!("request timed out: {}", e)
    } else {
        e.to_string()
    }
}

/// URLs for the messaging API embed the bot token, so only the host and the
/// first path segment make it into logs.
fn redact(url: &str) -> &str {
    match url.find("/bot") {
        Some(idx) => &url[..idx],
        None => url,
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn post_form(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        params: &[(&str, &str)],
    ) -> crate::Result<HttpResponse> {
        tracing::debug!("POST {}", url);
        let mut request = self.client.post(url).form(params);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        let response = request.send().await.map_err(|e| {
            crate::SeatwatchError::Network(format!("POST {} failed: {}", url, describe(&e)))
        })?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| {
            crate::SeatwatchError::Network(format!("Reading response body: {}", describe(&e)))
        })?;

        tracing::debug!("POST {} -> {} ({} bytes)", url, status, body.len());
        Ok(HttpResponse { status, body })
    }

    async fn post_json(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> crate::Result<HttpResponse> {
        let shown = redact(url);
        tracing::debug!("POST {}/...", shown);
        let response = self.client.post(url).json(body).send().await.map_err(|e| {
            crate::SeatwatchError::Network(format!(
                "POST {}/... failed: {}",
                shown,
                describe(&e.without_url())
            ))
        })?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| {
            crate::SeatwatchError::Network(format!(
                "Reading response body: {}",
                describe(&e.without_url())
            ))
        })?;

        tracing::debug!("POST {}/... -> {} ({} bytes)", shown, status, body.len());
        Ok(HttpResponse { status, body })
    }
}
