//! Ad-shortener client.
//!
//! The outward link a user receives is the gateway's resolve URL wrapped by
//! the owner's shortener account, so the user passes through the shortener's
//! interstitial before reaching the gate.

use async_trait::async_trait;
use linkgate_utils::mask_secret;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// LinkShortify's text-format API.
pub const LINKSHORTIFY_API_URL: &str = "https://linkshortify.com/api";

/// Default upper bound on one shortener round trip.
pub const DEFAULT_SHORTENER_TIMEOUT: Duration = Duration::from_secs(8);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ShortenerError {
    #[error("shortener timed out: {0}")]
    Timeout(String),

    #[error("shortener failed: {0}")]
    Failed(String),
}

/// Wraps a URL with a third-party shortener account.
#[async_trait]
pub trait Shortener: Send + Sync {
    /// Shorten `long_url` using the account identified by `api_key`.
    async fn shorten(&self, api_key: &str, long_url: &str) -> Result<String, ShortenerError>;
}

/// Client for the LinkShortify API.
///
/// `GET {api_url}?api=KEY&url=ENCODED&format=text` returns the short URL as a
/// plain-text body.
pub struct LinkShortifyClient {
    http_client: reqwest::Client,
    api_url: String,
}

impl LinkShortifyClient {
    pub fn new() -> Self {
        Self::with_settings(LINKSHORTIFY_API_URL, DEFAULT_SHORTENER_TIMEOUT)
    }

    pub fn with_settings(api_url: impl Into<String>, timeout: Duration) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .unwrap_or_default();
        Self {
            http_client,
            api_url: api_url.into(),
        }
    }
}

impl Default for LinkShortifyClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Shortener for LinkShortifyClient {
    async fn shorten(&self, api_key: &str, long_url: &str) -> Result<String, ShortenerError> {
        debug!(key = %mask_secret(api_key), "requesting short link");

        let response = self
            .http_client
            .get(&self.api_url)
            .query(&[("api", api_key), ("url", long_url), ("format", "text")])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ShortenerError::Timeout(e.to_string())
                } else {
                    ShortenerError::Timeout(format!("transport failure: {e}"))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(key = %mask_secret(api_key), %status, "shortener returned error status");
            return Err(ShortenerError::Failed(format!("HTTP status {status}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ShortenerError::Timeout(format!("reading body: {e}")))?;
        let short = body.trim();
        if short.is_empty() || short.to_ascii_lowercase().contains("error") {
            warn!(key = %mask_secret(api_key), "shortener rejected request");
            return Err(ShortenerError::Failed("empty or error response".into()));
        }
        Ok(short.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer, timeout: Duration) -> LinkShortifyClient {
        LinkShortifyClient::with_settings(format!("{}/api", server.uri()), timeout)
    }

    #[tokio::test]
    async fn returns_trimmed_text_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api"))
            .and(query_param("api", "owner-key"))
            .and(query_param("url", "https://gw.example/v5/resolve/abc"))
            .and(query_param("format", "text"))
            .respond_with(ResponseTemplate::new(200).set_body_string("https://lksfy.com/Xy12\n"))
            .expect(1)
            .mount(&server)
            .await;

        let short = client(&server, Duration::from_secs(2))
            .shorten("owner-key", "https://gw.example/v5/resolve/abc")
            .await
            .unwrap();
        assert_eq!(short, "https://lksfy.com/Xy12");
    }

    #[tokio::test]
    async fn error_bodies_and_statuses_fail() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("api", "bad"))
            .respond_with(ResponseTemplate::new(200).set_body_string("Error: invalid api key"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(query_param("api", "empty"))
            .respond_with(ResponseTemplate::new(200).set_body_string("  "))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(query_param("api", "down"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let c = client(&server, Duration::from_secs(2));
        for key in ["bad", "empty", "down"] {
            let err = c.shorten(key, "https://x.example").await.unwrap_err();
            assert!(matches!(err, ShortenerError::Failed(_)), "{key}: {err:?}");
        }
    }

    #[tokio::test]
    async fn slow_shortener_is_a_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("https://lksfy.com/late")
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let err = client(&server, Duration::from_millis(300))
            .shorten("k", "https://x.example")
            .await
            .unwrap_err();
        assert!(matches!(err, ShortenerError::Timeout(_)));
    }
}
