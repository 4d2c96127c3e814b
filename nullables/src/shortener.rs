//! Nullable link shortener: deterministic short URLs, no network.

use async_trait::async_trait;
use linkgate_node::{Shortener, ShortenerError};
use std::sync::Mutex;

/// A [`Shortener`] that never leaves the process.
///
/// Returns `{prefix}{n}` for the n-th call (or a scripted error) and records
/// every request.
#[derive(Debug)]
pub struct NullShortener {
    prefix: String,
    failure: Option<ShortenerError>,
    calls: Mutex<Vec<(String, String)>>,
}

impl NullShortener {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            failure: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Fail every call with `error`.
    pub fn failing(error: ShortenerError) -> Self {
        Self {
            failure: Some(error),
            ..Self::new("")
        }
    }

    /// `(api_key, long_url)` pairs seen so far.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Shortener for NullShortener {
    async fn shorten(&self, api_key: &str, long_url: &str) -> Result<String, ShortenerError> {
        let n = match self.calls.lock() {
            Ok(mut calls) => {
                calls.push((api_key.to_string(), long_url.to_string()));
                calls.len()
            }
            Err(_) => return Err(ShortenerError::Failed("call log poisoned".into())),
        };
        match &self.failure {
            Some(err) => Err(err.clone()),
            None => Ok(format!("{}{n}", self.prefix)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn numbers_calls_and_records_them() {
        let shortener = NullShortener::new("https://short.test/");
        assert_eq!(
            shortener.shorten("k1", "https://a").await.unwrap(),
            "https://short.test/1"
        );
        assert_eq!(
            shortener.shorten("k2", "https://b").await.unwrap(),
            "https://short.test/2"
        );
        assert_eq!(
            shortener.calls(),
            vec![
                ("k1".to_string(), "https://a".to_string()),
                ("k2".to_string(), "https://b".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn failing_shortener_returns_scripted_error() {
        let failing = NullShortener::failing(ShortenerError::Timeout("slow".into()));
        assert_eq!(
            failing.shorten("k", "u").await,
            Err(ShortenerError::Timeout("slow".into()))
        );
        assert_eq!(failing.calls().len(), 1);
    }
}
