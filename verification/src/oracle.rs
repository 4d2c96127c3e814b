//! Human-verification oracles (CAPTCHA providers).
//!
//! The gateway never trusts a proof on its own: it hands the opaque token to
//! a [`HumanVerifier`] and treats anything but an explicit pass as a failure.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use crate::OracleError;

/// Default upper bound on a single oracle round trip.
pub const DEFAULT_ORACLE_TIMEOUT: Duration = Duration::from_secs(5);

/// Google's verification endpoint.
pub const RECAPTCHA_VERIFY_URL: &str = "https://www.google.com/recaptcha/api/siteverify";

/// Minimum reCAPTCHA v3 score accepted by default.
pub const DEFAULT_MIN_SCORE: f64 = 0.5;

/// A pluggable human-verification oracle.
#[async_trait]
pub trait HumanVerifier: Send + Sync {
    /// Provider name for logs.
    fn name(&self) -> &str;

    /// Whether `proof` came from a human. Transport failures are errors;
    /// callers treat them as a failed verification and do not retry.
    async fn verify(&self, proof: &str) -> Result<bool, OracleError>;
}

fn build_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout)
        .build()
        .unwrap_or_default()
}

fn map_send_error(e: reqwest::Error) -> OracleError {
    if e.is_timeout() {
        OracleError::Unreachable(format!("request timed out: {e}"))
    } else if e.is_connect() {
        OracleError::Unreachable(format!("connection failed: {e}"))
    } else {
        OracleError::RequestFailed(e.to_string())
    }
}

/// Google reCAPTCHA (v2 or v3) verifier.
pub struct RecaptchaVerifier {
    http_client: reqwest::Client,
    verify_url: String,
    secret: String,
    min_score: f64,
}

#[derive(Debug, Deserialize)]
struct RecaptchaResponse {
    success: bool,
    #[serde(default)]
    score: Option<f64>,
    #[serde(default, rename = "error-codes")]
    error_codes: Vec<String>,
}

impl RecaptchaVerifier {
    pub fn new(secret: impl Into<String>) -> Self {
        Self::with_settings(secret, RECAPTCHA_VERIFY_URL, DEFAULT_MIN_SCORE, DEFAULT_ORACLE_TIMEOUT)
    }

    pub fn with_settings(
        secret: impl Into<String>,
        verify_url: impl Into<String>,
        min_score: f64,
        timeout: Duration,
    ) -> Self {
        Self {
            http_client: build_client(timeout),
            verify_url: verify_url.into(),
            secret: secret.into(),
            min_score,
        }
    }
}

#[async_trait]
impl HumanVerifier for RecaptchaVerifier {
    fn name(&self) -> &str {
        "recaptcha"
    }

    async fn verify(&self, proof: &str) -> Result<bool, OracleError> {
        let response = self
            .http_client
            .post(&self.verify_url)
            .form(&[("secret", self.secret.as_str()), ("response", proof)])
            .send()
            .await
            .map_err(map_send_error)?;

        if !response.status().is_success() {
            return Err(OracleError::RequestFailed(format!(
                "HTTP status {}",
                response.status()
            )));
        }

        let body: RecaptchaResponse = response.json().await.map_err(|e| {
            OracleError::InvalidResponse(format!("failed to parse siteverify response: {e}"))
        })?;

        let passed = match body.score {
            Some(score) => body.success && score >= self.min_score,
            None => body.success,
        };
        if !passed {
            debug!(
                score = ?body.score,
                errors = ?body.error_codes,
                "recaptcha verification failed"
            );
        }
        Ok(passed)
    }
}

/// Self-hosted CAPTCHA service speaking a small JSON protocol.
///
/// `POST {endpoint}` with `{"token": proof}`; passes iff the reply is
/// `{"success": true, "passed": true}`.
pub struct CustomCaptchaVerifier {
    http_client: reqwest::Client,
    endpoint: String,
}

#[derive(Debug, Deserialize)]
struct CustomResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    passed: bool,
}

impl CustomCaptchaVerifier {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            http_client: build_client(timeout),
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl HumanVerifier for CustomCaptchaVerifier {
    fn name(&self) -> &str {
        "custom"
    }

    async fn verify(&self, proof: &str) -> Result<bool, OracleError> {
        let response = self
            .http_client
            .post(&self.endpoint)
            .json(&serde_json::json!({ "token": proof }))
            .send()
            .await
            .map_err(map_send_error)?;

        if !response.status().is_success() {
            return Err(OracleError::RequestFailed(format!(
                "HTTP status {}",
                response.status()
            )));
        }

        let body: CustomResponse = response.json().await.map_err(|e| {
            OracleError::InvalidResponse(format!("failed to parse captcha response: {e}"))
        })?;
        Ok(body.success && body.passed)
    }
}

/// Accepts every proof. Development only.
#[derive(Clone, Copy, Debug, Default)]
pub struct DisabledVerifier;

#[async_trait]
impl HumanVerifier for DisabledVerifier {
    fn name(&self) -> &str {
        "disabled"
    }

    async fn verify(&self, _proof: &str) -> Result<bool, OracleError> {
        warn!("human verification is disabled; accepting proof unchecked");
        Ok(true)
    }
}
