//! Nullable human verifier: scripted CAPTCHA verdicts.

use async_trait::async_trait;
use linkgate_verification::{HumanVerifier, OracleError};
use std::sync::Mutex;

/// A [`HumanVerifier`] that passes exactly the proofs it was told to accept
/// and remembers every proof it was shown.
#[derive(Debug, Default)]
pub struct NullHumanVerifier {
    accepted: Vec<String>,
    seen: Mutex<Vec<String>>,
}

impl NullHumanVerifier {
    /// Accept only the listed proofs.
    pub fn accepting<I, S>(proofs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            accepted: proofs.into_iter().map(Into::into).collect(),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Reject everything.
    pub fn rejecting() -> Self {
        Self::default()
    }

    /// Proofs presented so far, in order.
    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl HumanVerifier for NullHumanVerifier {
    fn name(&self) -> &str {
        "null-verifier"
    }

    async fn verify(&self, proof: &str) -> Result<bool, OracleError> {
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(proof.to_string());
        }
        Ok(self.accepted.iter().any(|p| p == proof))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn passes_only_scripted_proofs() {
        let verifier = NullHumanVerifier::accepting(["human"]);
        assert!(verifier.verify("human").await.unwrap());
        assert!(!verifier.verify("bot").await.unwrap());
        assert_eq!(verifier.seen(), vec!["human", "bot"]);
    }
}
