use thiserror::Error;

use crate::Rejection;

/// Failure of a resolve attempt.
#[derive(Debug, Error)]
pub enum GateError {
    /// A gate check failed. Terminal for this request.
    #[error("rejected: {0}")]
    Rejected(Rejection),

    #[error("store error: {0}")]
    Store(#[from] linkgate_store::StoreError),
}

impl From<Rejection> for GateError {
    fn from(r: Rejection) -> Self {
        GateError::Rejected(r)
    }
}

/// Failure talking to the human-verification oracle.
///
/// Every variant counts as a failed verification; none is retried.
#[derive(Debug, Error)]
pub enum OracleError {
    #[error("oracle unreachable: {0}")]
    Unreachable(String),

    #[error("oracle request failed: {0}")]
    RequestFailed(String),

    #[error("invalid oracle response: {0}")]
    InvalidResponse(String),
}
