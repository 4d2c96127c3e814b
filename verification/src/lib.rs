//! The verification gate behind session resolution.
//!
//! A resolve request must clear six ordered checks before its session is
//! consumed and the target disclosed:
//!
//! 1. **Existence**: the session is known and inside its TTL window.
//! 2. **Anti-replay**: the session has not been consumed.
//! 3. **Fingerprint**: the request comes from the IP that minted the session.
//! 4. **Dwell time**: enough time has passed since minting.
//! 5. **Referer**: the user arrives from a trusted upstream domain.
//! 6. **Browser binding**: the session cookie set at minting is presented.
//!
//! The first failing check names the [`Rejection`]. Checks 3–6 follow the
//! injected [`SecurityPolicy`]; checks 1–2 are always enforced.
//!
//! The human-verification oracle (CAPTCHA) is pluggable through
//! [`HumanVerifier`].

pub mod checks;
pub mod context;
pub mod error;
pub mod gate;
pub mod oracle;
pub mod policy;
pub mod rejection;

pub use context::ResolveContext;
pub use error::{GateError, OracleError};
pub use gate::VerificationGate;
pub use oracle::{
    CustomCaptchaVerifier, DisabledVerifier, HumanVerifier, RecaptchaVerifier,
    DEFAULT_ORACLE_TIMEOUT,
};
pub use policy::{Enforcement, SecurityPolicy};
pub use rejection::{CheckKind, Rejection};
