//! Versioned reversible link encodings.
//!
//! Every version turns a URL into a compact, URL-path-safe slug (base64url
//! without padding) and back:
//!
//! - **V0**: plain base64url of the UTF-8 bytes
//! - **V1**: ROT13 over ASCII letters, then V0
//! - **V2**: XOR against a repeating key, then V0
//! - **V3**: rewrite a `lksfy.com` short link to its target domain, then V2
//! - **V4**: length-keyed Caesar shift, reversal, 4-byte block shuffle, then V0
//!
//! None of this is encryption. The transforms are obfuscation whose only hard
//! requirement is exact round-trip fidelity.

pub mod base64url;
pub mod error;
pub mod rewrite;
pub mod rot13;
pub mod scramble;
pub mod version;
pub mod xor;

pub use error::CodecError;
pub use version::{decode_or_empty, encode_or_empty, LinkVersion};
pub use xor::XOR_KEY;
