use proptest::prelude::*;

use linkgate_types::{Fingerprint, ResolutionSession, SessionToken, Timestamp};

proptest! {
    /// Timestamp elapsed_since: elapsed_since(now) = now - self (saturating).
    #[test]
    fn timestamp_elapsed_since(base in 0u64..1_000_000, offset in 0u64..1_000_000) {
        let t = Timestamp::new(base);
        let now = Timestamp::new(base + offset);
        prop_assert_eq!(t.elapsed_since(now), offset);
    }

    /// Timestamp has_expired agrees with manual arithmetic.
    #[test]
    fn timestamp_has_expired_correct(
        start in 0u64..500_000,
        duration in 1u64..500_000,
        offset in 0u64..1_000_000,
    ) {
        let t = Timestamp::new(start);
        let now = Timestamp::new(start.saturating_add(offset));
        prop_assert_eq!(t.has_expired(duration, now), offset >= duration);
    }

    /// Tokens built from bytes always parse back to themselves.
    #[test]
    fn token_from_bytes_parses(bytes in prop::array::uniform16(0u8..)) {
        let token = SessionToken::from_bytes(&bytes);
        let parsed = SessionToken::parse(token.as_str()).unwrap();
        prop_assert_eq!(parsed, token);
    }

    /// Arbitrary client input never panics the token parser.
    #[test]
    fn token_parse_never_panics(raw in ".{0,64}") {
        let _ = SessionToken::parse(&raw);
    }

    /// A session is expired exactly when its age reaches the TTL.
    #[test]
    fn session_expiry_matches_age(created in 0u64..1_000_000, age in 0u64..1_000, ttl in 1u64..1_000) {
        let session = ResolutionSession::new(
            SessionToken::from_bytes(&[1; 16]),
            "https://example.com",
            Fingerprint::loopback(),
            Timestamp::new(created),
        );
        let now = Timestamp::new(created + age);
        prop_assert_eq!(session.is_expired(ttl, now), age >= ttl);
        prop_assert_eq!(session.age(now), age);
    }
}
