//! End-to-end generate → resolve flows against in-memory stores and a
//! controllable clock.

use std::net::IpAddr;
use std::sync::Arc;

use linkgate_node::{
    GenerateRequest, Generated, NodeError, RequestOrigin, Resolver,
    ShortenerError, Stores,
};
use linkgate_nullables::{NullClock, NullHumanVerifier, NullShortener};
use linkgate_types::{Fingerprint, GateParams, OwnerId};
use linkgate_verification::{ResolveContext, SecurityPolicy, VerificationGate};
use pretty_assertions::assert_eq;

const T0: u64 = 1_800_000_000;
const TARGET: &str = "https://files.example/report.pdf";

struct Harness {
    resolver: Arc<Resolver>,
    clock: Arc<NullClock>,
    shortener: Arc<NullShortener>,
    slug: String,
}

fn client() -> Fingerprint {
    Fingerprint::new("203.0.113.10".parse::<IpAddr>().unwrap())
}

fn harness_with(policy: SecurityPolicy, shortener: NullShortener) -> Harness {
    let clock = Arc::new(NullClock::new(T0));
    let shortener = Arc::new(shortener);
    let stores = Stores::in_memory(360);
    let resolver = Resolver::new(
        stores.sessions,
        stores.links,
        VerificationGate::new(GateParams::default(), policy),
        Arc::new(NullHumanVerifier::accepting(["human"])),
        shortener.clone(),
    )
    .with_clock(clock.clone());

    resolver
        .register_owner(OwnerId::new("alice"), 30, Some("alice-api-key-123".into()))
        .unwrap();
    let link = resolver
        .register_link(&OwnerId::new("alice"), TARGET, Some("report"))
        .unwrap();

    Harness {
        resolver: Arc::new(resolver),
        clock,
        shortener,
        slug: link.slug,
    }
}

fn harness() -> Harness {
    harness_with(
        SecurityPolicy::strict(),
        NullShortener::new("https://lksfy.com/s"),
    )
}

fn generate_request(slug: &str) -> GenerateRequest {
    GenerateRequest {
        slug: slug.to_string(),
        proof: None,
        client: client(),
        origin: RequestOrigin::new("https", "gw.example.com"),
    }
}

fn browser_ctx(generated: &Generated) -> ResolveContext {
    ResolveContext::new(client())
        .with_referer("https://lksfy.com/s1")
        .with_cookie_header(format!("v5_sid={}", generated.token))
}

fn code(err: NodeError) -> &'static str {
    err.code()
}

#[tokio::test]
async fn generate_wraps_resolve_url_with_owner_key() {
    let h = harness();
    let generated = h.resolver.generate(generate_request(&h.slug)).await.unwrap();

    assert_eq!(generated.outward_url, "https://lksfy.com/s1");
    assert_eq!(
        generated.resolve_url,
        format!("https://gw.example.com/v5/resolve/{}", generated.token)
    );
    assert_eq!(
        h.shortener.calls(),
        vec![("alice-api-key-123".to_string(), generated.resolve_url.clone())]
    );
}

#[tokio::test]
async fn too_fast_then_success_then_replay() {
    let h = harness();
    let generated = h.resolver.generate(generate_request(&h.slug)).await.unwrap();
    let ctx = browser_ctx(&generated);
    let token = generated.token.to_string();

    h.clock.advance(10);
    let err = h.resolver.resolve(&token, None, &ctx).await.unwrap_err();
    assert_eq!(code(err), "TOO_FAST");

    h.clock.advance(25);
    let target = h.resolver.resolve(&token, None, &ctx).await.unwrap();
    assert_eq!(target, TARGET);

    let err = h.resolver.resolve(&token, None, &ctx).await.unwrap_err();
    assert_eq!(code(err), "ALREADY_USED");
}

#[tokio::test]
async fn other_ip_is_rejected_even_with_everything_else_right() {
    let h = harness();
    let generated = h.resolver.generate(generate_request(&h.slug)).await.unwrap();
    let mut ctx = browser_ctx(&generated);
    ctx.client = Fingerprint::new("198.51.100.77".parse::<IpAddr>().unwrap());

    h.clock.advance(60);
    let err = h
        .resolver
        .resolve(generated.token.as_str(), None, &ctx)
        .await
        .unwrap_err();
    assert_eq!(code(err), "FINGERPRINT_MISMATCH");
}

#[tokio::test]
async fn session_expires_unused() {
    let h = harness();
    let generated = h.resolver.generate(generate_request(&h.slug)).await.unwrap();
    h.clock.advance(361);
    let err = h
        .resolver
        .resolve(generated.token.as_str(), None, &browser_ctx(&generated))
        .await
        .unwrap_err();
    assert_eq!(code(err), "EXPIRED_OR_INVALID");
}

#[tokio::test]
async fn garbage_token_is_expired_or_invalid() {
    let h = harness();
    let ctx = ResolveContext::new(client());
    let err = h.resolver.resolve("../../etc", None, &ctx).await.unwrap_err();
    assert_eq!(code(err), "EXPIRED_OR_INVALID");
}

#[tokio::test]
async fn relaxed_policy_passes_bare_requests_once() {
    let h = harness_with(
        SecurityPolicy::relaxed(),
        NullShortener::new("https://lksfy.com/s"),
    );
    let generated = h.resolver.generate(generate_request(&h.slug)).await.unwrap();
    let bare = ResolveContext::new(Fingerprint::loopback());
    let token = generated.token.to_string();

    assert_eq!(h.resolver.resolve(&token, None, &bare).await.unwrap(), TARGET);
    let err = h.resolver.resolve(&token, None, &bare).await.unwrap_err();
    assert_eq!(code(err), "ALREADY_USED");
}

#[tokio::test]
async fn concurrent_resolves_yield_exactly_one_target() {
    let h = harness();
    let generated = h.resolver.generate(generate_request(&h.slug)).await.unwrap();
    h.clock.advance(40);

    let mut handles = Vec::new();
    for _ in 0..16 {
        let resolver = h.resolver.clone();
        let token = generated.token.to_string();
        let ctx = browser_ctx(&generated);
        handles.push(tokio::spawn(async move {
            resolver.resolve(&token, None, &ctx).await
        }));
    }

    let mut successes = 0;
    let mut replays = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(target) => {
                assert_eq!(target, TARGET);
                successes += 1;
            }
            Err(e) => {
                assert_eq!(e.code(), "ALREADY_USED");
                replays += 1;
            }
        }
    }
    assert_eq!(successes, 1);
    assert_eq!(replays, 15);
}

#[tokio::test]
async fn generate_error_codes() {
    let h = harness();

    let err = h.resolver.generate(generate_request("nope")).await.unwrap_err();
    assert_eq!(code(err), "LINK_NOT_FOUND");

    let mut req = generate_request(&h.slug);
    req.proof = Some("robot".into());
    let err = h.resolver.generate(req).await.unwrap_err();
    assert_eq!(code(err), "CAPTCHA_FAILED");

    let mut req = generate_request(&h.slug);
    req.proof = Some("human".into());
    assert!(h.resolver.generate(req).await.is_ok());

    // Owner without a shortener key: no session may be minted.
    h.resolver
        .register_owner(OwnerId::new("bob"), 30, None)
        .unwrap();
    let link = h
        .resolver
        .register_link(&OwnerId::new("bob"), TARGET, None)
        .unwrap();
    let before = h.resolver.sessions().session_count().unwrap();
    let err = h.resolver.generate(generate_request(&link.slug)).await.unwrap_err();
    assert_eq!(code(err), "OWNER_KEY_MISSING");
    assert_eq!(h.resolver.sessions().session_count().unwrap(), before);

    // Subscription lapses.
    h.clock.advance(31 * 86_400);
    let err = h.resolver.generate(generate_request(&h.slug)).await.unwrap_err();
    assert_eq!(code(err), "OWNER_EXPIRED");
}

#[tokio::test]
async fn shortener_failures_map_to_provider_codes() {
    let h = harness_with(
        SecurityPolicy::strict(),
        NullShortener::failing(ShortenerError::Timeout("8s".into())),
    );
    let err = h.resolver.generate(generate_request(&h.slug)).await.unwrap_err();
    assert_eq!(code(err), "SHORTENER_TIMEOUT");

    let h = harness_with(
        SecurityPolicy::strict(),
        NullShortener::failing(ShortenerError::Failed("bad key".into())),
    );
    let err = h.resolver.generate(generate_request(&h.slug)).await.unwrap_err();
    assert_eq!(code(err), "SHORTENER_ERROR");
}

#[tokio::test]
async fn localhost_skips_the_shortener() {
    let h = harness();
    let mut req = generate_request(&h.slug);
    req.origin = RequestOrigin::new("http", "localhost:8080");
    let generated = h.resolver.generate(req).await.unwrap();

    assert_eq!(generated.outward_url, generated.resolve_url);
    assert!(generated.outward_url.starts_with("http://localhost:8080/v5/resolve/"));
    assert!(h.shortener.calls().is_empty());
}

#[tokio::test]
async fn public_base_url_overrides_request_host() {
    let clock = Arc::new(NullClock::new(T0));
    let stores = Stores::in_memory(360);
    let resolver = Resolver::new(
        stores.sessions,
        stores.links,
        VerificationGate::new(GateParams::default(), SecurityPolicy::strict()),
        Arc::new(NullHumanVerifier::rejecting()),
        Arc::new(NullShortener::new("https://lksfy.com/s")),
    )
    .with_clock(clock)
    .with_public_base_url(Some("https://go.example.org/".into()));
    resolver
        .register_owner(OwnerId::new("carol"), 1, Some("carol-key-0000".into()))
        .unwrap();
    let link = resolver
        .register_link(&OwnerId::new("carol"), TARGET, None)
        .unwrap();

    let generated = resolver.generate(generate_request(&link.slug)).await.unwrap();
    assert!(generated
        .resolve_url
        .starts_with("https://go.example.org/v5/resolve/"));
}

#[tokio::test]
async fn registry_rules() {
    let h = harness();
    let err = h
        .resolver
        .register_link(&OwnerId::new("alice"), TARGET, Some("report"))
        .unwrap_err();
    assert_eq!(code(err), "SLUG_TAKEN");

    let err = h
        .resolver
        .register_link(&OwnerId::new("ghost"), TARGET, None)
        .unwrap_err();
    assert_eq!(code(err), "OWNER_NOT_FOUND");

    assert!(h.resolver.link_exists("report").is_ok());
    assert_eq!(code(h.resolver.link_exists("missing").unwrap_err()), "LINK_NOT_FOUND");
}

#[tokio::test]
async fn v4_link_codec_requires_proof() {
    let h = harness();
    let err = h.resolver.encode_link("example.com/x", None).await.unwrap_err();
    assert_eq!(code(err), "CAPTCHA_FAILED");

    let slug = h
        .resolver
        .encode_link("example.com/x", Some("human"))
        .await
        .unwrap();
    let url = h.resolver.decode_link(&slug, Some("human")).await.unwrap();
    assert_eq!(url, "https://example.com/x");

    let err = h.resolver.decode_link("", Some("human")).await.unwrap_err();
    assert_eq!(code(err), "INVALID_LINK");
}

#[tokio::test]
async fn metrics_track_outcomes() {
    let h = harness();
    let generated = h.resolver.generate(generate_request(&h.slug)).await.unwrap();
    let ctx = browser_ctx(&generated);
    let _ = h.resolver.resolve(generated.token.as_str(), None, &ctx).await;
    h.clock.advance(35);
    h.resolver
        .resolve(generated.token.as_str(), None, &ctx)
        .await
        .unwrap();

    let metrics = h.resolver.metrics();
    assert_eq!(metrics.sessions_created.get(), 1);
    assert_eq!(metrics.resolutions.get(), 1);
    assert_eq!(metrics.rejections.with_label_values(&["TOO_FAST"]).get(), 1);
}
