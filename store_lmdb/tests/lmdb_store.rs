//! LMDB backend tests: persistence, TTL handling, and the consume latch.

use std::sync::{Arc, Barrier};

use linkgate_store::{ConsumeOutcome, LinkStore, SessionStore, StoreError};
use linkgate_store_lmdb::environment::DEFAULT_MAP_SIZE;
use linkgate_store_lmdb::LmdbEnvironment;
use linkgate_types::{Fingerprint, LinkOwner, OwnerId, Timestamp, WrappedLink};

const TTL: u64 = 360;

fn temp_env() -> (tempfile::TempDir, LmdbEnvironment) {
    let dir = tempfile::tempdir().expect("temp dir");
    let env = LmdbEnvironment::open(dir.path(), DEFAULT_MAP_SIZE).expect("open env");
    (dir, env)
}

fn client() -> Fingerprint {
    Fingerprint::new("198.51.100.4".parse().unwrap())
}

#[test]
fn session_round_trips_through_lmdb() {
    let (_dir, env) = temp_env();
    let store = env.session_store(TTL);
    let now = Timestamp::new(10_000);
    let token = store.create("https://example.com/x", client(), now).unwrap();

    let session = store.get(&token, now).unwrap();
    assert_eq!(session.token, token);
    assert_eq!(session.target_url, "https://example.com/x");
    assert_eq!(session.fingerprint, client());
    assert!(!session.consumed);
    assert_eq!(store.session_count().unwrap(), 1);
}

#[test]
fn consume_latches_once() {
    let (_dir, env) = temp_env();
    let store = env.session_store(TTL);
    let now = Timestamp::new(10_000);
    let token = store.create("https://example.com", client(), now).unwrap();

    assert!(matches!(
        store.mark_consumed(&token, now).unwrap(),
        ConsumeOutcome::Consumed(_)
    ));
    assert_eq!(
        store.mark_consumed(&token, now).unwrap(),
        ConsumeOutcome::AlreadyConsumed
    );
    assert!(store.get(&token, now).unwrap().consumed);
}

#[test]
fn expired_session_is_not_found_even_if_unconsumed() {
    let (_dir, env) = temp_env();
    let store = env.session_store(TTL);
    let created = Timestamp::new(10_000);
    let token = store.create("https://example.com", client(), created).unwrap();

    let later = created.plus_secs(TTL);
    assert!(matches!(store.get(&token, later), Err(StoreError::NotFound(_))));
    assert_eq!(
        store.mark_consumed(&token, later).unwrap(),
        ConsumeOutcome::NotFound
    );
}

#[test]
fn purge_reaps_expired_sessions() {
    let (_dir, env) = temp_env();
    let store = env.session_store(TTL);
    store.create("https://a.example", client(), Timestamp::new(0)).unwrap();
    store.create("https://b.example", client(), Timestamp::new(100)).unwrap();
    let keep = store.create("https://c.example", client(), Timestamp::new(400)).unwrap();

    assert_eq!(store.purge_expired(Timestamp::new(500)).unwrap(), 2);
    assert_eq!(store.session_count().unwrap(), 1);
    assert!(store.get(&keep, Timestamp::new(500)).is_ok());
}

// Concurrency-critical: LMDB write transactions must serialise the latch.
#[test]
fn concurrent_consume_has_exactly_one_winner() {
    const THREADS: usize = 8;
    let (_dir, env) = temp_env();
    let store = Arc::new(env.session_store(TTL));
    let now = Timestamp::new(10_000);
    let token = store.create("https://example.com", client(), now).unwrap();
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let store = Arc::clone(&store);
            let token = token.clone();
            let barrier = Arc::clone(&barrier);
            std::thread::spawn(move || {
                barrier.wait();
                store.mark_consumed(&token, now).unwrap()
            })
        })
        .collect();

    let winners = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|o| matches!(o, ConsumeOutcome::Consumed(_)))
        .count();
    assert_eq!(winners, 1);
}

#[test]
fn links_and_owners_persist() {
    let (_dir, env) = temp_env();
    let links = env.link_store();
    let owner = LinkOwner {
        id: OwnerId::new("owner-1"),
        valid_until: Timestamp::new(99_999),
        shortener_key: Some("k3y-abcdefgh".into()),
    };
    links.put_owner(&owner).unwrap();
    let link = WrappedLink {
        slug: "a1b2c3".into(),
        target_url: "https://example.com/file".into(),
        owner_id: owner.id.clone(),
        created_at: Timestamp::new(5),
    };
    links.put_link(&link).unwrap();

    assert_eq!(links.get_owner(&owner.id).unwrap(), owner);
    assert_eq!(links.get_link("a1b2c3").unwrap(), link);
    assert!(links.link_exists("a1b2c3").unwrap());
    assert!(!links.link_exists("zzz").unwrap());
    assert!(matches!(links.put_link(&link), Err(StoreError::Duplicate(_))));
    assert!(matches!(
        links.get_owner(&OwnerId::new("ghost")),
        Err(StoreError::NotFound(_))
    ));
}
