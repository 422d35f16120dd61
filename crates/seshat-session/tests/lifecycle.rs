//! Integration tests for the session lifecycle over an in-memory store.
//!
//! Time is driven by a `ManualClock` starting at "day 0", so multi-day
//! scenarios run instantly.

use std::sync::Arc;
use std::time::Duration;

use seshat_protocol::{OwnerId, Token};
use seshat_session::{Clock, ManualClock, SessionConfig, SessionService};
use seshat_store::MemoryStore;

// =========================================================================
// Helpers
// =========================================================================

const DAY: Duration = Duration::from_secs(86_400);
const DAY0: u64 = 1_700_000_000;

struct Harness {
    svc: SessionService<MemoryStore, ManualClock>,
    clock: ManualClock,
    store: MemoryStore,
}

fn harness() -> Harness {
    harness_with(SessionConfig::with_days(14, 7))
}

fn harness_with(config: SessionConfig) -> Harness {
    let clock = ManualClock::new(DAY0);
    let store = MemoryStore::new();
    let svc = SessionService::with_clock(store.clone(), config, clock.clone());
    Harness { svc, clock, store }
}

fn owner(raw: &str) -> OwnerId {
    OwnerId::new(raw).unwrap()
}

// =========================================================================
// Minting and validation
// =========================================================================

#[tokio::test]
async fn test_fresh_token_validates_to_owner() {
    let h = harness();

    let token = h.svc.create_session("stu42", Some("fp-laptop")).await.unwrap();

    let record = h.svc.validate(token.as_str(), Some("fp-laptop")).await.unwrap();
    assert_eq!(record.owner_id, owner("stu42"));
    assert_eq!(record.issued_at, DAY0);
    assert_eq!(record.expires_at, record.issued_at + h.svc.config().ttl_secs());
}

#[tokio::test]
async fn test_validate_owner_returns_owner_id() {
    let h = harness();
    let token = h.svc.create_session("stu42", None).await.unwrap();

    assert_eq!(
        h.svc.validate_owner(token.as_str(), None).await,
        Some(owner("stu42"))
    );
}

#[tokio::test]
async fn test_mint_generates_distinct_tokens() {
    let h = harness();
    let mut seen = std::collections::HashSet::new();

    for _ in 0..64 {
        let token = h.svc.create_session("stu1", None).await.unwrap();
        assert!(seen.insert(token));
    }
    assert_eq!(h.store.len().await, 64);
}

#[tokio::test]
async fn test_validate_expired_is_none_regardless_of_fingerprint() {
    let h = harness();
    let with_fp = h.svc.create_session("stu1", Some("fpA")).await.unwrap();
    let without_fp = h.svc.create_session("stu2", None).await.unwrap();

    h.clock.advance(DAY * 14);

    assert!(h.svc.validate(with_fp.as_str(), Some("fpA")).await.is_none());
    assert!(h.svc.validate(with_fp.as_str(), None).await.is_none());
    assert!(h.svc.validate(without_fp.as_str(), None).await.is_none());
    assert!(h.svc.validate(without_fp.as_str(), Some("fpZ")).await.is_none());
}

#[tokio::test]
async fn test_validate_one_second_before_expiry_is_some() {
    let h = harness();
    let token = h.svc.create_session("stu1", None).await.unwrap();

    h.clock.set(DAY0 + h.svc.config().ttl_secs() - 1);

    assert!(h.svc.validate(token.as_str(), None).await.is_some());
}

#[tokio::test]
async fn test_validate_malformed_input_is_none() {
    let h = harness();
    h.svc.create_session("stu1", None).await.unwrap();

    let too_long = "x".repeat(500);
    let bad_chars = "!".repeat(64);
    for raw in ["", "   ", "abc", "not a token at all!", &too_long, &bad_chars] {
        assert!(h.svc.validate(raw, None).await.is_none(), "{raw:?}");
        assert!(h.svc.validate_owner(raw, Some("fp")).await.is_none());
    }
}

#[tokio::test]
async fn test_validate_tolerates_surrounding_whitespace() {
    let h = harness();
    let token = h.svc.create_session("stu1", None).await.unwrap();

    let padded = format!("  {}\n", token.as_str());

    assert!(h.svc.validate(&padded, None).await.is_some());
}

// =========================================================================
// Fingerprints
// =========================================================================

#[tokio::test]
async fn test_validate_mismatched_fingerprint_is_none() {
    let h = harness();
    let token = h.svc.create_session("stu1", Some("fpA")).await.unwrap();

    assert!(h.svc.validate(token.as_str(), Some("fpB")).await.is_none());
    // The legitimate device is unaffected.
    assert!(h.svc.validate(token.as_str(), Some("fpA")).await.is_some());
}

#[tokio::test]
async fn test_validate_omitted_fingerprint_is_accepted() {
    let h = harness();
    let token = h.svc.create_session("stu1", Some("fpA")).await.unwrap();

    assert!(h.svc.validate(token.as_str(), None).await.is_some());
    assert!(h.svc.validate(token.as_str(), Some("")).await.is_some());
}

#[tokio::test]
async fn test_validate_fingerprint_on_unbound_token_is_accepted() {
    let h = harness();
    let token = h.svc.create_session("stu1", None).await.unwrap();

    assert!(h.svc.validate(token.as_str(), Some("fpA")).await.is_some());
}

// =========================================================================
// Rotation
// =========================================================================

#[tokio::test]
async fn test_rotate_if_needed_fresh_is_idempotent() {
    let h = harness();
    let token = h.svc.create_session("stu1", None).await.unwrap();

    let first = h.svc.rotate_if_needed(&token).await;
    let second = h.svc.rotate_if_needed(&token).await;

    assert_eq!(first, token);
    assert_eq!(second, token);
    assert_eq!(h.store.len().await, 1);
}

#[tokio::test]
async fn test_rotate_if_needed_fresh_extends_expiry() {
    let h = harness();
    let token = h.svc.create_session("stu1", None).await.unwrap();

    h.clock.advance(DAY * 6);
    h.svc.rotate_if_needed(&token).await;

    // Past the original expiry, still alive thanks to the extension.
    h.clock.set(DAY0 + (DAY * 15).as_secs());
    let record = h.svc.validate(token.as_str(), None).await.unwrap();
    assert_eq!(record.expires_at, DAY0 + (DAY * 20).as_secs());
}

#[tokio::test]
async fn test_day_eight_rotation_scenario() {
    let h = harness();
    let a = h.svc.create_session("stu42", Some("fp")).await.unwrap();

    h.clock.advance(DAY * 8);
    let b = h.svc.rotate_if_needed(&a).await;

    assert_ne!(b, a);
    assert!(h.svc.validate(a.as_str(), Some("fp")).await.is_none());
    assert_eq!(
        h.svc.validate_owner(b.as_str(), Some("fp")).await,
        Some(owner("stu42"))
    );
}

#[tokio::test]
async fn test_rotated_token_carries_owner_and_fingerprint() {
    let h = harness();
    let a = h.svc.create_session("stu42", Some("fp")).await.unwrap();

    h.clock.advance(DAY * 7);
    let b = h.svc.rotate_if_needed(&a).await;

    let record = h.svc.validate(b.as_str(), None).await.unwrap();
    assert_eq!(record.owner_id, owner("stu42"));
    assert_eq!(record.device_fingerprint.unwrap().as_str(), "fp");
    assert_eq!(record.issued_at, h.clock.now());
    // Still bound to the device.
    assert!(h.svc.validate(b.as_str(), Some("other")).await.is_none());
}

#[tokio::test]
async fn test_session_survives_weekly_visits_through_rotation() {
    let h = harness();
    let mut token = h.svc.create_session("stu42", None).await.unwrap();

    // Ten weekly visits: well past one TTL, never logged out.
    for _ in 0..10 {
        h.clock.advance(DAY * 7);
        let refreshed = h.svc.refresh(token.as_str(), None).await.unwrap();
        token = refreshed.token().clone();
    }

    assert!(h.svc.validate(token.as_str(), None).await.is_some());
    assert_eq!(h.store.len().await, 1);
}

#[tokio::test]
async fn test_session_lapses_after_ttl_without_visits() {
    let h = harness();
    let token = h.svc.create_session("stu42", None).await.unwrap();

    h.clock.advance(DAY * 6);
    h.svc.rotate_if_needed(&token).await;
    h.clock.advance(DAY * 14);

    assert!(h.svc.validate(token.as_str(), None).await.is_none());
    assert!(h.store.is_empty().await);
}

#[tokio::test]
async fn test_rotate_if_needed_unknown_token_returns_input() {
    let h = harness();
    let stranger = Token::generate();

    assert_eq!(h.svc.rotate_if_needed(&stranger).await, stranger);
    assert!(h.store.is_empty().await);
}

#[tokio::test]
async fn test_rotate_if_needed_expired_token_returns_input() {
    let h = harness();
    let token = h.svc.create_session("stu1", None).await.unwrap();

    h.clock.advance(DAY * 30);

    assert_eq!(h.svc.rotate_if_needed(&token).await, token);
    assert!(h.svc.validate(token.as_str(), None).await.is_none());
}

#[tokio::test]
async fn test_custom_thresholds_drive_rotation() {
    let h = harness_with(SessionConfig::with_days(2, 1));
    let token = h.svc.create_session("stu1", None).await.unwrap();

    h.clock.advance(Duration::from_secs(86_399));
    assert_eq!(h.svc.rotate_if_needed(&token).await, token);

    h.clock.advance(Duration::from_secs(1));
    assert_ne!(h.svc.rotate_if_needed(&token).await, token);
}

// =========================================================================
// Revocation and multi-device independence
// =========================================================================

#[tokio::test]
async fn test_destroy_then_validate_is_none() {
    let h = harness();
    let a = h.svc.create_session("stu1", None).await.unwrap();

    h.svc.destroy(a.as_str()).await;

    assert!(h.svc.validate(a.as_str(), None).await.is_none());
}

#[tokio::test]
async fn test_destroy_is_idempotent_and_tolerates_garbage() {
    let h = harness();
    let a = h.svc.create_session("stu1", None).await.unwrap();

    h.svc.destroy(a.as_str()).await;
    h.svc.destroy(a.as_str()).await;
    h.svc.destroy("").await;
    h.svc.destroy("???").await;

    assert!(h.store.is_empty().await);
}

#[tokio::test]
async fn test_multi_device_sessions_are_independent() {
    let h = harness();
    let a = h.svc.create_session("stu1", Some("fpA")).await.unwrap();
    let b = h.svc.create_session("stu1", Some("fpB")).await.unwrap();
    assert_ne!(a, b);

    h.svc.destroy(a.as_str()).await;

    assert!(h.svc.validate(a.as_str(), Some("fpA")).await.is_none());
    assert_eq!(
        h.svc.validate_owner(b.as_str(), Some("fpB")).await,
        Some(owner("stu1"))
    );
}

#[tokio::test]
async fn test_rotation_on_one_device_leaves_other_alone() {
    let h = harness();
    let a = h.svc.create_session("stu1", Some("fpA")).await.unwrap();
    h.clock.advance(DAY * 3);
    let b = h.svc.create_session("stu1", Some("fpB")).await.unwrap();

    h.clock.advance(DAY * 5);
    let a2 = h.svc.rotate_if_needed(&a).await;
    let b2 = h.svc.rotate_if_needed(&b).await;

    assert_ne!(a2, a);
    assert_eq!(b2, b);
    assert!(h.svc.validate(a2.as_str(), Some("fpA")).await.is_some());
    assert!(h.svc.validate(b.as_str(), Some("fpB")).await.is_some());
}

#[tokio::test]
async fn test_concurrent_logins_from_many_tasks() {
    let h = harness();
    let svc = Arc::new(h.svc);

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let svc = Arc::clone(&svc);
            tokio::spawn(async move {
                let fp = format!("device-{i}");
                let token = svc.create_session("stu1", Some(fp.as_str())).await.unwrap();
                (token, fp)
            })
        })
        .collect();

    let mut tokens = Vec::new();
    for handle in handles {
        tokens.push(handle.await.unwrap());
    }

    assert_eq!(h.store.len().await, 16);
    for (token, fp) in &tokens {
        assert!(svc.validate(token.as_str(), Some(fp.as_str())).await.is_some());
    }
}
