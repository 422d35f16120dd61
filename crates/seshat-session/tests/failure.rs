//! Failure-path tests: backend outages, stalls, partial rotations, and
//! corrupt records.
//!
//! The stores here wrap a `MemoryStore` and misbehave on command. Stall
//! tests run with tokio's paused clock, so the ten-second deadline elapses
//! without real waiting.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use seshat_protocol::{StoredSession, Token};
use seshat_session::{ManualClock, Rejection, SessionConfig, SessionError, SessionService};
use seshat_store::{MemoryStore, Store, StoreError};

// =========================================================================
// Misbehaving stores
// =========================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
enum Op {
    Put(Token),
    Get(Token),
    Delete(Token),
}

/// Records every call and can fail puts or deletes on demand.
#[derive(Clone, Default)]
struct ScriptedStore {
    inner: MemoryStore,
    log: Arc<Mutex<Vec<Op>>>,
    fail_put: Arc<AtomicBool>,
    fail_delete: Arc<AtomicBool>,
}

impl ScriptedStore {
    fn ops(&self) -> Vec<Op> {
        self.log.lock().unwrap().clone()
    }

    fn clear_log(&self) {
        self.log.lock().unwrap().clear();
    }

    fn fail_puts(&self, on: bool) {
        self.fail_put.store(on, Ordering::SeqCst);
    }

    fn fail_deletes(&self, on: bool) {
        self.fail_delete.store(on, Ordering::SeqCst);
    }
}

impl Store for ScriptedStore {
    async fn put(&self, token: &Token, session: &StoredSession) -> Result<(), StoreError> {
        self.log.lock().unwrap().push(Op::Put(token.clone()));
        if self.fail_put.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("put refused".into()));
        }
        self.inner.put(token, session).await
    }

    async fn get(&self, token: &Token) -> Result<Option<StoredSession>, StoreError> {
        self.log.lock().unwrap().push(Op::Get(token.clone()));
        self.inner.get(token).await
    }

    async fn delete(&self, token: &Token) -> Result<(), StoreError> {
        self.log.lock().unwrap().push(Op::Delete(token.clone()));
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("delete refused".into()));
        }
        self.inner.delete(token).await
    }
}

/// Never answers reads once stalled.
#[derive(Clone, Default)]
struct StallingStore {
    inner: MemoryStore,
    stalled: Arc<AtomicBool>,
}

impl Store for StallingStore {
    async fn put(&self, token: &Token, session: &StoredSession) -> Result<(), StoreError> {
        self.inner.put(token, session).await
    }

    async fn get(&self, token: &Token) -> Result<Option<StoredSession>, StoreError> {
        if self.stalled.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        self.inner.get(token).await
    }

    async fn delete(&self, token: &Token) -> Result<(), StoreError> {
        self.inner.delete(token).await
    }
}

// =========================================================================
// Helpers
// =========================================================================

const DAY: Duration = Duration::from_secs(86_400);

fn service<S: Store>(store: S) -> (SessionService<S, ManualClock>, ManualClock) {
    let clock = ManualClock::new(1_700_000_000);
    let svc = SessionService::with_clock(store, SessionConfig::default(), clock.clone());
    (svc, clock)
}

// =========================================================================
// Rotation ordering
// =========================================================================

#[tokio::test]
async fn test_rotation_puts_new_before_deleting_old() {
    let store = ScriptedStore::default();
    let (svc, clock) = service(store.clone());
    let old = svc.create_session("stu42", None).await.unwrap();
    clock.advance(DAY * 8);
    store.clear_log();

    let new = svc.rotate_if_needed(&old).await;

    assert_ne!(new, old);
    assert_eq!(
        store.ops(),
        vec![
            Op::Get(old.clone()),
            Op::Put(new.clone()),
            Op::Delete(old.clone()),
        ]
    );
}

#[tokio::test]
async fn test_rotation_put_failure_keeps_old_token() {
    let store = ScriptedStore::default();
    let (svc, clock) = service(store.clone());
    let old = svc.create_session("stu42", None).await.unwrap();
    clock.advance(DAY * 8);
    store.fail_puts(true);
    store.clear_log();

    let returned = svc.rotate_if_needed(&old).await;

    assert_eq!(returned, old);
    // No delete was attempted after the failed insert.
    assert!(!store.ops().iter().any(|op| matches!(op, Op::Delete(_))));
    store.fail_puts(false);
    assert!(svc.validate(old.as_str(), None).await.is_some());
}

#[tokio::test]
async fn test_rotation_delete_failure_still_hands_out_new_token() {
    let store = ScriptedStore::default();
    let (svc, clock) = service(store.clone());
    let old = svc.create_session("stu42", None).await.unwrap();
    clock.advance(DAY * 8);
    store.fail_deletes(true);

    let new = svc.rotate_if_needed(&old).await;

    assert_ne!(new, old);
    assert!(svc.validate(new.as_str(), None).await.is_some());
    // The old record lingers until its own expiry.
    assert!(store.inner.contains(&old).await);
}

#[tokio::test]
async fn test_refresh_put_failure_on_fresh_token_keeps_old_expiry() {
    let store = ScriptedStore::default();
    let (svc, clock) = service(store.clone());
    let token = svc.create_session("stu42", None).await.unwrap();
    let original = svc.validate(token.as_str(), None).await.unwrap();
    clock.advance(DAY * 2);
    store.fail_puts(true);

    let refreshed = svc.refresh(token.as_str(), None).await.unwrap();

    assert_eq!(refreshed.token(), &token);
    assert!(!refreshed.decision.rotate);
    assert_eq!(refreshed.record.expires_at, original.expires_at);
}

// =========================================================================
// Backend outages
// =========================================================================

#[tokio::test]
async fn test_validate_with_store_down_is_none() {
    let store = MemoryStore::new();
    let (svc, _) = service(store.clone());
    let token = svc.create_session("stu1", None).await.unwrap();

    store.set_available(false);

    assert!(svc.validate(token.as_str(), None).await.is_none());
    assert!(svc.validate_owner(token.as_str(), None).await.is_none());
}

#[tokio::test]
async fn test_inspect_with_store_down_is_transient() {
    let store = MemoryStore::new();
    let (svc, _) = service(store.clone());
    let token = svc.create_session("stu1", None).await.unwrap();

    store.set_available(false);
    let err = svc.inspect(token.as_str(), None).await.unwrap_err();

    assert!(err.is_transient());
    // The outage did not cost the user their session.
    store.set_available(true);
    assert!(svc.validate(token.as_str(), None).await.is_some());
}

#[tokio::test]
async fn test_create_session_with_store_down_fails_transient() {
    let store = MemoryStore::new();
    store.set_available(false);
    let (svc, _) = service(store);

    let err = svc.create_session("stu1", None).await.unwrap_err();

    assert!(err.is_transient());
}

#[tokio::test]
async fn test_rotate_if_needed_with_store_down_returns_input() {
    let store = MemoryStore::new();
    let (svc, clock) = service(store.clone());
    let token = svc.create_session("stu1", None).await.unwrap();
    clock.advance(DAY * 8);

    store.set_available(false);

    assert_eq!(svc.rotate_if_needed(&token).await, token);
}

#[tokio::test]
async fn test_destroy_with_store_down_does_not_panic() {
    let store = MemoryStore::new();
    let (svc, _) = service(store.clone());
    let token = svc.create_session("stu1", None).await.unwrap();

    store.set_available(false);
    svc.destroy(token.as_str()).await;

    store.set_available(true);
    // The revoke was lost; the token is still there.
    assert!(store.contains(&token).await);
}

#[tokio::test(start_paused = true)]
async fn test_stalled_store_times_out_to_no_session() {
    let store = StallingStore::default();
    let (svc, _) = service(store.clone());
    let token = svc.create_session("stu1", None).await.unwrap();
    store.stalled.store(true, Ordering::SeqCst);

    let started = tokio::time::Instant::now();
    let result = svc.inspect(token.as_str(), None).await;

    assert!(matches!(
        result,
        Err(SessionError::Backend(StoreError::Timeout(_)))
    ));
    assert!(started.elapsed() >= Duration::from_secs(10));
    assert!(svc.validate(token.as_str(), None).await.is_none());
}

// =========================================================================
// Corrupt records
// =========================================================================

#[tokio::test]
async fn test_corrupt_record_is_reported_and_degrades_to_none() {
    let store = MemoryStore::new();
    let (svc, _) = service(store.clone());
    let token = Token::generate();
    store.put_raw(&token, b"{\"owner_id\": 42".to_vec()).await;

    let err = svc.inspect(token.as_str(), None).await.unwrap_err();
    assert!(matches!(err, SessionError::Corrupt(_)));
    assert!(!err.is_transient());

    assert!(svc.validate(token.as_str(), None).await.is_none());
}

#[tokio::test]
async fn test_record_with_inverted_times_is_corrupt() {
    let store = MemoryStore::new();
    let (svc, _) = service(store.clone());
    let token = Token::generate();
    let doc = br#"{"owner_id":"stu1","issued_at":200,"expires_at":100,"device_fingerprint":null}"#;
    store.put_raw(&token, doc.to_vec()).await;

    let err = svc.inspect(token.as_str(), None).await.unwrap_err();

    assert!(matches!(err, SessionError::Corrupt(_)));
}

#[tokio::test]
async fn test_record_without_fingerprint_field_is_accepted() {
    let store = MemoryStore::new();
    let (svc, _) = service(store.clone());
    let token = Token::generate();
    let doc = br#"{"owner_id":"stu1","issued_at":1700000000,"expires_at":1800000000}"#;
    store.put_raw(&token, doc.to_vec()).await;

    let record = svc.inspect(token.as_str(), Some("anything")).await.unwrap();

    assert_eq!(record.owner_id.as_str(), "stu1");
    assert!(record.device_fingerprint.is_none());
}

#[tokio::test]
async fn test_rejection_reasons_are_distinguishable_to_callers() {
    let store = MemoryStore::new();
    let (svc, clock) = service(store);
    let token = svc.create_session("stu1", Some("fpA")).await.unwrap();

    let mismatch = svc.inspect(token.as_str(), Some("fpB")).await.unwrap_err();
    clock.advance(DAY * 20);
    let expired = svc.inspect(token.as_str(), None).await.unwrap_err();
    let unknown = svc.inspect(token.as_str(), None).await.unwrap_err();

    assert!(matches!(
        mismatch,
        SessionError::InvalidToken(Rejection::FingerprintMismatch)
    ));
    assert!(matches!(expired, SessionError::InvalidToken(Rejection::Expired)));
    assert!(matches!(unknown, SessionError::InvalidToken(Rejection::Unknown)));
}
