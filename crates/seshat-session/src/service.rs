//! The session service: mint, validate, rotate, and revoke tokens.
//!
//! # Concurrency note
//!
//! `SessionService` holds no mutable state of its own. Everything that must
//! survive between requests lives in the store, so one service can be shared
//! behind an `Arc` by every request handler, and several processes can run
//! against the same backend.

use std::future::Future;

use seshat_protocol::{Fingerprint, OwnerId, RotationDecision, SessionRecord, Token};
use seshat_store::{Store, StoreError};

use crate::{
    Clock, Rejection, RotationPolicy, SessionConfig, SessionError, SystemClock, TokenAge,
};

/// The outcome of a successful [`SessionService::refresh`].
#[derive(Debug, Clone)]
pub struct Refreshed {
    /// The record the client should hold from now on. Its token differs from
    /// the presented one exactly when `decision.rotate` is `true`.
    pub record: SessionRecord,
    pub decision: RotationDecision,
}

impl Refreshed {
    pub fn token(&self) -> &Token {
        &self.record.token
    }

    pub fn owner_id(&self) -> &OwnerId {
        &self.record.owner_id
    }
}

/// Issues and checks session tokens against a [`Store`].
///
/// ## Lifecycle
///
/// ```text
/// create_session() ──→ validate() / refresh() ──→ destroy()
///                          │
///                          ├─ Fresh: expires_at = now + ttl
///                          └─ Stale: insert new token, delete old
/// ```
///
/// The store is handed in at construction. There is no process-wide
/// session client: tests build a service over a `MemoryStore`, production
/// over whatever backend the configuration names.
pub struct SessionService<S, C = SystemClock> {
    store: S,
    clock: C,
    config: SessionConfig,
    policy: RotationPolicy,
}

impl<S: Store> SessionService<S, SystemClock> {
    /// Creates a service reading time from the system clock.
    pub fn new(store: S, config: SessionConfig) -> Self {
        Self::with_clock(store, config, SystemClock)
    }
}

impl<S: Store, C: Clock> SessionService<S, C> {
    /// Creates a service with an explicit time source.
    pub fn with_clock(store: S, config: SessionConfig, clock: C) -> Self {
        let policy = RotationPolicy::new(config.rotate_after);
        Self {
            store,
            clock,
            config,
            policy,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    // ---------------------------------------------------------------------
    // Minting
    // ---------------------------------------------------------------------

    /// Starts a session for an owner the login flow has just authenticated.
    ///
    /// The owner id is normalized (trimmed, lower-cased). A blank
    /// fingerprint means "this device could not compute one".
    ///
    /// # Errors
    /// - [`SessionError::InvalidOwner`] if the owner id is blank
    /// - [`SessionError::Backend`] if the store write fails or times out
    pub async fn create_session(
        &self,
        owner_id: &str,
        fingerprint: Option<&str>,
    ) -> Result<Token, SessionError> {
        let owner_id = OwnerId::new(owner_id).map_err(SessionError::InvalidOwner)?;
        let fingerprint = fingerprint.and_then(Fingerprint::new);
        Ok(self.mint(owner_id, fingerprint).await?.token)
    }

    /// Issues and stores a new record with `expires_at = now + ttl`.
    ///
    /// Tokens carry 384 random bits, so a collision with a live token is not
    /// a case worth a round trip to check.
    pub async fn mint(
        &self,
        owner_id: OwnerId,
        fingerprint: Option<Fingerprint>,
    ) -> Result<SessionRecord, SessionError> {
        let record = SessionRecord::issue(
            owner_id,
            fingerprint,
            self.clock.now(),
            self.config.ttl_secs(),
        );
        self.call("put", self.store.put(&record.token, &record.to_stored()))
            .await?;

        tracing::info!(
            owner = %record.owner_id,
            token = %record.token.redacted(),
            expires_at = record.expires_at,
            "session created"
        );
        Ok(record)
    }

    // ---------------------------------------------------------------------
    // Validation
    // ---------------------------------------------------------------------

    /// Checks a presented token and returns its record.
    ///
    /// Rejects (in this order) malformed input, unknown tokens, records past
    /// `expires_at`, and fingerprint mismatches. Expired records are deleted
    /// on the way out, which is the only cleanup expired sessions get.
    ///
    /// # Errors
    /// - [`SessionError::MalformedToken`] / [`SessionError::InvalidToken`]:
    ///   the client is not authenticated
    /// - [`SessionError::Backend`]: the store failed; try again next request
    /// - [`SessionError::Corrupt`]: the stored record is unreadable
    pub async fn inspect(
        &self,
        token: &str,
        fingerprint: Option<&str>,
    ) -> Result<SessionRecord, SessionError> {
        let token = Token::parse(token).map_err(SessionError::MalformedToken)?;
        let presented = fingerprint.and_then(Fingerprint::new);

        let record = self
            .load(&token)
            .await?
            .ok_or(SessionError::InvalidToken(Rejection::Unknown))?;

        if record.is_expired(self.clock.now()) {
            self.discard_expired(&record).await;
            return Err(SessionError::InvalidToken(Rejection::Expired));
        }

        if !Fingerprint::compatible(record.device_fingerprint.as_ref(), presented.as_ref()) {
            // Not deleted: whoever presented the wrong device may not be the
            // owner, and must not be able to log the owner out.
            return Err(SessionError::InvalidToken(Rejection::FingerprintMismatch));
        }

        Ok(record)
    }

    /// Like [`inspect`](Self::inspect) but never fails: every problem,
    /// including a backend outage, reads as "no session".
    pub async fn validate(
        &self,
        token: &str,
        fingerprint: Option<&str>,
    ) -> Option<SessionRecord> {
        match self.inspect(token, fingerprint).await {
            Ok(record) => Some(record),
            Err(e) => {
                log_rejection(&e);
                None
            }
        }
    }

    /// The owner of a valid token, or `None`.
    pub async fn validate_owner(
        &self,
        token: &str,
        fingerprint: Option<&str>,
    ) -> Option<OwnerId> {
        self.validate(token, fingerprint)
            .await
            .map(|record| record.owner_id)
    }

    // ---------------------------------------------------------------------
    // Rotation
    // ---------------------------------------------------------------------

    /// Validates a token and applies the rotation policy in one step.
    ///
    /// # Errors
    /// Same as [`inspect`](Self::inspect). Once the token has validated,
    /// rotation problems are absorbed: the caller gets the token that is
    /// still good.
    pub async fn refresh(
        &self,
        token: &str,
        fingerprint: Option<&str>,
    ) -> Result<Refreshed, SessionError> {
        let record = self.inspect(token, fingerprint).await?;
        Ok(self.apply_rotation(record).await)
    }

    /// Extends or replaces `token` according to its age.
    ///
    /// Idempotent while the token is fresh: calling it twice returns the same
    /// token both times. Unknown or expired tokens and backend failures
    /// return the input unchanged; this method never fails.
    pub async fn rotate_if_needed(&self, token: &Token) -> Token {
        let record = match self.load(token).await {
            Ok(Some(record)) if !record.is_expired(self.clock.now()) => record,
            Ok(_) => return token.clone(),
            Err(e) => {
                log_rejection(&e);
                return token.clone();
            }
        };
        self.apply_rotation(record).await.record.token
    }

    /// Applies the rotation policy to a record that already passed
    /// [`inspect`](Self::inspect).
    ///
    /// Split from [`refresh`](Self::refresh) for callers that run their own
    /// admission check between validation and rotation. Never fails.
    pub async fn apply_rotation(&self, record: SessionRecord) -> Refreshed {
        let now = self.clock.now();
        match self.policy.classify(&record, now) {
            TokenAge::Fresh => self.extend(record, now).await,
            TokenAge::Stale => self.replace(record, now).await,
        }
    }

    /// Fresh: same token, `expires_at` pushed to `now + ttl`.
    ///
    /// The whole record is written back, so a logout that deletes the token
    /// between our read and this put brings the revoked token back until its
    /// new expiry. Same accepted window as in [`replace`](Self::replace).
    async fn extend(&self, mut record: SessionRecord, now: u64) -> Refreshed {
        let previous = record.expires_at;
        record.expires_at = now
            .saturating_add(self.config.ttl_secs())
            .max(record.issued_at + 1);

        let result = self
            .call("put", self.store.put(&record.token, &record.to_stored()))
            .await;
        if let Err(e) = result {
            tracing::warn!(
                token = %record.token.redacted(),
                error = %e,
                "could not extend session expiry"
            );
            record.expires_at = previous;
        }

        Refreshed {
            record,
            decision: RotationDecision::keep(),
        }
    }

    /// Stale: insert a new record, then delete the old one.
    ///
    /// The order matters. A second request racing on the old token must
    /// always find at least one of the two records, so the new one is
    /// written first. If the delete then fails, the old token simply stays
    /// valid until its own `expires_at`.
    ///
    /// A logout that deletes the old token between our read and our insert
    /// leaves the new record alive. That window is accepted: closing it would
    /// need a distributed lock around every validation.
    async fn replace(&self, old: SessionRecord, now: u64) -> Refreshed {
        let new = SessionRecord::issue(
            old.owner_id.clone(),
            old.device_fingerprint.clone(),
            now,
            self.config.ttl_secs(),
        );

        let inserted = self
            .call("put", self.store.put(&new.token, &new.to_stored()))
            .await;
        if let Err(e) = inserted {
            tracing::warn!(
                token = %old.token.redacted(),
                error = %e,
                "token rotation skipped, current token stays in use"
            );
            return Refreshed {
                record: old,
                decision: RotationDecision::keep(),
            };
        }

        if let Err(e) = self.call("delete", self.store.delete(&old.token)).await {
            tracing::warn!(
                token = %old.token.redacted(),
                error = %e,
                "rotated-out token not deleted, valid until it expires"
            );
        }

        tracing::info!(
            owner = %new.owner_id,
            old = %old.token.redacted(),
            new = %new.token.redacted(),
            "session token rotated"
        );

        Refreshed {
            decision: RotationDecision::rotated(new.token.clone()),
            record: new,
        }
    }

    // ---------------------------------------------------------------------
    // Revocation
    // ---------------------------------------------------------------------

    /// Revokes a token (logout). Never fails; problems are logged.
    ///
    /// Only this token is affected. The same owner's sessions on other
    /// devices keep working.
    pub async fn destroy(&self, token: &str) {
        if let Err(e) = self.try_destroy(token).await {
            tracing::warn!(error = %e, "session revoke failed");
        }
    }

    /// Revokes a token, reporting backend failures.
    ///
    /// Malformed input has nothing to revoke and succeeds.
    pub async fn try_destroy(&self, token: &str) -> Result<(), SessionError> {
        let Ok(token) = Token::parse(token) else {
            return Ok(());
        };
        self.call("delete", self.store.delete(&token)).await?;
        tracing::info!(token = %token.redacted(), "session destroyed");
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Store access
    // ---------------------------------------------------------------------

    async fn load(&self, token: &Token) -> Result<Option<SessionRecord>, SessionError> {
        match self.call("get", self.store.get(token)).await? {
            Some(stored) => stored
                .into_record(token.clone())
                .map(Some)
                .map_err(SessionError::Corrupt),
            None => Ok(None),
        }
    }

    async fn discard_expired(&self, record: &SessionRecord) {
        tracing::debug!(token = %record.token.redacted(), "deleting expired session");
        if let Err(e) = self.call("delete", self.store.delete(&record.token)).await {
            tracing::debug!(error = %e, "expired session not deleted");
        }
    }

    /// Runs one store call under the configured deadline.
    async fn call<T>(
        &self,
        op: &'static str,
        fut: impl Future<Output = Result<T, StoreError>>,
    ) -> Result<T, StoreError> {
        let limit = self.config.store_timeout;
        match tokio::time::timeout(limit, fut).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(op, ?limit, "session store call timed out");
                Err(StoreError::Timeout(limit))
            }
        }
    }
}

fn log_rejection(e: &SessionError) {
    match e {
        SessionError::Corrupt(_) => tracing::error!(error = %e, "session rejected"),
        SessionError::Backend(_) => tracing::warn!(error = %e, "session check failed"),
        _ => tracing::debug!(error = %e, "session rejected"),
    }
}
