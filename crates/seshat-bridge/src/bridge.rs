//! The client-side half of a session: cookies plus an in-memory mirror.
//!
//! A [`CookieBridge`] wraps one client's [`CookieBackend`]. Writes go to
//! the mirror first and then to the `session_token` and `student_code`
//! cookies, so the page keeps working even when the browser refuses the
//! cookie. Reads wait (bounded by the [`ReadinessPolicy`]) for the cookie
//! subsystem, prefer the cookie, and fall back to the mirror.
//!
//! The mirror lives exactly as long as the bridge. A hard refresh builds a
//! new bridge, so only the cookies carry a session across page loads.

use std::sync::{Mutex, MutexGuard, PoisonError};

use seshat_protocol::{OwnerId, Token};

use crate::{
    CookieBackend, CookiePolicy, OWNER_HINT_COOKIE, ReadinessPolicy, SESSION_COOKIE,
};

/// What the client presented: the raw token and the owner hint.
///
/// The token is kept as the client sent it. Whether it is well formed is
/// the session layer's question, not ours.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientCredential {
    pub token: String,
    pub owner_hint: Option<String>,
}

impl std::fmt::Debug for ClientCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let prefix: String = self.token.chars().take(6).collect();
        f.debug_struct("ClientCredential")
            .field("token", &format_args!("{prefix}…"))
            .field("owner_hint", &self.owner_hint)
            .finish()
    }
}

/// Persists the credential in the client's cookies and mirrors it in memory.
///
/// The mirror covers reads later in the same page life, including when the
/// cookie subsystem is slow or refuses a write. A hard refresh starts with
/// an empty mirror, which is exactly when the cookie matters.
pub struct CookieBridge<B> {
    backend: B,
    policy: CookiePolicy,
    readiness: ReadinessPolicy,
    mirror: Mutex<Option<ClientCredential>>,
}

impl<B: CookieBackend> CookieBridge<B> {
    pub fn new(backend: B, policy: CookiePolicy, readiness: ReadinessPolicy) -> Self {
        Self {
            backend,
            policy,
            readiness,
            mirror: Mutex::new(None),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn policy(&self) -> &CookiePolicy {
        &self.policy
    }

    /// Stores the credential in both cookies and the mirror.
    ///
    /// The mirror is updated even if the backend refuses the write, so the
    /// current page stays signed in.
    pub fn write(&self, token: &Token, owner: &OwnerId) {
        *self.mirror() = Some(ClientCredential {
            token: token.as_str().to_owned(),
            owner_hint: Some(owner.as_str().to_owned()),
        });

        let cookies = [
            self.policy.build(SESSION_COOKIE, token.as_str()),
            self.policy.build(OWNER_HINT_COOKIE, owner.as_str()),
        ];
        for cookie in cookies {
            let name = cookie.name().to_owned();
            if let Err(e) = self.backend.set(cookie) {
                tracing::warn!(cookie = %name, error = %e, "cookie write failed");
            }
        }
        tracing::debug!(owner = %owner, token = %token.redacted(), "credential persisted");
    }

    /// The credential the client holds, if any.
    ///
    /// Waits for the cookie subsystem within the readiness budget, then
    /// prefers the cookie over the mirror. If the subsystem never becomes
    /// ready, only the mirror is consulted.
    pub async fn read(&self) -> Option<ClientCredential> {
        if let Err(e) = self.backend.readiness().wait(&self.readiness).await {
            tracing::warn!(error = %e, "reading credential without cookies");
            return self.mirrored();
        }

        match self.backend.get(SESSION_COOKIE).filter(|t| !t.trim().is_empty()) {
            Some(token) => {
                let owner_hint = self
                    .backend
                    .get(OWNER_HINT_COOKIE)
                    .filter(|h| !h.trim().is_empty());
                let credential = ClientCredential { token, owner_hint };
                *self.mirror() = Some(credential.clone());
                Some(credential)
            }
            None => self.mirrored(),
        }
    }

    /// The in-memory copy, without touching cookies.
    pub fn mirrored(&self) -> Option<ClientCredential> {
        self.mirror().clone()
    }

    /// Forgets the credential: both cookies expire, the mirror empties.
    pub fn clear(&self) {
        *self.mirror() = None;
        for name in [SESSION_COOKIE, OWNER_HINT_COOKIE] {
            if let Err(e) = self.backend.remove(self.policy.removal(name)) {
                tracing::warn!(cookie = %name, error = %e, "cookie removal failed");
            }
        }
        tracing::debug!("credential cleared");
    }

    fn mirror(&self) -> MutexGuard<'_, Option<ClientCredential>> {
        self.mirror.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
