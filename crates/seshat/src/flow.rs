//! Per-client session restoration.
//!
//! Runs on every page load. The flow is:
//!   1. Read the credential (waiting for the cookie subsystem if needed)
//!   2. Validate it
//!   3. Ask the roster whether the owner may continue
//!   4. Apply the rotation policy
//!   5. Write the (possibly new) token back to cookies and mirror
//!
//! ```text
//! NoSession ──valid token──→ Restored ──rotation──→ Restored (new token)
//!     │                          │
//!     │ invalid/expired/         │ roster denies
//!     │ mismatched               ▼
//!     └──────────────→ NoSession, cookies cleared
//! ```
//!
//! A store or roster outage is neither: the page shows no session, but the
//! cookies stay so the next load can try again.

use seshat_bridge::{CookieBackend, CookieBridge};
use seshat_protocol::{OwnerId, Token};
use seshat_session::{Clock, SessionError};
use seshat_store::Store;

use crate::{Admission, RosterGate, Seshat, SeshatError};

/// What every "not signed in" outcome tells the user. The same text for an
/// expired token, a store outage, or a roster denial: nothing on screen may
/// hint at which one happened.
pub const LOGIN_PROMPT: &str = "Please log in to continue.";

/// The result of a page-load restore.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreOutcome {
    Restored {
        owner: OwnerId,
        /// The token now held by the client.
        token: Token,
        /// `true` when the presented token was replaced.
        rotated: bool,
    },
    NoSession {
        /// `true` when the client's cookies were cleared because the stored
        /// credential is bad (as opposed to a transient failure).
        cookies_cleared: bool,
    },
}

impl RestoreOutcome {
    pub fn is_restored(&self) -> bool {
        matches!(self, Self::Restored { .. })
    }

    pub fn owner(&self) -> Option<&OwnerId> {
        match self {
            Self::Restored { owner, .. } => Some(owner),
            Self::NoSession { .. } => None,
        }
    }

    /// The message to show, if any.
    pub fn user_message(&self) -> Option<&'static str> {
        match self {
            Self::Restored { .. } => None,
            Self::NoSession { .. } => Some(LOGIN_PROMPT),
        }
    }

    fn kept() -> Self {
        Self::NoSession {
            cookies_cleared: false,
        }
    }

    fn cleared() -> Self {
        Self::NoSession {
            cookies_cleared: true,
        }
    }
}

/// Session handling for one client.
///
/// Created by [`Seshat::client`]. Holds the client's cookie bridge, so its
/// in-memory mirror lives as long as the page does.
pub struct SessionFlow<S, B, G, C> {
    seshat: Seshat<S, G, C>,
    bridge: CookieBridge<B>,
}

impl<S, B, G, C> SessionFlow<S, B, G, C>
where
    S: Store,
    B: CookieBackend,
    G: RosterGate,
    C: Clock,
{
    pub(crate) fn new(seshat: Seshat<S, G, C>, bridge: CookieBridge<B>) -> Self {
        Self { seshat, bridge }
    }

    pub fn bridge(&self) -> &CookieBridge<B> {
        &self.bridge
    }

    /// Restores the session from the client's cookies. Never fails.
    pub async fn restore(&self, fingerprint: Option<&str>) -> RestoreOutcome {
        let Some(credential) = self.bridge.read().await else {
            tracing::debug!("no stored credential");
            return RestoreOutcome::kept();
        };

        let service = self.seshat.service();
        let record = match service.inspect(&credential.token, fingerprint).await {
            Ok(record) => record,
            Err(e) => return self.reject(&e),
        };
        let owner = record.owner_id.clone();

        // Rotation waits for the roster: a rotated token that is never
        // written back would strand the client on a deleted one.
        match self.seshat.gate().admit(&owner).await {
            Ok(Admission::Admitted) => {}
            Ok(Admission::Denied(reason)) => {
                // The token stays in the store; the roster alone decides.
                tracing::info!(owner = %owner, %reason, "roster turned session away");
                self.bridge.clear();
                return RestoreOutcome::cleared();
            }
            Err(e) => {
                tracing::warn!(owner = %owner, error = %e, "roster check failed, keeping cookies");
                return RestoreOutcome::kept();
            }
        }

        let refreshed = service.apply_rotation(record).await;
        self.bridge.write(refreshed.token(), &owner);
        tracing::info!(
            owner = %owner,
            rotated = refreshed.decision.rotate,
            "session restored"
        );
        RestoreOutcome::Restored {
            owner,
            rotated: refreshed.decision.rotate,
            token: refreshed.record.token,
        }
    }

    /// Hands a freshly authenticated owner a session.
    ///
    /// Called by the login form once the password checked out. Any token the
    /// client already held is revoked after the new one is stored, so a
    /// shared computer never keeps the previous user's session alive.
    ///
    /// # Errors
    /// - [`SeshatError::Session`] if the owner id is blank or the store
    ///   write fails
    pub async fn sign_in(
        &self,
        owner_id: &str,
        fingerprint: Option<&str>,
    ) -> Result<Token, SeshatError> {
        let owner = OwnerId::new(owner_id).map_err(SessionError::InvalidOwner)?;
        let fingerprint = fingerprint.and_then(seshat_protocol::Fingerprint::new);
        let previous = self.bridge.read().await;

        let service = self.seshat.service();
        let record = service.mint(owner, fingerprint).await?;

        if let Some(previous) = previous {
            service.destroy(&previous.token).await;
        }
        self.bridge.write(&record.token, &record.owner_id);
        tracing::info!(owner = %record.owner_id, "signed in");
        Ok(record.token)
    }

    /// Mid-visit renewal for a page that is already signed in.
    ///
    /// Works from the in-memory mirror only: no cookie read, no readiness
    /// wait. Returns the token to keep using, or `None` if there is no
    /// session any more.
    pub async fn renew(&self, fingerprint: Option<&str>) -> Option<Token> {
        let credential = self.bridge.mirrored()?;

        match self
            .seshat
            .service()
            .refresh(&credential.token, fingerprint)
            .await
        {
            Ok(refreshed) => {
                self.bridge.write(refreshed.token(), refreshed.owner_id());
                Some(refreshed.record.token)
            }
            Err(e) => {
                self.reject(&e);
                None
            }
        }
    }

    /// Logs the client out: revokes its token (best effort) and clears
    /// cookies and mirror. Never fails.
    pub async fn sign_out(&self) {
        if let Some(credential) = self.bridge.read().await {
            self.seshat.service().destroy(&credential.token).await;
        }
        self.bridge.clear();
        tracing::info!("signed out");
    }

    fn reject(&self, e: &SessionError) -> RestoreOutcome {
        if e.is_transient() {
            tracing::warn!(error = %e, "session check failed, keeping cookies");
            RestoreOutcome::kept()
        } else {
            tracing::info!(error = %e, "stored credential rejected");
            self.bridge.clear();
            RestoreOutcome::cleared()
        }
    }
}
