//! `Seshat` builder and shared state.
//!
//! One `Seshat` per process. It owns the session service and the roster
//! gate and is cloned into every request; each request then opens a
//! [`SessionFlow`] over that client's cookies.

use std::sync::Arc;

use seshat_bridge::{CookieBackend, CookieBridge, CookiePolicy, ReadinessPolicy};
use seshat_session::{Clock, SessionService, SystemClock};
use seshat_store::{AnyStore, Store};

use crate::{OpenGate, RosterGate, SeshatError, SessionFlow, Settings};

struct Shared<S, G, C> {
    service: SessionService<S, C>,
    gate: G,
    cookies: CookiePolicy,
    readiness: ReadinessPolicy,
}

/// Process-wide session state, cheap to clone.
pub struct Seshat<S = AnyStore, G = OpenGate, C = SystemClock> {
    shared: Arc<Shared<S, G, C>>,
}

impl<S, G, C> Clone for Seshat<S, G, C> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl Seshat {
    /// Creates a new builder.
    pub fn builder() -> SeshatBuilder {
        SeshatBuilder::new()
    }
}

impl<S: Store, G: RosterGate, C: Clock> Seshat<S, G, C> {
    /// Assembles a `Seshat` from ready-made parts. Tests use this to run on
    /// a `MemoryStore` and a manual clock.
    pub fn from_parts(
        service: SessionService<S, C>,
        gate: G,
        cookies: CookiePolicy,
        readiness: ReadinessPolicy,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                service,
                gate,
                cookies,
                readiness,
            }),
        }
    }

    pub fn service(&self) -> &SessionService<S, C> {
        &self.shared.service
    }

    pub fn gate(&self) -> &G {
        &self.shared.gate
    }

    /// Opens the flow for one client, reading and writing its cookies
    /// through `backend`.
    pub fn client<B: CookieBackend>(&self, backend: B) -> SessionFlow<S, B, G, C> {
        let bridge = CookieBridge::new(
            backend,
            self.shared.cookies.clone(),
            self.shared.readiness,
        );
        SessionFlow::new(self.clone(), bridge)
    }
}

/// Builder for a [`Seshat`] over the configured store.
///
/// # Example
///
/// ```rust,no_run
/// # async fn run() -> Result<(), seshat::SeshatError> {
/// use seshat::prelude::*;
///
/// let seshat = Seshat::builder()
///     .settings(Settings::from_env()?)
///     .build()?;
/// let flow = seshat.client(MemoryCookieJar::new());
/// let outcome = flow.restore(None).await;
/// # Ok(()) }
/// ```
pub struct SeshatBuilder<G = OpenGate> {
    settings: Settings,
    gate: G,
}

impl SeshatBuilder {
    /// Default settings, no roster.
    pub fn new() -> Self {
        Self {
            settings: Settings::default(),
            gate: OpenGate,
        }
    }
}

impl Default for SeshatBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl<G: RosterGate> SeshatBuilder<G> {
    pub fn settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    /// Sets the roster consulted after each successful restore.
    pub fn gate<G2: RosterGate>(self, gate: G2) -> SeshatBuilder<G2> {
        SeshatBuilder {
            settings: self.settings,
            gate,
        }
    }

    /// Validates the settings and builds the configured store.
    ///
    /// # Errors
    /// - [`SeshatError::Config`] if the thresholds are inconsistent
    /// - [`SeshatError::Store`] if the remote store settings are unusable
    pub fn build(self) -> Result<Seshat<AnyStore, G>, SeshatError> {
        self.settings.validate()?;
        let Settings {
            session,
            cookies,
            readiness,
            store,
        } = self.settings;

        let store = AnyStore::from_backend(store.backend)?;
        tracing::info!(
            store = store.kind(),
            ttl_secs = session.ttl.as_secs(),
            rotate_after_secs = session.rotate_after.as_secs(),
            same_site = %cookies.same_site,
            "session layer ready"
        );

        let service = SessionService::new(store, session);
        Ok(Seshat::from_parts(service, self.gate, cookies, readiness))
    }
}
