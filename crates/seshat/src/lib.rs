//! # Seshat
//!
//! Persistent, rotating login sessions for web apps that must survive a
//! hard refresh.
//!
//! Seshat issues an unpredictable token at login, keeps it in a cookie,
//! validates it on every page load, and periodically swaps it for a fresh
//! one, so a learner who visits every few days is never asked for a
//! password again while a leaked token goes stale within a week.
//!
//! The layers, bottom to top:
//!
//! - `seshat-protocol`: tokens, owner ids, fingerprints, stored records
//! - `seshat-store`: where records live (in memory or a remote service)
//! - `seshat-session`: minting, validation, rotation, revocation
//! - `seshat-bridge`: cookies and the in-memory mirror
//! - this crate: configuration, the roster gate, and the page-load flow
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use seshat::prelude::*;
//!
//! # async fn page_load() -> Result<(), SeshatError> {
//! seshat::init_tracing();
//! let seshat = Seshat::builder()
//!     .settings(Settings::from_env()?)
//!     .build()?;
//!
//! // Per request:
//! let flow = seshat.client(HeaderCookieJar::from_request_header(Some("session_token=...")));
//! match flow.restore(Some("fingerprint")).await {
//!     RestoreOutcome::Restored { owner, .. } => println!("welcome back, {owner}"),
//!     outcome => println!("{}", outcome.user_message().unwrap_or_default()),
//! }
//! # Ok(()) }
//! ```

mod app;
mod config;
mod error;
mod flow;
mod gate;

pub use app::{Seshat, SeshatBuilder};
pub use config::{ConfigError, Settings, StoreSettings};
pub use error::SeshatError;
pub use flow::{LOGIN_PROMPT, RestoreOutcome, SessionFlow};
pub use gate::{Admission, GateError, OpenGate, RosterGate};

pub use seshat_bridge as bridge;
pub use seshat_protocol as protocol;
pub use seshat_session as session;
pub use seshat_store as store;

use tracing_subscriber::EnvFilter;

/// Installs a `tracing` subscriber that writes to stderr.
///
/// The level comes from `RUST_LOG` (e.g. `RUST_LOG=seshat=debug`) and
/// defaults to `info`. Calling it again, or after another subscriber was
/// installed, does nothing.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Convenience re-exports for the common case.
pub mod prelude {
    pub use crate::{
        Admission, GateError, LOGIN_PROMPT, OpenGate, RestoreOutcome, RosterGate, Seshat,
        SeshatError, SessionFlow, Settings, init_tracing,
    };
    pub use seshat_bridge::{
        CookieBackend, CookiePolicy, HeaderCookieJar, MemoryCookieJar, ReadinessPolicy,
        SameSitePolicy,
    };
    pub use seshat_protocol::{Fingerprint, OwnerId, Token};
    pub use seshat_session::{SessionConfig, SessionService};
    pub use seshat_store::{AnyStore, MemoryStore, Store, StoreBackend};
}
