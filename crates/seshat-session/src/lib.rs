//! Session lifecycle for Seshat.
//!
//! This crate turns a [`Store`](seshat_store::Store) into a session
//! service:
//!
//! 1. **Minting**: a successful login becomes an unpredictable token
//!    ([`SessionService::create_session`]).
//! 2. **Validation**: a presented token is checked for existence, expiry,
//!    and device fingerprint ([`SessionService::validate`]).
//! 3. **Rotation**: a valid token is either extended in place or swapped
//!    for a fresh one, depending on its age ([`RotationPolicy`]).
//! 4. **Revocation**: logout deletes the token ([`SessionService::destroy`]).
//!
//! # How it fits in the stack
//!
//! ```text
//! Restoration flow (above)  ← decides what the browser sees
//!     ↕
//! Session layer (this crate)  ← decides whether a token is good
//!     ↕
//! Store layer (below)  ← remembers tokens
//! ```
//!
//! Expected authentication failures never panic and never surface as
//! anything scarier than `None`. The fallible variants
//! ([`SessionService::inspect`], [`SessionService::refresh`]) exist for
//! callers that must tell an outage apart from a bad token.

mod clock;
mod config;
mod error;
mod rotation;
mod service;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::SessionConfig;
pub use error::{Rejection, SessionError};
pub use rotation::{RotationPolicy, TokenAge};
pub use service::{Refreshed, SessionService};
