//! Client-side credential persistence for Seshat.
//!
//! A session only survives a hard refresh if the browser kept the token.
//! This crate owns that concern:
//!
//! - [`CookieBackend`]: the cookie subsystem, abstracted. [`MemoryCookieJar`]
//!   for tests and demos, [`HeaderCookieJar`] for a server that sees the
//!   request's `Cookie:` header and answers with `Set-Cookie:` headers.
//! - [`CookiePolicy`]: the attributes every session cookie carries.
//! - [`Readiness`]: some cookie subsystems load asynchronously. Reading
//!   before they are ready would show a logged-out page on every refresh,
//!   so reads first await readiness within a [`ReadinessPolicy`] budget.
//! - [`CookieBridge`]: writes and reads the credential, keeping an in-memory
//!   mirror in step with the cookies.

mod bridge;
mod error;
mod jar;
mod policy;
mod readiness;

pub use bridge::{ClientCredential, CookieBridge};
pub use error::BridgeError;
pub use jar::{CookieBackend, HeaderCookieJar, MemoryCookieJar};
pub use policy::{CookiePolicy, SameSitePolicy};
pub use readiness::{ReadinessPolicy, ReadySignal, Readiness, readiness};

/// Name of the cookie holding the session token.
pub const SESSION_COOKIE: &str = "session_token";

/// Name of the companion cookie holding the owner id. A hint for the UI
/// only; it never authenticates anything.
pub const OWNER_HINT_COOKIE: &str = "student_code";
