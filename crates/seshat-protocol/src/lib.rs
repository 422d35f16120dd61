//! Session record types and token format for Seshat.
//!
//! This crate defines what a session looks like at rest and on the wire:
//!
//! - **Types** ([`Token`], [`OwnerId`], [`Fingerprint`]): the identity
//!   values every other layer passes around.
//! - **Records** ([`SessionRecord`], [`StoredSession`], [`RotationDecision`]):
//!   a session as the service sees it, and the document shape a storage
//!   backend persists.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how stored documents are
//!   turned into bytes and back.
//! - **Errors** ([`ProtocolError`]): malformed input and corrupt records.
//!
//! # Architecture
//!
//! The protocol layer knows nothing about storage backends, clocks, or
//! cookies. It only knows how to name, shape, and serialize a session.
//!
//! ```text
//! Store (bytes by token) → Protocol (StoredSession) → Session (lifecycle)
//! ```

mod codec;
mod error;
mod record;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use record::{RotationDecision, SessionRecord, StoredSession};
pub use types::{Fingerprint, OwnerId, Redacted, Token};
