//! Session token storage for Seshat.
//!
//! Provides the [`Store`] trait, a durable keyed map from an opaque token to
//! a [`StoredSession`] document, and its backends:
//!
//! - [`MemoryStore`]: deterministic, in-process; used by tests and single
//!   node development.
//! - [`RemoteStore`]: a document service reached over HTTP. Enabled by the
//!   `remote` feature (on by default).
//! - [`AnyStore`]: whichever of the two the configuration names.
//!
//! # Failure semantics
//!
//! Every operation is idempotent. `delete` on a missing token succeeds.
//! Backend failures come back as [`StoreError`] values; it is the session
//! layer's job to degrade them to "not authenticated".

mod backend;
mod error;
mod memory;
#[cfg(feature = "remote")]
mod remote;

pub use backend::{AnyStore, StoreBackend};
pub use error::StoreError;
pub use memory::MemoryStore;
#[cfg(feature = "remote")]
pub use remote::{RemoteConfig, RemoteStore};

use std::future::Future;

use seshat_protocol::{StoredSession, Token};

/// Keyed persistence for session documents.
///
/// Implementations must tolerate concurrent readers and writers, including
/// other processes writing the same backend. No operation may assume it is
/// the only writer.
///
/// The methods return `impl Future + Send` so the service built on a store
/// can run inside `tokio::spawn`ed request handlers. Implementors can simply
/// write `async fn`.
pub trait Store: Send + Sync + 'static {
    /// Writes (or overwrites) the document stored under `token`.
    fn put(
        &self,
        token: &Token,
        session: &StoredSession,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Reads the document stored under `token`.
    ///
    /// Returns `Ok(None)` when nothing is stored there.
    fn get(
        &self,
        token: &Token,
    ) -> impl Future<Output = Result<Option<StoredSession>, StoreError>> + Send;

    /// Removes the document stored under `token`. Missing tokens are a no-op.
    fn delete(&self, token: &Token) -> impl Future<Output = Result<(), StoreError>> + Send;
}
