//! Unified error type for Seshat.

use seshat_bridge::BridgeError;
use seshat_protocol::ProtocolError;
use seshat_session::SessionError;
use seshat_store::StoreError;

use crate::{ConfigError, GateError};

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `seshat` meta-crate you deal with this single error
/// type. The `#[from]` attribute on each variant generates the `From`
/// impls, so `?` converts sub-crate errors automatically.
///
/// Page-load code rarely sees one of these: restoring and signing out
/// degrade to "no session" instead. They come from startup (configuration,
/// store construction) and from sign-in.
#[derive(Debug, thiserror::Error)]
pub enum SeshatError {
    /// Token or record shape problem.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The session store failed or could not be built.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Minting or validation failed.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Cookie persistence failed.
    #[error(transparent)]
    Bridge(#[from] BridgeError),

    /// Startup configuration is unusable.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The roster could not be consulted.
    #[error(transparent)]
    Gate(#[from] GateError),
}
