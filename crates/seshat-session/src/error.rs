//! Error types for the session layer.

use std::fmt;

use seshat_protocol::ProtocolError;
use seshat_store::StoreError;

/// Why a well-formed token was turned away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Nothing is stored under the token (never issued, rotated away, or
    /// logged out).
    Unknown,
    /// The record exists but `expires_at` has passed.
    Expired,
    /// Both the record and the request carry a fingerprint, and they differ.
    FingerprintMismatch,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => write!(f, "unknown"),
            Self::Expired => write!(f, "expired"),
            Self::FingerprintMismatch => write!(f, "fingerprint mismatch"),
        }
    }
}

/// Errors that can occur during session management.
///
/// Only the fallible entry points return these. `validate`,
/// `rotate_if_needed`, and `destroy` absorb them and degrade to
/// "not authenticated".
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The token is well formed but not (or no longer) valid.
    #[error("invalid session token: {0}")]
    InvalidToken(Rejection),

    /// The presented token is empty or not token-shaped.
    #[error("malformed session token: {0}")]
    MalformedToken(#[source] ProtocolError),

    /// The owner id handed over by the login flow is unusable.
    #[error("invalid session owner: {0}")]
    InvalidOwner(#[source] ProtocolError),

    /// The record stored under the token is corrupt. This is the one
    /// genuinely unexpected condition; it still ends in "logged out".
    #[error("corrupt session record: {0}")]
    Corrupt(#[source] ProtocolError),

    /// The store failed or timed out. Says nothing about the token.
    #[error("session backend error: {0}")]
    Backend(#[source] StoreError),
}

impl SessionError {
    /// `true` when the failure is the backend's, not the token's.
    ///
    /// Callers use this to decide whether the client's cookies should be
    /// kept (transient) or cleared (the token itself is bad).
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Backend(e) => e.is_transient(),
            _ => false,
        }
    }
}

impl From<StoreError> for SessionError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Corrupt(inner) => Self::Corrupt(inner),
            other => Self::Backend(other),
        }
    }
}
