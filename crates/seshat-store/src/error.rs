use std::time::Duration;

use seshat_protocol::ProtocolError;

/// Errors that can occur in the store layer.
///
/// Everything except [`StoreError::Corrupt`] and
/// [`StoreError::InvalidConfig`] is transient: the backend may well answer
/// the next request. Callers above this layer turn transient errors into
/// "no session for this request" and never retry in a loop.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backend could not be reached or answered with a server error.
    #[error("session store unavailable: {0}")]
    Unavailable(String),

    /// The call did not finish within its deadline.
    #[error("session store call timed out after {0:?}")]
    Timeout(Duration),

    /// The backend answered with a status we don't expect (401, 403, ...).
    #[error("session store rejected the request with status {status}")]
    Rejected { status: u16 },

    /// The stored bytes under a token don't decode to a session document.
    #[error("stored session record is corrupt: {0}")]
    Corrupt(#[from] ProtocolError),

    /// The backend settings are unusable (bad base URL, etc.).
    #[error("invalid store configuration: {0}")]
    InvalidConfig(String),
}

impl StoreError {
    /// `true` for outages and timeouts that say nothing about the token.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Unavailable(_) | Self::Timeout(_) | Self::Rejected { .. }
        )
    }
}
