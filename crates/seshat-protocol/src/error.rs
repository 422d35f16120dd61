//! Error types for the protocol layer.
//!
//! Each crate in Seshat defines its own error enum. A `ProtocolError`
//! always means "this value does not have the shape a session value must
//! have", never "the backend is down".

/// Errors that can occur while parsing identity values or decoding records.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// The presented token is empty or not shaped like a token we mint.
    ///
    /// Callers treat this exactly like an unknown token: the client is
    /// simply not authenticated.
    #[error("malformed token: {0}")]
    MalformedToken(&'static str),

    /// The owner identifier is empty after normalization.
    #[error("invalid owner id: {0}")]
    InvalidOwner(String),

    /// A stored document decoded fine but violates a record invariant
    /// (for example `expires_at <= issued_at`).
    #[error("invalid session record: {0}")]
    InvalidRecord(String),

    /// Serializing a stored document failed.
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserializing a stored document failed: truncated bytes, wrong
    /// field types, or missing required fields.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),
}
