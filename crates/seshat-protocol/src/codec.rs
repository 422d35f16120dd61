//! Codec trait and implementations for stored session documents.
//!
//! A storage backend only moves bytes under a key. The codec decides what
//! those bytes look like. Backends take any [`Codec`], so a compact binary
//! format can replace JSON later without touching the session layer.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Encodes values to bytes and decodes them back.
///
/// `Send + Sync + 'static` because a codec lives inside a store that is
/// shared across Tokio tasks for the whole life of the process.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if the value cannot be represented.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed or don't
    /// match the expected shape. For stored sessions that means the record
    /// is corrupt.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// JSON matches what document databases and REST backends expect, and
/// stored sessions stay readable when someone has to inspect the store.
///
/// ```rust
/// use seshat_protocol::{Codec, JsonCodec, OwnerId, SessionRecord, StoredSession};
///
/// let record = SessionRecord::issue(OwnerId::new("stu42").unwrap(), None, 0, 60);
/// let bytes = JsonCodec.encode(&record.to_stored()).unwrap();
/// let stored: StoredSession = JsonCodec.decode(&bytes).unwrap();
/// assert_eq!(stored, record.to_stored());
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
