//! Identity values shared by every Seshat layer.
//!
//! All three types here are newtype wrappers. Wrapping a `String` keeps a
//! token from being passed where an owner id is expected, and lets each
//! type enforce its own normalization once, at construction.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::Rng;
use serde::{Deserialize, Deserializer, Serialize};
use sha2::{Digest, Sha256};

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Token
// ---------------------------------------------------------------------------

/// An opaque bearer credential naming one session.
///
/// Minted tokens are 48 bytes from the thread-local CSPRNG, encoded as
/// unpadded URL-safe base64, so they are safe in cookies, URLs, and
/// document paths without escaping.
///
/// `Token` deliberately has no `Display` impl. Logging a token goes through
/// [`Token::redacted`], which only ever shows a short prefix.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Token(String);

impl Token {
    /// Number of random bytes behind a freshly minted token (384 bits).
    pub const RANDOM_BYTES: usize = 48;

    /// Length of a freshly minted token once encoded.
    pub const ENCODED_LEN: usize = 64;

    /// Shortest accepted token: 256 bits of base64 without padding.
    const MIN_LEN: usize = 43;

    /// Longest accepted token. Anything longer is junk, not a credential.
    const MAX_LEN: usize = 128;

    /// Mints a new unpredictable token.
    pub fn generate() -> Self {
        let mut bytes = [0u8; Self::RANDOM_BYTES];
        rand::rng().fill(&mut bytes[..]);
        Self(URL_SAFE_NO_PAD.encode(bytes))
    }

    /// Parses a token presented by a client.
    ///
    /// Surrounding whitespace is ignored. The remainder must be 43 to 128
    /// characters from the URL-safe base64 alphabet.
    ///
    /// # Errors
    /// Returns [`ProtocolError::MalformedToken`] for empty or wrongly shaped
    /// input. Callers treat that the same as an unknown token.
    pub fn parse(raw: &str) -> Result<Self, ProtocolError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(ProtocolError::MalformedToken("empty"));
        }
        if raw.len() < Self::MIN_LEN {
            return Err(ProtocolError::MalformedToken("too short"));
        }
        if raw.len() > Self::MAX_LEN {
            return Err(ProtocolError::MalformedToken("too long"));
        }
        let url_safe = raw
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
        if !url_safe {
            return Err(ProtocolError::MalformedToken("unexpected character"));
        }
        Ok(Self(raw.to_owned()))
    }

    /// The raw token value, for cookies and storage keys only.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// A log-safe view of the token showing only its first characters.
    pub fn redacted(&self) -> Redacted<'_> {
        Redacted(&self.0)
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Token({})", self.redacted())
    }
}

/// Display adapter returned by [`Token::redacted`].
pub struct Redacted<'a>(&'a str);

impl fmt::Display for Redacted<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Tokens are ASCII, so byte slicing cannot split a character.
        let shown = self.0.len().min(6);
        write!(f, "{}…", &self.0[..shown])
    }
}

// ---------------------------------------------------------------------------
// OwnerId
// ---------------------------------------------------------------------------

/// The account a session belongs to (a student code in practice).
///
/// Owner ids are trimmed and lower-cased on construction so that
/// `" STU42 "` and `"stu42"` name the same learner. Serialization is
/// transparent: an `OwnerId("stu42")` is stored as plain `"stu42"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(String);

impl OwnerId {
    /// Normalizes and validates an owner id.
    ///
    /// # Errors
    /// Returns [`ProtocolError::InvalidOwner`] if nothing is left after
    /// trimming.
    pub fn new(raw: &str) -> Result<Self, ProtocolError> {
        let normalized = raw.trim().to_lowercase();
        if normalized.is_empty() {
            return Err(ProtocolError::InvalidOwner(
                "owner id must not be blank".into(),
            ));
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub(crate) fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Fingerprint
// ---------------------------------------------------------------------------

/// A best-effort device binding, typically a hash of the user agent.
///
/// A fingerprint is soft: clients that cannot compute one present nothing,
/// and that is always accepted. Only two *non-empty* fingerprints that
/// differ count as a mismatch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Wraps a fingerprint value. Blank input yields `None`.
    pub fn new(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            None
        } else {
            Some(Self(raw.to_owned()))
        }
    }

    /// Derives a fingerprint from a user-agent string: the lowercase hex
    /// SHA-256 of the trimmed value. Blank user agents yield `None`.
    pub fn from_user_agent(user_agent: &str) -> Option<Self> {
        let user_agent = user_agent.trim();
        if user_agent.is_empty() {
            return None;
        }
        Some(Self(hex::encode(Sha256::digest(user_agent.as_bytes()))))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Applies the lenient device-binding rule.
    ///
    /// Returns `false` only when both sides carry a fingerprint and the
    /// values differ. A session minted without a fingerprint accepts any
    /// device, and a device that presents none is accepted by any session.
    pub fn compatible(stored: Option<&Self>, presented: Option<&Self>) -> bool {
        match (stored, presented) {
            (Some(stored), Some(presented)) => stored == presented,
            _ => true,
        }
    }
}

impl<'de> Deserialize<'de> for Fingerprint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Stored as a plain string. Blank strings never reach this point as
        // `Fingerprint`; see `deserialize_optional` below.
        let raw = String::deserialize(deserializer)?;
        Ok(Self(raw))
    }
}

/// Reads an optional fingerprint, treating `""` the same as `null`.
///
/// Older documents store an empty string for "no fingerprint".
pub(crate) fn deserialize_optional<'de, D>(
    deserializer: D,
) -> Result<Option<Fingerprint>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(Fingerprint::new))
}
