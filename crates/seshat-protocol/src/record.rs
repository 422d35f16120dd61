//! Session records: the in-memory view and the persisted document.
//!
//! Timestamps are whole seconds since the Unix epoch. That is the shape
//! storage backends exchange, and a second is fine-grained enough for
//! lifetimes measured in days.

use serde::{Deserialize, Serialize};

use crate::types::deserialize_optional;
use crate::{Fingerprint, OwnerId, ProtocolError, Token};

// ---------------------------------------------------------------------------
// StoredSession
// ---------------------------------------------------------------------------

/// The document a storage backend keeps under a token key.
///
/// The token itself is the key, so it is not repeated in the body:
///
/// ```json
/// { "owner_id": "stu42", "issued_at": 1700000000,
///   "expires_at": 1701209600, "device_fingerprint": "9f86…" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSession {
    pub owner_id: OwnerId,
    pub issued_at: u64,
    pub expires_at: u64,
    #[serde(default, deserialize_with = "deserialize_optional")]
    pub device_fingerprint: Option<Fingerprint>,
}

impl StoredSession {
    /// Reattaches the key and checks the record invariants.
    ///
    /// # Errors
    /// Returns [`ProtocolError::InvalidRecord`] when the document is
    /// corrupt: a blank owner, or `expires_at <= issued_at`.
    pub fn into_record(self, token: Token) -> Result<SessionRecord, ProtocolError> {
        if self.owner_id.is_blank() {
            return Err(ProtocolError::InvalidRecord("blank owner_id".into()));
        }
        if self.expires_at <= self.issued_at {
            return Err(ProtocolError::InvalidRecord(format!(
                "expires_at {} is not after issued_at {}",
                self.expires_at, self.issued_at
            )));
        }
        Ok(SessionRecord {
            token,
            owner_id: self.owner_id,
            issued_at: self.issued_at,
            expires_at: self.expires_at,
            device_fingerprint: self.device_fingerprint,
        })
    }
}

// ---------------------------------------------------------------------------
// SessionRecord
// ---------------------------------------------------------------------------

/// One live session as the service layer sees it.
///
/// Invariant: `expires_at > issued_at`. Records built through
/// [`SessionRecord::issue`] or [`StoredSession::into_record`] always hold it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    pub token: Token,
    pub owner_id: OwnerId,
    pub issued_at: u64,
    pub expires_at: u64,
    pub device_fingerprint: Option<Fingerprint>,
}

impl SessionRecord {
    /// Builds a brand-new record with a freshly generated token.
    ///
    /// `ttl_secs` is clamped to at least one second so the invariant holds
    /// even for a degenerate configuration.
    pub fn issue(
        owner_id: OwnerId,
        device_fingerprint: Option<Fingerprint>,
        now: u64,
        ttl_secs: u64,
    ) -> Self {
        Self {
            token: Token::generate(),
            owner_id,
            issued_at: now,
            expires_at: now.saturating_add(ttl_secs.max(1)),
            device_fingerprint,
        }
    }

    /// `true` once `now` has reached `expires_at`.
    pub fn is_expired(&self, now: u64) -> bool {
        self.expires_at <= now
    }

    /// Seconds since the token was issued (zero if the clock went backwards).
    pub fn age(&self, now: u64) -> u64 {
        now.saturating_sub(self.issued_at)
    }

    /// The document form of this record, without the token.
    pub fn to_stored(&self) -> StoredSession {
        StoredSession {
            owner_id: self.owner_id.clone(),
            issued_at: self.issued_at,
            expires_at: self.expires_at,
            device_fingerprint: self.device_fingerprint.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// RotationDecision
// ---------------------------------------------------------------------------

/// What the rotation policy did with a validated token. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationDecision {
    pub rotate: bool,
    pub new_token: Option<Token>,
}

impl RotationDecision {
    /// The token stays; only its expiry moved.
    pub fn keep() -> Self {
        Self {
            rotate: false,
            new_token: None,
        }
    }

    /// The token was replaced by `new_token`.
    pub fn rotated(new_token: Token) -> Self {
        Self {
            rotate: true,
            new_token: Some(new_token),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner() -> OwnerId {
        OwnerId::new("stu42").unwrap()
    }

    #[test]
    fn test_issue_sets_expiry_from_ttl() {
        let record = SessionRecord::issue(owner(), None, 1_000, 500);
        assert_eq!(record.issued_at, 1_000);
        assert_eq!(record.expires_at, 1_500);
        assert!(!record.is_expired(1_499));
        assert!(record.is_expired(1_500));
    }

    #[test]
    fn test_issue_zero_ttl_still_holds_invariant() {
        let record = SessionRecord::issue(owner(), None, 1_000, 0);
        assert!(record.expires_at > record.issued_at);
    }

    #[test]
    fn test_age_saturates_when_clock_goes_backwards() {
        let record = SessionRecord::issue(owner(), None, 1_000, 500);
        assert_eq!(record.age(1_200), 200);
        assert_eq!(record.age(900), 0);
    }

    #[test]
    fn test_into_record_rejects_inverted_times() {
        let stored = StoredSession {
            owner_id: owner(),
            issued_at: 2_000,
            expires_at: 2_000,
            device_fingerprint: None,
        };
        let result = stored.into_record(Token::generate());
        assert!(matches!(result, Err(ProtocolError::InvalidRecord(_))));
    }

    #[test]
    fn test_stored_round_trip_keeps_token_out_of_body() {
        let record =
            SessionRecord::issue(owner(), Fingerprint::new("fpA"), 10, 100);
        let json = serde_json::to_string(&record.to_stored()).unwrap();
        assert!(!json.contains(record.token.as_str()));

        let stored: StoredSession = serde_json::from_str(&json).unwrap();
        let back = stored.into_record(record.token.clone()).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_empty_fingerprint_string_reads_as_none() {
        let json = r#"{"owner_id":"stu1","issued_at":1,"expires_at":2,"device_fingerprint":""}"#;
        let stored: StoredSession = serde_json::from_str(json).unwrap();
        assert_eq!(stored.device_fingerprint, None);

        let missing = r#"{"owner_id":"stu1","issued_at":1,"expires_at":2}"#;
        let stored: StoredSession = serde_json::from_str(missing).unwrap();
        assert_eq!(stored.device_fingerprint, None);
    }
}
