//! The rotation policy: a one-axis state machine keyed on token age.
//!
//! ```text
//!   issued ──(age < rotate_after)──→ Fresh ──(validate)──→ extend expires_at
//!                                      │
//!                            (age >= rotate_after)
//!                                      ▼
//!                                    Stale ──(validate)──→ new token, old deleted
//! ```
//!
//! A leaked token is useful for at most `rotate_after` of activity before
//! the legitimate owner's next visit replaces it, while the owner's logical
//! session can go on indefinitely through repeated rotation.

use std::time::Duration;

use seshat_protocol::SessionRecord;

/// Where a valid token sits on the age axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenAge {
    /// Younger than the threshold: keep the token, extend its expiry.
    Fresh,
    /// At or past the threshold: replace the token.
    Stale,
}

/// Decides whether a validated token should be rotated.
#[derive(Debug, Clone, Copy)]
pub struct RotationPolicy {
    rotate_after_secs: u64,
}

impl RotationPolicy {
    pub fn new(rotate_after: Duration) -> Self {
        Self {
            rotate_after_secs: rotate_after.as_secs(),
        }
    }

    /// Classifies `record` as of `now`.
    pub fn classify(&self, record: &SessionRecord, now: u64) -> TokenAge {
        if record.age(now) >= self.rotate_after_secs {
            TokenAge::Stale
        } else {
            TokenAge::Fresh
        }
    }
}
