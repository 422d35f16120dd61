//! The business-rule gate applied after a token validates.
//!
//! A token says who the client is. Whether that person may still use the
//! app (is their contract still running?) is a separate question, answered
//! by an external roster. Keeping the two apart means a roster change
//! never needs a store-level revocation: the next restore simply turns the
//! session away.

use std::future::Future;

use seshat_protocol::OwnerId;

/// The roster's verdict on an authenticated owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    Admitted,
    /// Turned away; the reason is for logs, not for the user.
    Denied(String),
}

/// The roster could not be consulted. Treated like a store outage.
#[derive(Debug, thiserror::Error)]
#[error("roster unavailable: {0}")]
pub struct GateError(pub String);

/// Decides whether an authenticated owner may continue.
///
/// Implement this for whatever holds enrollment data.
///
/// # Example
///
/// ```rust,ignore
/// struct Roster { active: HashSet<String> }
///
/// impl RosterGate for Roster {
///     async fn admit(&self, owner: &OwnerId) -> Result<Admission, GateError> {
///         if self.active.contains(owner.as_str()) {
///             Ok(Admission::Admitted)
///         } else {
///             Ok(Admission::Denied("contract expired".into()))
///         }
///     }
/// }
/// ```
pub trait RosterGate: Send + Sync + 'static {
    fn admit(
        &self,
        owner: &OwnerId,
    ) -> impl Future<Output = Result<Admission, GateError>> + Send;
}

/// Admits everyone. The default when no roster is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenGate;

impl RosterGate for OpenGate {
    async fn admit(&self, _owner: &OwnerId) -> Result<Admission, GateError> {
        Ok(Admission::Admitted)
    }
}
