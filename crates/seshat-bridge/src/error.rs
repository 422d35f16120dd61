use std::time::Duration;

/// Errors from the client persistence layer.
///
/// None of these reach the user. The bridge logs them and degrades: a
/// failed write leaves the mirror updated, a failed readiness wait reads as
/// "no cookie".
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// The cookie subsystem did not become ready within the budget.
    #[error("cookie store not ready after {0:?}")]
    NotReady(Duration),

    /// The readiness signal was dropped before it ever fired.
    #[error("cookie store readiness signal dropped")]
    Abandoned,

    /// The backend refused to store or remove a cookie.
    #[error("cookie write failed: {0}")]
    Write(String),

    /// A configuration value for cookies is unusable.
    #[error("invalid cookie setting: {0}")]
    InvalidSetting(String),
}
