use std::time::Duration;

const DAY: u64 = 24 * 60 * 60;

/// Configuration for session lifetimes.
///
/// Read once at startup. The defaults match a learner who logs in on
/// Monday and comes back two weekends later without typing a password.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// How long a session lives without being used. Every successful
    /// validation pushes `expires_at` to `now + ttl`.
    ///
    /// Default: 14 days.
    pub ttl: Duration,

    /// Token age at which the next validation swaps the token for a new one.
    /// Bounds how long a leaked token stays useful.
    ///
    /// Default: 7 days.
    pub rotate_after: Duration,

    /// Deadline for each individual store call. A call that runs past it
    /// counts as a transient backend failure.
    ///
    /// Default: 10 seconds.
    pub store_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::with_days(14, 7)
    }
}

impl SessionConfig {
    /// A config with the given TTL and rotation threshold, in days.
    pub fn with_days(ttl_days: u64, rotate_after_days: u64) -> Self {
        Self {
            ttl: Duration::from_secs(ttl_days * DAY),
            rotate_after: Duration::from_secs(rotate_after_days * DAY),
            store_timeout: Duration::from_secs(10),
        }
    }

    /// TTL in whole seconds, as stored in records and cookie `Max-Age`.
    pub fn ttl_secs(&self) -> u64 {
        self.ttl.as_secs()
    }
}
