//! Startup configuration.
//!
//! Read once, before the first request. Every value has a safe default, so
//! an empty environment gives a working in-memory deployment.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `SESSION_TTL_DAYS` | 14 |
//! | `SESSION_ROTATE_AFTER_DAYS` | 7 |
//! | `SESSION_STORE_TIMEOUT_SECS` | 10 |
//! | `SESSION_STORE` | `memory` (or `remote`) |
//! | `SESSION_STORE_URL` | required for `remote` |
//! | `SESSION_STORE_COLLECTION` | `sessions` |
//! | `SESSION_STORE_API_KEY` | unset |
//! | `COOKIE_DOMAIN` | unset (host-only) |
//! | `COOKIE_SAMESITE` | `Lax` (or `None`) |
//! | `COOKIE_READY_ATTEMPTS` | 5 |
//! | `COOKIE_READY_INTERVAL_MS` | 100 |

use std::str::FromStr;
use std::time::Duration;

use seshat_bridge::{CookiePolicy, ReadinessPolicy, SameSitePolicy};
use seshat_session::SessionConfig;
use seshat_store::{RemoteConfig, StoreBackend};

const DAY: u64 = 24 * 60 * 60;

/// A configuration value that can't be used.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var}={value:?} is not valid: expected {expected}")]
    Invalid {
        var: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("{0} must be set when SESSION_STORE=remote")]
    Missing(&'static str),

    #[error("{0}")]
    Inconsistent(String),
}

/// Which store backend to build.
#[derive(Debug, Clone, Default)]
pub struct StoreSettings {
    pub backend: StoreBackend,
}

/// Everything Seshat reads at startup.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub session: SessionConfig,
    pub cookies: CookiePolicy,
    pub readiness: ReadinessPolicy,
    pub store: StoreSettings,
}

impl Settings {
    /// Reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Reads variables through `lookup`. Blank values count as unset.
    ///
    /// # Errors
    /// Returns [`ConfigError`] for unparseable numbers, an unknown store or
    /// SameSite value, a remote store without a URL, or thresholds that
    /// fail [`validate`](Self::validate).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);

        let store_timeout = Duration::from_secs(env.parse("SESSION_STORE_TIMEOUT_SECS", 10)?);
        let session = SessionConfig {
            ttl: Duration::from_secs(env.parse::<u64>("SESSION_TTL_DAYS", 14)?.saturating_mul(DAY)),
            rotate_after: Duration::from_secs(
                env.parse::<u64>("SESSION_ROTATE_AFTER_DAYS", 7)?.saturating_mul(DAY),
            ),
            store_timeout,
        };

        let same_site = match env.get("COOKIE_SAMESITE") {
            Some(value) => value.parse::<SameSitePolicy>().map_err(|_| ConfigError::Invalid {
                var: "COOKIE_SAMESITE",
                value,
                expected: "Lax or None",
            })?,
            None => SameSitePolicy::default(),
        };
        let cookies = CookiePolicy {
            domain: env.get("COOKIE_DOMAIN"),
            same_site,
            max_age: session.ttl,
            ..CookiePolicy::default()
        };

        let readiness = ReadinessPolicy {
            attempts: env.parse("COOKIE_READY_ATTEMPTS", 5)?,
            interval: Duration::from_millis(env.parse("COOKIE_READY_INTERVAL_MS", 100)?),
        };

        let backend = match env.get("SESSION_STORE").map(|v| v.to_ascii_lowercase()) {
            None => StoreBackend::Memory,
            Some(kind) if kind == "memory" => StoreBackend::Memory,
            Some(kind) if kind == "remote" => {
                let base_url = env
                    .get("SESSION_STORE_URL")
                    .ok_or(ConfigError::Missing("SESSION_STORE_URL"))?;
                let mut remote = RemoteConfig::new(base_url);
                if let Some(collection) = env.get("SESSION_STORE_COLLECTION") {
                    remote.collection = collection;
                }
                remote.api_key = env.get("SESSION_STORE_API_KEY");
                remote.timeout = store_timeout;
                StoreBackend::Remote(remote)
            }
            Some(kind) => {
                return Err(ConfigError::Invalid {
                    var: "SESSION_STORE",
                    value: kind,
                    expected: "memory or remote",
                });
            }
        };

        let settings = Self {
            session,
            cookies,
            readiness,
            store: StoreSettings { backend },
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Checks that the thresholds make sense together.
    ///
    /// The rotation threshold must fall strictly inside the TTL: at or past
    /// it, a token would expire before it could ever be rotated.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let SessionConfig {
            ttl,
            rotate_after,
            store_timeout,
        } = &self.session;

        if ttl.is_zero() {
            return Err(ConfigError::Inconsistent("session TTL must be positive".into()));
        }
        if rotate_after.is_zero() || rotate_after >= ttl {
            return Err(ConfigError::Inconsistent(format!(
                "rotation threshold ({}s) must be positive and below the TTL ({}s)",
                rotate_after.as_secs(),
                ttl.as_secs()
            )));
        }
        if store_timeout.is_zero() {
            return Err(ConfigError::Inconsistent("store timeout must be positive".into()));
        }
        Ok(())
    }
}

struct Env<F>(F);

impl<F: Fn(&str) -> Option<String>> Env<F> {
    fn get(&self, var: &str) -> Option<String> {
        (self.0)(var)
            .map(|v| v.trim().to_owned())
            .filter(|v| !v.is_empty())
    }

    fn parse<T: FromStr>(&self, var: &'static str, default: T) -> Result<T, ConfigError> {
        match self.get(var) {
            None => Ok(default),
            Some(value) => value.parse().map_err(|_| ConfigError::Invalid {
                var,
                value,
                expected: "a non-negative integer",
            }),
        }
    }
}
