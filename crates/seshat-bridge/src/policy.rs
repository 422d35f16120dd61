//! Cookie attributes.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use cookie::{Cookie, SameSite};

use crate::BridgeError;

/// The `SameSite` values a session cookie may use.
///
/// `Strict` is deliberately absent: the browser would drop the cookie on
/// the redirect back from an external login page, logging the user out on
/// every sign-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SameSitePolicy {
    #[default]
    Lax,
    /// Required when the app is embedded cross-site. Implies `Secure`.
    None,
}

impl SameSitePolicy {
    fn as_cookie(self) -> SameSite {
        match self {
            Self::Lax => SameSite::Lax,
            Self::None => SameSite::None,
        }
    }
}

impl FromStr for SameSitePolicy {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lax" => Ok(Self::Lax),
            "none" => Ok(Self::None),
            "strict" => Err(BridgeError::InvalidSetting(
                "SameSite=Strict breaks sign-in redirects; use Lax or None".into(),
            )),
            other => Err(BridgeError::InvalidSetting(format!(
                "unknown SameSite value {other:?}"
            ))),
        }
    }
}

impl fmt::Display for SameSitePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lax => write!(f, "Lax"),
            Self::None => write!(f, "None"),
        }
    }
}

/// Attributes shared by the session cookie and its companion.
#[derive(Debug, Clone)]
pub struct CookiePolicy {
    /// `Domain` attribute. `None` makes the cookie host-only.
    pub domain: Option<String>,
    pub same_site: SameSitePolicy,
    /// `Secure` attribute. Only worth turning off for plain-HTTP local
    /// development; ignored when `same_site` is `None`.
    pub secure: bool,
    /// `Max-Age`. Should equal the session TTL so the browser forgets the
    /// token about when the server does.
    ///
    /// Default: 14 days.
    pub max_age: Duration,
}

impl Default for CookiePolicy {
    fn default() -> Self {
        Self {
            domain: None,
            same_site: SameSitePolicy::Lax,
            secure: true,
            max_age: Duration::from_secs(14 * 24 * 60 * 60),
        }
    }
}

impl CookiePolicy {
    /// A persistent cookie carrying `value`.
    pub fn build(&self, name: &str, value: &str) -> Cookie<'static> {
        let max_age = time::Duration::seconds(saturating_secs(self.max_age));
        let mut cookie = Cookie::build((name.to_owned(), value.to_owned()))
            .path("/")
            .http_only(true)
            .secure(self.secure || self.same_site == SameSitePolicy::None)
            .same_site(self.same_site.as_cookie())
            .max_age(max_age)
            .build();
        if let Some(domain) = &self.domain {
            cookie.set_domain(domain.clone());
        }
        cookie
    }

    /// A cookie that tells the browser to forget `name`.
    ///
    /// Path and domain must match the original or the browser keeps it.
    pub fn removal(&self, name: &str) -> Cookie<'static> {
        let mut cookie = Cookie::build((name.to_owned(), ""))
            .path("/")
            .max_age(time::Duration::ZERO)
            .build();
        if let Some(domain) = &self.domain {
            cookie.set_domain(domain.clone());
        }
        cookie
    }
}

fn saturating_secs(d: Duration) -> i64 {
    i64::try_from(d.as_secs()).unwrap_or(i64::MAX)
}
