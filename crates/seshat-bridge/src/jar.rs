//! Cookie backends.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use cookie::Cookie;

use crate::{BridgeError, ReadySignal, Readiness, readiness};

/// The cookie subsystem a [`CookieBridge`](crate::CookieBridge) talks to.
///
/// Reads and writes are synchronous: once a backend is ready, cookies are
/// plain in-memory data. Only readiness is asynchronous.
pub trait CookieBackend: Send + Sync + 'static {
    /// The current value of `name`, if the client sent one.
    fn get(&self, name: &str) -> Option<String>;

    /// Stores a cookie with all its attributes.
    fn set(&self, cookie: Cookie<'static>) -> Result<(), BridgeError>;

    /// Removes a cookie. `removal` carries the path and domain the cookie
    /// was set with.
    fn remove(&self, removal: Cookie<'static>) -> Result<(), BridgeError>;

    /// Resolves once [`get`](Self::get) reflects what the client holds.
    fn readiness(&self) -> Readiness;
}

// Poisoning only means another thread panicked mid-update of a map of
// strings; the map itself is still usable.
fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

// ---------------------------------------------------------------------------
// MemoryCookieJar
// ---------------------------------------------------------------------------

/// A deterministic in-process jar.
///
/// Clones share state, so a test can hand one clone to the bridge and
/// inspect another. Every cookie passed to `set`/`remove` is kept in
/// [`writes`](Self::writes) with its attributes.
#[derive(Clone)]
pub struct MemoryCookieJar {
    inner: Arc<JarState>,
    readiness: Readiness,
}

struct JarState {
    values: Mutex<BTreeMap<String, String>>,
    writes: Mutex<Vec<Cookie<'static>>>,
    refuse_writes: AtomicBool,
}

impl Default for MemoryCookieJar {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryCookieJar {
    /// An empty jar that is ready immediately.
    pub fn new() -> Self {
        Self::with_readiness(Readiness::ready())
    }

    /// An empty jar that becomes ready when the returned signal fires.
    pub fn pending() -> (Self, ReadySignal) {
        let (signal, readiness) = readiness();
        (Self::with_readiness(readiness), signal)
    }

    fn with_readiness(readiness: Readiness) -> Self {
        Self {
            inner: Arc::new(JarState {
                values: Mutex::new(BTreeMap::new()),
                writes: Mutex::new(Vec::new()),
                refuse_writes: AtomicBool::new(false),
            }),
            readiness,
        }
    }

    /// Puts a cookie in the jar as if the client had sent it.
    pub fn preload(&self, name: &str, value: &str) {
        lock(&self.inner.values).insert(name.to_owned(), value.to_owned());
    }

    /// Every cookie written so far, in order, including removals.
    pub fn writes(&self) -> Vec<Cookie<'static>> {
        lock(&self.inner.writes).clone()
    }

    /// The most recent write for `name`.
    pub fn last_write(&self, name: &str) -> Option<Cookie<'static>> {
        lock(&self.inner.writes)
            .iter()
            .rev()
            .find(|c| c.name() == name)
            .cloned()
    }

    /// Makes `set` and `remove` fail until switched back.
    pub fn refuse_writes(&self, refuse: bool) {
        self.inner.refuse_writes.store(refuse, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<(), BridgeError> {
        if self.inner.refuse_writes.load(Ordering::SeqCst) {
            Err(BridgeError::Write("memory jar refusing writes".into()))
        } else {
            Ok(())
        }
    }
}

impl CookieBackend for MemoryCookieJar {
    fn get(&self, name: &str) -> Option<String> {
        lock(&self.inner.values).get(name).cloned()
    }

    fn set(&self, cookie: Cookie<'static>) -> Result<(), BridgeError> {
        self.check_writable()?;
        lock(&self.inner.values).insert(cookie.name().to_owned(), cookie.value().to_owned());
        lock(&self.inner.writes).push(cookie);
        Ok(())
    }

    fn remove(&self, removal: Cookie<'static>) -> Result<(), BridgeError> {
        self.check_writable()?;
        lock(&self.inner.values).remove(removal.name());
        lock(&self.inner.writes).push(removal);
        Ok(())
    }

    fn readiness(&self) -> Readiness {
        self.readiness.clone()
    }
}

// ---------------------------------------------------------------------------
// HeaderCookieJar
// ---------------------------------------------------------------------------

/// A jar for one HTTP request/response exchange.
///
/// Built from the request's `Cookie:` header; writes accumulate as
/// `Set-Cookie:` header values for the response. Later reads in the same
/// request see earlier writes.
pub struct HeaderCookieJar {
    values: Mutex<BTreeMap<String, String>>,
    outgoing: Mutex<Vec<Cookie<'static>>>,
}

impl HeaderCookieJar {
    /// Parses a `Cookie:` request header. Unparseable pairs are skipped; a
    /// missing header gives an empty jar.
    pub fn from_request_header(header: Option<&str>) -> Self {
        let mut values = BTreeMap::new();
        if let Some(header) = header {
            for cookie in Cookie::split_parse(header.to_owned()).flatten() {
                values.insert(cookie.name().to_owned(), cookie.value().to_owned());
            }
        }
        Self {
            values: Mutex::new(values),
            outgoing: Mutex::new(Vec::new()),
        }
    }

    /// `Set-Cookie:` header values for the response, in write order.
    pub fn set_cookie_headers(&self) -> Vec<String> {
        lock(&self.outgoing).iter().map(|c| c.to_string()).collect()
    }
}

impl CookieBackend for HeaderCookieJar {
    fn get(&self, name: &str) -> Option<String> {
        lock(&self.values).get(name).cloned()
    }

    fn set(&self, cookie: Cookie<'static>) -> Result<(), BridgeError> {
        lock(&self.values).insert(cookie.name().to_owned(), cookie.value().to_owned());
        lock(&self.outgoing).push(cookie);
        Ok(())
    }

    fn remove(&self, removal: Cookie<'static>) -> Result<(), BridgeError> {
        lock(&self.values).remove(removal.name());
        lock(&self.outgoing).push(removal);
        Ok(())
    }

    fn readiness(&self) -> Readiness {
        Readiness::ready()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CookiePolicy;

    #[test]
    fn test_memory_jar_set_then_get() {
        let jar = MemoryCookieJar::new();

        jar.set(CookiePolicy::default().build("a", "1")).unwrap();

        assert_eq!(jar.get("a").as_deref(), Some("1"));
        assert_eq!(jar.writes().len(), 1);
    }

    #[test]
    fn test_memory_jar_clones_share_state() {
        let jar = MemoryCookieJar::new();
        let other = jar.clone();

        jar.preload("a", "1");

        assert_eq!(other.get("a").as_deref(), Some("1"));
    }

    #[test]
    fn test_memory_jar_refusing_writes_keeps_values() {
        let jar = MemoryCookieJar::new();
        jar.preload("a", "1");
        jar.refuse_writes(true);

        let result = jar.set(CookiePolicy::default().build("a", "2"));

        assert!(matches!(result, Err(BridgeError::Write(_))));
        assert_eq!(jar.get("a").as_deref(), Some("1"));
        assert!(jar.writes().is_empty());
    }

    #[test]
    fn test_memory_jar_pending_is_not_ready() {
        let (jar, signal) = MemoryCookieJar::pending();
        assert!(!jar.readiness().is_ready());

        signal.mark_ready();

        assert!(jar.readiness().is_ready());
    }

    #[test]
    fn test_header_jar_parses_request_cookies() {
        let jar = HeaderCookieJar::from_request_header(Some(
            "theme=dark; session_token=abc123; student_code=stu42",
        ));

        assert_eq!(jar.get("session_token").as_deref(), Some("abc123"));
        assert_eq!(jar.get("student_code").as_deref(), Some("stu42"));
        assert_eq!(jar.get("missing"), None);
    }

    #[test]
    fn test_header_jar_without_header_is_empty() {
        let jar = HeaderCookieJar::from_request_header(None);
        assert_eq!(jar.get("session_token"), None);
        assert!(jar.set_cookie_headers().is_empty());
    }

    #[test]
    fn test_header_jar_collects_set_cookie_headers() {
        let policy = CookiePolicy::default();
        let jar = HeaderCookieJar::from_request_header(Some("session_token=old"));

        jar.set(policy.build("session_token", "new")).unwrap();
        jar.remove(policy.removal("student_code")).unwrap();

        assert_eq!(jar.get("session_token").as_deref(), Some("new"));
        let headers = jar.set_cookie_headers();
        assert_eq!(headers.len(), 2);
        assert!(headers[0].starts_with("session_token=new"));
        assert!(headers[1].starts_with("student_code="));
        assert!(headers[1].contains("Max-Age=0"));
    }
}
