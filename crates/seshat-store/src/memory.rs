//! In-process store backend.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use seshat_protocol::{Codec, JsonCodec, StoredSession, Token};
use tokio::sync::RwLock;

use crate::{Store, StoreError};

/// A [`Store`] that keeps encoded documents in a `HashMap`.
///
/// Documents go through the codec on every write and read, exactly like a
/// networked backend, so a record that would not survive a round trip
/// fails here too.
///
/// Cloning is cheap and every clone sees the same map. Tests keep one clone
/// to inspect the store while the service under test owns another.
///
/// Two knobs exist purely for failure testing:
/// [`set_available`](Self::set_available) makes every call fail as if the
/// backend were down, and [`put_raw`](Self::put_raw) writes arbitrary bytes.
pub struct MemoryStore<C: Codec = JsonCodec> {
    inner: Arc<Inner<C>>,
}

struct Inner<C> {
    docs: RwLock<HashMap<String, Vec<u8>>>,
    available: AtomicBool,
    codec: C,
}

// Manual Clone: derive would demand `C: Clone`.
impl<C: Codec> Clone for MemoryStore<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl MemoryStore<JsonCodec> {
    /// Creates an empty store using JSON documents.
    pub fn new() -> Self {
        Self::with_codec(JsonCodec)
    }
}

impl Default for MemoryStore<JsonCodec> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Codec> MemoryStore<C> {
    /// Creates an empty store using the given codec.
    pub fn with_codec(codec: C) -> Self {
        Self {
            inner: Arc::new(Inner {
                docs: RwLock::new(HashMap::new()),
                available: AtomicBool::new(true),
                codec,
            }),
        }
    }

    /// Simulates the backend going down (`false`) or coming back (`true`).
    pub fn set_available(&self, available: bool) {
        self.inner.available.store(available, Ordering::SeqCst);
    }

    /// Stores raw bytes under a token, bypassing the codec.
    pub async fn put_raw(&self, token: &Token, bytes: Vec<u8>) {
        self.inner
            .docs
            .write()
            .await
            .insert(token.as_str().to_owned(), bytes);
    }

    /// `true` if any document is stored under `token`.
    pub async fn contains(&self, token: &Token) -> bool {
        self.inner.docs.read().await.contains_key(token.as_str())
    }

    /// Number of stored documents.
    pub async fn len(&self) -> usize {
        self.inner.docs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.inner.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Unavailable("memory store switched off".into()))
        }
    }
}

impl<C: Codec> Store for MemoryStore<C> {
    async fn put(&self, token: &Token, session: &StoredSession) -> Result<(), StoreError> {
        self.check_available()?;
        let bytes = self.inner.codec.encode(session)?;
        self.inner
            .docs
            .write()
            .await
            .insert(token.as_str().to_owned(), bytes);
        Ok(())
    }

    async fn get(&self, token: &Token) -> Result<Option<StoredSession>, StoreError> {
        self.check_available()?;
        let docs = self.inner.docs.read().await;
        match docs.get(token.as_str()) {
            Some(bytes) => Ok(Some(self.inner.codec.decode(bytes)?)),
            None => Ok(None),
        }
    }

    async fn delete(&self, token: &Token) -> Result<(), StoreError> {
        self.check_available()?;
        self.inner.docs.write().await.remove(token.as_str());
        Ok(())
    }
}
