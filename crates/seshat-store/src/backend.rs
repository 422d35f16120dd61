//! Explicit backend selection.
//!
//! Which store a deployment uses is a configuration value, decided once at
//! startup. Nothing probes for a backend at runtime.

use seshat_protocol::{StoredSession, Token};

use crate::{MemoryStore, Store, StoreError};
#[cfg(feature = "remote")]
use crate::{RemoteConfig, RemoteStore};

/// The backend a deployment asked for.
#[derive(Debug, Clone, Default)]
pub enum StoreBackend {
    /// In-process map. Sessions die with the process.
    #[default]
    Memory,

    /// HTTP document service.
    #[cfg(feature = "remote")]
    Remote(RemoteConfig),
}

/// A store built from a [`StoreBackend`].
///
/// `Store` uses `impl Future` returns, so it can't be a trait object; this
/// enum does the dispatch instead.
#[derive(Clone)]
pub enum AnyStore {
    Memory(MemoryStore),
    #[cfg(feature = "remote")]
    Remote(RemoteStore),
}

impl AnyStore {
    /// Builds the configured backend.
    ///
    /// # Errors
    /// Returns [`StoreError::InvalidConfig`] if the remote settings are bad.
    pub fn from_backend(backend: StoreBackend) -> Result<Self, StoreError> {
        match backend {
            StoreBackend::Memory => {
                tracing::info!("using in-memory session store");
                Ok(Self::Memory(MemoryStore::new()))
            }
            #[cfg(feature = "remote")]
            StoreBackend::Remote(config) => {
                tracing::info!(base_url = %config.base_url, "using remote session store");
                Ok(Self::Remote(RemoteStore::new(config)?))
            }
        }
    }

    /// Short backend name for logs and health output.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Memory(_) => "memory",
            #[cfg(feature = "remote")]
            Self::Remote(_) => "remote",
        }
    }
}

impl Store for AnyStore {
    async fn put(&self, token: &Token, session: &StoredSession) -> Result<(), StoreError> {
        match self {
            Self::Memory(store) => store.put(token, session).await,
            #[cfg(feature = "remote")]
            Self::Remote(store) => store.put(token, session).await,
        }
    }

    async fn get(&self, token: &Token) -> Result<Option<StoredSession>, StoreError> {
        match self {
            Self::Memory(store) => store.get(token).await,
            #[cfg(feature = "remote")]
            Self::Remote(store) => store.get(token).await,
        }
    }

    async fn delete(&self, token: &Token) -> Result<(), StoreError> {
        match self {
            Self::Memory(store) => store.delete(token).await,
            #[cfg(feature = "remote")]
            Self::Remote(store) => store.delete(token).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_backend_is_memory() {
        let store = AnyStore::from_backend(StoreBackend::default()).unwrap();
        assert_eq!(store.kind(), "memory");
    }

    #[cfg(feature = "remote")]
    #[test]
    fn test_remote_backend_with_bad_url_is_config_error() {
        let result = AnyStore::from_backend(StoreBackend::Remote(RemoteConfig::new("::")));
        assert!(matches!(result, Err(StoreError::InvalidConfig(_))));
    }
}
