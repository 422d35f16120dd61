//! HTTP document-service backend using `reqwest`.
//!
//! Documents live at `{base_url}/{collection}/{token}`:
//!
//! | Operation | Request | Success |
//! |-----------|---------|---------|
//! | put | `PUT` with a JSON body | any 2xx |
//! | get | `GET` | 200 with a JSON body, or 404 for "absent" |
//! | delete | `DELETE` | any 2xx, or 404 (already gone) |

use std::time::Duration;

use reqwest::StatusCode;
use seshat_protocol::{Codec, JsonCodec, StoredSession, Token};
use url::Url;

use crate::{Store, StoreError};

/// Settings for [`RemoteStore`].
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    /// Base URL of the document service, e.g. `https://kv.internal/v1`.
    pub base_url: String,

    /// Collection (path segment) that holds session documents.
    pub collection: String,

    /// Sent as `Authorization: Bearer <key>` when present.
    pub api_key: Option<String>,

    /// Per-request deadline enforced by the HTTP client.
    pub timeout: Duration,
}

impl RemoteConfig {
    /// Settings for `base_url` with the default collection and timeout.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            collection: "sessions".into(),
            api_key: None,
            timeout: Duration::from_secs(10),
        }
    }
}

/// A [`Store`] backed by a document service over HTTP.
///
/// Cloning shares the underlying connection pool.
#[derive(Clone)]
pub struct RemoteStore {
    client: reqwest::Client,
    collection_url: Url,
    api_key: Option<String>,
    timeout: Duration,
}

impl RemoteStore {
    /// Builds the HTTP client. No request is made until the first call.
    ///
    /// # Errors
    /// Returns [`StoreError::InvalidConfig`] if the base URL does not parse
    /// or the collection name is blank.
    pub fn new(config: RemoteConfig) -> Result<Self, StoreError> {
        let collection = config.collection.trim().trim_matches('/');
        if collection.is_empty() {
            return Err(StoreError::InvalidConfig(
                "store collection must not be blank".into(),
            ));
        }
        let base = config.base_url.trim().trim_end_matches('/');
        let collection_url = Url::parse(&format!("{base}/{collection}/"))
            .map_err(|e| StoreError::InvalidConfig(format!("store base url: {e}")))?;

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| StoreError::InvalidConfig(format!("http client: {e}")))?;

        tracing::debug!(url = %collection_url, "remote session store configured");

        Ok(Self {
            client,
            collection_url,
            api_key: config.api_key,
            timeout: config.timeout,
        })
    }

    fn document_url(&self, token: &Token) -> Result<Url, StoreError> {
        // Tokens are URL-safe base64, so joining never needs escaping.
        self.collection_url
            .join(token.as_str())
            .map_err(|e| StoreError::InvalidConfig(format!("document url: {e}")))
    }

    fn request(&self, method: reqwest::Method, url: Url) -> reqwest::RequestBuilder {
        let builder = self.client.request(method, url);
        match &self.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }

    fn transport_error(&self, e: reqwest::Error) -> StoreError {
        if e.is_timeout() {
            StoreError::Timeout(self.timeout)
        } else {
            StoreError::Unavailable(e.to_string())
        }
    }
}

/// Maps a non-success status to a store error.
fn status_error(status: StatusCode) -> StoreError {
    if status.is_server_error() {
        StoreError::Unavailable(format!("backend returned {status}"))
    } else {
        StoreError::Rejected {
            status: status.as_u16(),
        }
    }
}

impl Store for RemoteStore {
    async fn put(&self, token: &Token, session: &StoredSession) -> Result<(), StoreError> {
        let body = JsonCodec.encode(session)?;
        let response = self
            .request(reqwest::Method::PUT, self.document_url(token)?)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(status_error(status))
        }
    }

    async fn get(&self, token: &Token) -> Result<Option<StoredSession>, StoreError> {
        let response = self
            .request(reqwest::Method::GET, self.document_url(token)?)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(status_error(status));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| self.transport_error(e))?;
        Ok(Some(JsonCodec.decode(&bytes)?))
    }

    async fn delete(&self, token: &Token) -> Result<(), StoreError> {
        let response = self
            .request(reqwest::Method::DELETE, self.document_url(token)?)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if status.is_success() || status == StatusCode::NOT_FOUND {
            Ok(())
        } else {
            Err(status_error(status))
        }
    }
}
