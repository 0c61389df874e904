//! Object store reached over HTTP with path-style `PUT` requests.

use crate::{ArchiveResult, ObjectStore, StoreError};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Connection settings for [`HttpObjectStore`].
#[derive(Debug, Clone)]
pub struct HttpStoreConfig {
    pub endpoint: Url,
    pub bucket: String,
    pub timeout: Duration,
    pub auth_token: Option<String>,
}

/// Writes objects with `PUT {endpoint}/{bucket}/{key}`.
pub struct HttpObjectStore {
    config: HttpStoreConfig,
    client: Client,
}

impl HttpObjectStore {
    pub fn new(config: HttpStoreConfig) -> ArchiveResult<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, client })
    }

    pub fn bucket(&self) -> &str {
        &self.config.bucket
    }

    /// Path-style URL for `key`; each key segment is percent-encoded.
    pub fn object_url(&self, key: &str) -> Result<Url, StoreError> {
        object_url(&self.config.endpoint, &self.config.bucket, key)
    }
}

fn object_url(endpoint: &Url, bucket: &str, key: &str) -> Result<Url, StoreError> {
    let mut url = endpoint.clone();
    {
        let mut segments = url
            .path_segments_mut()
            .map_err(|_| StoreError::InvalidUrl(endpoint.to_string()))?;
        segments.pop_if_empty();
        segments.push(bucket);
        segments.extend(key.split('/').filter(|s| !s.is_empty()));
    }
    Ok(url)
}

#[async_trait]
impl ObjectStore for HttpObjectStore {
    async fn put_object(
        &self,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StoreError> {
        let url = self.object_url(key)?;
        debug!(url = %url, bytes = body.len(), "PutObject");

        let mut request = self
            .client
            .put(url)
            .header("Content-Type", content_type)
            .body(body);
        if let Some(token) = &self.config.auth_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let message = response.text().await.unwrap_or_default();
        Err(StoreError::Rejected {
            status: status.as_u16(),
            message: message.chars().take(256).collect(),
        })
    }
}
