//! Live resource fetching
//!
//! Reads raw Kubernetes objects from a data plane through the gateway proxy.
//! Every body read is capped; a response larger than the cap is an error and
//! is never parsed in truncated form.

use crate::gateway::{BodyStream, ProxyClient, ProxyRequest};
use crate::models::PlaneCoordinates;
use futures::StreamExt;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

/// Default cap on a single response body (10 MiB)
pub const DEFAULT_MAX_RESPONSE_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("proxy request for {path} failed: {source}")]
    Proxy {
        path: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("unexpected status {status} for {path}")]
    Status { path: String, status: u16 },

    #[error("response for {path} exceeds {limit} bytes")]
    BodyTooLarge { path: String, limit: usize },

    #[error("failed to read response for {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to decode response for {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("response for {path} is not a JSON object")]
    NotAnObject { path: String },
}

impl FetchError {
    /// A 4xx answer other than 429: the request will not succeed if repeated
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            FetchError::Status { status, .. } if (400..500).contains(status) && *status != 429
        )
    }
}

/// Size-capped GET/LIST over a `ProxyClient`
#[derive(Clone)]
pub struct LiveFetcher {
    proxy: Arc<dyn ProxyClient>,
    max_response_bytes: usize,
}

impl LiveFetcher {
    pub fn new(proxy: Arc<dyn ProxyClient>) -> Self {
        Self::with_limit(proxy, DEFAULT_MAX_RESPONSE_BYTES)
    }

    pub fn with_limit(proxy: Arc<dyn ProxyClient>, max_response_bytes: usize) -> Self {
        Self {
            proxy,
            max_response_bytes,
        }
    }

    pub fn max_response_bytes(&self) -> usize {
        self.max_response_bytes
    }

    /// Fetch a single object
    pub async fn get(&self, plane: &PlaneCoordinates, path: &str) -> Result<Value, FetchError> {
        let value = self.fetch_json(plane, &ProxyRequest::get(path)).await?;
        if !value.is_object() {
            return Err(FetchError::NotAnObject {
                path: path.to_string(),
            });
        }
        Ok(value)
    }

    /// Fetch a collection and return its object items
    ///
    /// A body without `items` yields an empty list. Entries that are not JSON
    /// objects are skipped.
    pub async fn list(
        &self,
        plane: &PlaneCoordinates,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<Value>, FetchError> {
        let mut request = ProxyRequest::get(path);
        for (key, value) in query {
            request = request.with_query(key, *value);
        }

        let value = self.fetch_json(plane, &request).await?;
        let items = match value {
            Value::Object(mut map) => match map.remove("items") {
                Some(Value::Array(items)) => items,
                _ => Vec::new(),
            },
            _ => {
                return Err(FetchError::NotAnObject {
                    path: path.to_string(),
                });
            }
        };

        Ok(items.into_iter().filter(|item| item.is_object()).collect())
    }

    /// Fetch a plain-text body, such as container logs
    ///
    /// Invalid UTF-8 sequences are replaced rather than rejected.
    pub async fn get_text(
        &self,
        plane: &PlaneCoordinates,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<String, FetchError> {
        let mut request = ProxyRequest::get(path);
        for (key, value) in query {
            request = request.with_query(key, *value);
        }
        let body = self.fetch_bytes(plane, &request).await?;
        Ok(String::from_utf8_lossy(&body).into_owned())
    }

    async fn fetch_json(
        &self,
        plane: &PlaneCoordinates,
        request: &ProxyRequest,
    ) -> Result<Value, FetchError> {
        let body = self.fetch_bytes(plane, request).await?;
        serde_json::from_slice(&body).map_err(|source| FetchError::Decode {
            path: request.path.clone(),
            source,
        })
    }

    async fn fetch_bytes(
        &self,
        plane: &PlaneCoordinates,
        request: &ProxyRequest,
    ) -> Result<Vec<u8>, FetchError> {
        let path = request.path.as_str();
        let resp = self
            .proxy
            .proxy(plane, request)
            .await
            .map_err(|source| FetchError::Proxy {
                path: path.to_string(),
                source,
            })?;

        if !resp.is_success() {
            return Err(FetchError::Status {
                path: path.to_string(),
                status: resp.status,
            });
        }

        read_capped(resp.body, self.max_response_bytes, path).await
    }
}

/// Drain a body stream, failing as soon as it grows past `limit` bytes
pub async fn read_capped(
    mut body: BodyStream,
    limit: usize,
    path: &str,
) -> Result<Vec<u8>, FetchError> {
    let mut buf = Vec::new();
    while let Some(chunk) = body.next().await {
        let chunk = chunk.map_err(|source| FetchError::Read {
            path: path.to_string(),
            source,
        })?;
        if buf.len() + chunk.len() > limit {
            return Err(FetchError::BodyTooLarge {
                path: path.to_string(),
                limit,
            });
        }
        buf.extend_from_slice(&chunk);
    }
    Ok(buf)
}
