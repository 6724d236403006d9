//! Data-plane gateway transport
//!
//! Every live read goes through a gateway that forwards raw Kubernetes API
//! requests to the cluster behind a data plane. The tree builder only sees
//! `ProxyClient`, so tests swap in fakes and the HTTP client stays in `client.rs`.

mod client;

pub use client::{GatewayClient, GatewaySettings};

use crate::models::PlaneCoordinates;
use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use futures::stream::BoxStream;

/// Streaming response body
pub type BodyStream = BoxStream<'static, Result<Bytes>>;

/// A Kubernetes API request relayed by the gateway
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyRequest {
    /// API path relative to the cluster root, without a leading `/`
    pub path: String,
    /// Query parameters, encoded by the transport
    pub query: Vec<(String, String)>,
}

impl ProxyRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            query: Vec::new(),
        }
    }

    pub fn with_query(mut self, key: &str, value: impl Into<String>) -> Self {
        self.query.push((key.to_string(), value.into()));
        self
    }
}

/// Status and unread body of a relayed response
pub struct ProxyResponse {
    pub status: u16,
    pub body: BodyStream,
}

impl ProxyResponse {
    /// Response whose body arrives in the given chunks
    pub fn from_chunks(status: u16, chunks: Vec<Bytes>) -> Self {
        Self {
            status,
            body: futures::stream::iter(chunks.into_iter().map(Ok)).boxed(),
        }
    }

    pub fn from_bytes(status: u16, body: impl Into<Bytes>) -> Self {
        Self::from_chunks(status, vec![body.into()])
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

impl std::fmt::Debug for ProxyResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyResponse")
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

/// Opaque request/response channel to a data-plane cluster
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProxyClient: Send + Sync {
    async fn proxy(&self, plane: &PlaneCoordinates, request: &ProxyRequest)
    -> Result<ProxyResponse>;
}
