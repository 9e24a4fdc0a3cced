//! Upstream sources, one per module, tried by the resolver in a fixed order.

mod api;
mod cdn;
mod mirror;
pub mod models;
mod proxy;

pub use api::OfficialApi;
pub use cdn::FallbackCdn;
pub use mirror::PrimaryMirror;
pub use proxy::ProxyMirror;

use async_trait::async_trait;
use bytes::Bytes;
use futures::{StreamExt, stream::BoxStream};
use reqwest::{RequestBuilder, Response, StatusCode, header::CONTENT_TYPE};
use serde::Serialize;
use std::fmt;
use std::time::Duration;

use crate::content_id::ContentId;
use crate::error::SourceError;
use crate::hash::RequestHash;

/// Raw asset bytes as they arrive from the network.
pub type ByteStream = BoxStream<'static, std::io::Result<Bytes>>;

/// Result of asking one source for the asset. `Err` means unavailable.
pub type RetrievalOutcome = Result<Retrieved, SourceError>;

/// Which source supplied the asset.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum::Display, strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SourceTag {
    PrimaryMirror,
    ProxyMirror,
    OfficialApi,
    FallbackCdn,
}

/// An open, unread asset stream.
pub struct Retrieved {
    pub stream: ByteStream,
    /// The asset still carries the visible watermark.
    pub needs_processing: bool,
}

impl Retrieved {
    pub fn new(stream: ByteStream, needs_processing: bool) -> Self {
        Self {
            stream,
            needs_processing,
        }
    }

    pub(crate) fn from_response(response: Response, needs_processing: bool) -> Self {
        let stream = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(std::io::Error::other))
            .boxed();
        Self::new(stream, needs_processing)
    }
}

impl fmt::Debug for Retrieved {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Retrieved")
            .field("needs_processing", &self.needs_processing)
            .finish_non_exhaustive()
    }
}

/// Per-request inputs shared by all sources.
#[derive(Debug, Clone)]
pub struct FetchContext {
    pub id: ContentId,
    pub hash: RequestHash,
    pub bearer_token: Option<String>,
    pub cookies: Option<String>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Source: Send + Sync {
    fn tag(&self) -> SourceTag;

    /// Make exactly one attempt at opening the asset.
    async fn retrieve(&self, ctx: &FetchContext) -> RetrievalOutcome;
}

/// Send `request`, reporting a timeout against `budget`.
///
/// The budget itself is enforced by reqwest: the client's read timeout, or a
/// per-request timeout set by the caller.
pub(crate) async fn send(
    request: RequestBuilder,
    url: &str,
    budget: Duration,
) -> Result<Response, SourceError> {
    request
        .send()
        .await
        .map_err(|e| SourceError::transport(e, url, budget))
}

pub(crate) fn ensure_ok(response: &Response, url: &str) -> Result<(), SourceError> {
    if response.status() == StatusCode::OK {
        Ok(())
    } else {
        Err(SourceError::http_status(response.status(), url))
    }
}

/// Status 200 and a `video/*` content type.
pub(crate) fn ensure_video(response: &Response, url: &str) -> Result<(), SourceError> {
    ensure_ok(response, url)?;
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if content_type.to_ascii_lowercase().contains("video") {
        Ok(())
    } else {
        Err(SourceError::UnexpectedContentType {
            content_type: content_type.to_owned(),
            url: url.to_owned(),
        })
    }
}
