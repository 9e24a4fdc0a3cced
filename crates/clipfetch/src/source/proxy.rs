use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::{FetchContext, RetrievalOutcome, Retrieved, Source, SourceTag, ensure_video, send};
use crate::config::FetchConfig;
use crate::error::SourceError;

/// Correlation header carrying the request hash.
pub const REQUEST_ID_HEADER: &str = "X-Request-ID";

/// Proxy that fetches the clean asset on our behalf.
pub struct ProxyMirror {
    client: Client,
    config: FetchConfig,
}

impl ProxyMirror {
    pub fn new(client: Client, config: &FetchConfig) -> Self {
        Self {
            client,
            config: config.clone(),
        }
    }
}

#[async_trait]
impl Source for ProxyMirror {
    fn tag(&self) -> SourceTag {
        SourceTag::ProxyMirror
    }

    async fn retrieve(&self, ctx: &FetchContext) -> RetrievalOutcome {
        let Some(url) = self.config.proxy_url(&ctx.id) else {
            return Err(SourceError::NotConfigured {
                source_tag: self.tag(),
            });
        };
        debug!(url = %url, hash = %ctx.hash, "requesting proxy mirror");

        let request = self
            .client
            .get(&url)
            .header(REQUEST_ID_HEADER, ctx.hash.as_str());
        let response = send(request, &url, self.config.http_timeout).await?;
        ensure_video(&response, &url)?;
        Ok(Retrieved::from_response(response, false))
    }
}
