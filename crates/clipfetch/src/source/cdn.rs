use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::{FetchContext, RetrievalOutcome, Retrieved, Source, SourceTag, ensure_ok, send};
use crate::config::FetchConfig;
use crate::error::SourceError;

/// Last resort. Unlike the mirrors only the status is checked; the CDN's
/// content type is not trusted either way.
///
/// The whole transfer, body included, must finish within `cdn_timeout`.
pub struct FallbackCdn {
    client: Client,
    config: FetchConfig,
}

impl FallbackCdn {
    pub fn new(client: Client, config: &FetchConfig) -> Self {
        Self {
            client,
            config: config.clone(),
        }
    }
}

#[async_trait]
impl Source for FallbackCdn {
    fn tag(&self) -> SourceTag {
        SourceTag::FallbackCdn
    }

    async fn retrieve(&self, ctx: &FetchContext) -> RetrievalOutcome {
        let Some(url) = self.config.cdn_url(&ctx.id) else {
            return Err(SourceError::NotConfigured {
                source_tag: self.tag(),
            });
        };
        debug!(url = %url, "requesting fallback cdn");

        let budget = self.config.cdn_timeout;
        let response = send(self.client.get(&url).timeout(budget), &url, budget).await?;
        ensure_ok(&response, &url)?;
        Ok(Retrieved::from_response(response, false))
    }
}
