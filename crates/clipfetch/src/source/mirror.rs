use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::{FetchContext, RetrievalOutcome, Retrieved, Source, SourceTag, ensure_video, send};
use crate::config::FetchConfig;
use crate::error::SourceError;

/// Clean copies served as `<base><id>.mp4`.
pub struct PrimaryMirror {
    client: Client,
    config: FetchConfig,
}

impl PrimaryMirror {
    pub fn new(client: Client, config: &FetchConfig) -> Self {
        Self {
            client,
            config: config.clone(),
        }
    }
}

#[async_trait]
impl Source for PrimaryMirror {
    fn tag(&self) -> SourceTag {
        SourceTag::PrimaryMirror
    }

    async fn retrieve(&self, ctx: &FetchContext) -> RetrievalOutcome {
        let Some(url) = self.config.primary_mirror_url(&ctx.id) else {
            return Err(SourceError::NotConfigured {
                source_tag: self.tag(),
            });
        };
        debug!(url = %url, "requesting primary mirror");

        let response = send(self.client.get(&url), &url, self.config.http_timeout).await?;
        ensure_video(&response, &url)?;
        Ok(Retrieved::from_response(response, false))
    }
}
