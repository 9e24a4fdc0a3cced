use futures::{StreamExt, future, stream};
use reqwest::Client;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::config::FetchConfig;
use crate::source::{
    FallbackCdn, FetchContext, OfficialApi, PrimaryMirror, ProxyMirror, Retrieved, Source,
    SourceTag,
};

/// The winning source and its open stream.
#[derive(Debug)]
pub struct Resolved {
    pub source: SourceTag,
    pub retrieved: Retrieved,
}

/// Tries sources one at a time, in order, and stops at the first success.
pub struct SourceResolver {
    sources: Vec<Box<dyn Source>>,
}

impl SourceResolver {
    /// Primary mirror, proxy mirror, official API, fallback CDN.
    pub fn from_config(client: Client, config: &FetchConfig) -> Self {
        Self::with_sources(vec![
            Box::new(PrimaryMirror::new(client.clone(), config)),
            Box::new(ProxyMirror::new(client.clone(), config)),
            Box::new(OfficialApi::new(client.clone(), config)),
            Box::new(FallbackCdn::new(client, config)),
        ])
    }

    pub fn with_sources(sources: Vec<Box<dyn Source>>) -> Self {
        Self { sources }
    }

    /// Order in which sources are attempted.
    pub fn order(&self) -> Vec<SourceTag> {
        self.sources.iter().map(|s| s.tag()).collect()
    }

    /// `None` once every source has reported the asset unavailable.
    pub async fn resolve(&self, ctx: &FetchContext) -> Option<Resolved> {
        let attempts = stream::iter(&self.sources)
            .then(|source| attempt(source.as_ref(), ctx))
            .filter_map(future::ready);
        let mut attempts = std::pin::pin!(attempts);
        attempts.next().await
    }
}

async fn attempt(source: &dyn Source, ctx: &FetchContext) -> Option<Resolved> {
    let tag = source.tag();
    let start = Instant::now();
    match source.retrieve(ctx).await {
        Ok(retrieved) => {
            info!(
                id = %ctx.id,
                source = %tag,
                needs_processing = retrieved.needs_processing,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "source supplied asset"
            );
            Some(Resolved {
                source: tag,
                retrieved,
            })
        }
        Err(e) if e.is_skip() => {
            debug!(id = %ctx.id, source = %tag, reason = %e, "source skipped");
            None
        }
        Err(e) => {
            warn!(
                id = %ctx.id,
                source = %tag,
                error = %e,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "source unavailable, trying next"
            );
            None
        }
    }
}
