//! Request handler: id extraction, source resolution, persistence, optional
//! watermark removal and result assembly.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{Span, debug, info, instrument};

use crate::client::build_client;
use crate::config::FetchConfig;
use crate::content_id::ContentId;
use crate::delogo::WatermarkRemover;
use crate::error::FetchError;
use crate::hash::RequestHash;
use crate::persist::persist_stream;
use crate::resolver::{Resolved, SourceResolver};
use crate::result::{DownloadResult, size_label};
use crate::source::{FetchContext, Retrieved, SourceTag};
use crate::temp::TempFile;

/// What a caller submits. Token and cookies override the configured ones.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DownloadRequest {
    pub url: String,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub cookies: Option<String>,
}

impl DownloadRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }
}

/// Result of [`Pipeline::fetch_to`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedDownload {
    pub path: PathBuf,
    pub filename: String,
    pub size_label: String,
    pub source: SourceTag,
    pub watermark_removed: bool,
}

/// The final temp file of a request, before it is encoded or moved.
struct Finished {
    id: ContentId,
    file: TempFile,
    source: SourceTag,
    watermark_removed: bool,
}

pub struct Pipeline {
    config: FetchConfig,
    resolver: SourceResolver,
    remover: WatermarkRemover,
}

impl Pipeline {
    pub fn new(config: FetchConfig) -> Result<Self, FetchError> {
        config.validate()?;
        let client = build_client(&config)?;
        Ok(Self::with_client(config, client))
    }

    pub fn with_client(config: FetchConfig, client: Client) -> Self {
        let resolver = SourceResolver::from_config(client, &config);
        let remover = WatermarkRemover::from_config(&config);
        Self::with_parts(config, resolver, remover)
    }

    pub fn with_parts(
        config: FetchConfig,
        resolver: SourceResolver,
        remover: WatermarkRemover,
    ) -> Self {
        debug!(order = ?resolver.order(), "source chain ready");
        Self {
            config,
            resolver,
            remover,
        }
    }

    /// Run the whole chain and return the asset in memory.
    pub async fn fetch(&self, request: &DownloadRequest) -> Result<DownloadResult, FetchError> {
        let finished = self.run(request).await?;
        DownloadResult::assemble(
            finished.file,
            &finished.id,
            finished.source,
            finished.watermark_removed,
        )
        .await
    }

    /// Run the whole chain and move the asset to `dest` instead of loading it.
    pub async fn fetch_to(
        &self,
        request: &DownloadRequest,
        dest: &Path,
    ) -> Result<SavedDownload, FetchError> {
        let finished = self.run(request).await?;
        let bytes = tokio::fs::metadata(finished.file.path()).await?.len();
        finished.file.persist(dest).await?;
        info!(path = %dest.display(), "saved download");

        Ok(SavedDownload {
            path: dest.to_path_buf(),
            filename: finished.id.filename(),
            size_label: size_label(bytes),
            source: finished.source,
            watermark_removed: finished.watermark_removed,
        })
    }

    #[instrument(skip_all, fields(id, hash))]
    async fn run(&self, request: &DownloadRequest) -> Result<Finished, FetchError> {
        let id = ContentId::parse(&request.url)?;
        let hash = RequestHash::generate(&id);
        Span::current()
            .record("id", id.as_str())
            .record("hash", hash.as_str());

        let ctx = FetchContext {
            id,
            hash,
            bearer_token: pick(&request.token, &self.config.bearer_token),
            cookies: pick(&request.cookies, &self.config.cookies),
        };

        let Some(Resolved { source, retrieved }) = self.resolver.resolve(&ctx).await else {
            return Err(FetchError::source_unavailable(ctx.id.as_str()));
        };
        let Retrieved {
            stream,
            needs_processing,
        } = retrieved;

        let mut input = TempFile::input(&self.config.temp_dir, &ctx.hash);
        persist_stream(stream, &mut input).await?;

        let (file, watermark_removed) = if needs_processing {
            let output = TempFile::output(&self.config.temp_dir, &ctx.hash);
            (self.remover.remove(input, output).await?, true)
        } else {
            (input, false)
        };

        Ok(Finished {
            id: ctx.id,
            file,
            source,
            watermark_removed,
        })
    }
}

fn pick(preferred: &Option<String>, fallback: &Option<String>) -> Option<String> {
    preferred
        .as_ref()
        .filter(|v| !v.is_empty())
        .or(fallback.as_ref())
        .cloned()
}
