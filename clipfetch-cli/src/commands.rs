use crate::{
    cli::OutputFormat,
    error::{CliError, Result},
    output::{BatchEntry, BatchOutcome, OutputManager, failed_count, write_output},
};
use clipfetch::{ContentId, DownloadRequest, Pipeline};
use futures::{StreamExt, stream};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub struct CommandExecutor {
    pipeline: Pipeline,
    output_manager: OutputManager,
    batch_concurrency: usize,
}

impl CommandExecutor {
    pub fn new(pipeline: Pipeline, batch_concurrency: usize, colored: bool) -> Self {
        Self {
            pipeline,
            output_manager: OutputManager::new(colored),
            batch_concurrency,
        }
    }

    pub async fn fetch(
        &self,
        url: &str,
        token: Option<String>,
        cookies: Option<String>,
        save: Option<&Path>,
        format: OutputFormat,
    ) -> Result<()> {
        let request = DownloadRequest {
            url: url.to_owned(),
            token,
            cookies,
        };

        let content = match save {
            Some(dest) => {
                let saved = self.pipeline.fetch_to(&request, dest).await?;
                self.output_manager.format_saved(&saved, format)?
            }
            None => {
                let result = self.pipeline.fetch(&request).await?;
                self.output_manager.format_download(&result, format)?
            }
        };
        write_output(&content)
    }

    /// Download every non-empty, non-comment line of `input` into `output_dir`.
    /// Lines naming an id already listed are dropped. Individual failures are
    /// reported, not fatal.
    pub async fn batch(
        &self,
        input: &Path,
        output_dir: &Path,
        max_concurrent: Option<usize>,
        format: OutputFormat,
    ) -> Result<()> {
        let content = tokio::fs::read_to_string(input).await?;
        let mut seen = HashSet::new();
        let lines: Vec<String> = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .filter(|line| {
                let key = ContentId::extract(line)
                    .map(|id| id.to_string())
                    .unwrap_or_else(|| (*line).to_owned());
                seen.insert(key)
            })
            .map(str::to_owned)
            .collect();
        if lines.is_empty() {
            warn!(path = %input.display(), "batch file has no entries");
        }

        tokio::fs::create_dir_all(output_dir).await?;
        let concurrency = max_concurrent.unwrap_or(self.batch_concurrency).max(1);
        info!(entries = lines.len(), concurrency, "starting batch");

        let mut entries: Vec<(usize, BatchEntry)> = stream::iter(lines.into_iter().enumerate())
            .map(|(index, line)| async move {
                let outcome = self.batch_one(&line, output_dir).await;
                (index, BatchEntry { input: line, outcome })
            })
            .buffer_unordered(concurrency)
            .collect()
            .await;
        entries.sort_by_key(|(index, _)| *index);
        let entries: Vec<BatchEntry> = entries.into_iter().map(|(_, entry)| entry).collect();

        write_output(&self.output_manager.format_batch(&entries, format)?)?;

        let failed = failed_count(&entries);
        if failed > 0 {
            return Err(CliError::BatchFailed {
                failed,
                total: entries.len(),
            });
        }
        Ok(())
    }

    async fn batch_one(&self, line: &str, output_dir: &Path) -> BatchOutcome {
        let saved = match ContentId::parse(line) {
            Ok(id) => {
                let dest: PathBuf = output_dir.join(id.filename());
                self.pipeline
                    .fetch_to(&DownloadRequest::new(line), &dest)
                    .await
            }
            Err(e) => Err(e),
        };
        match saved {
            Ok(saved) => BatchOutcome::Ok(saved),
            Err(e) => {
                warn!(input = line, error = %e, "batch entry failed");
                BatchOutcome::Error {
                    kind: e.kind(),
                    message: e.to_string(),
                }
            }
        }
    }
}
