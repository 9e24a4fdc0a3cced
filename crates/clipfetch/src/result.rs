use base64::{Engine, engine::general_purpose::STANDARD};
use serde::Serialize;
use tracing::debug;

use crate::content_id::ContentId;
use crate::error::FetchError;
use crate::source::SourceTag;
use crate::temp::TempFile;

pub const QUALITY: &str = "HD";

/// The finished asset, base64-encoded, plus what produced it.
#[derive(Debug, Clone)]
pub struct DownloadResult {
    /// Base64 of the mp4 bytes.
    pub payload: String,
    pub size_label: String,
    pub filename: String,
    pub source: SourceTag,
    pub quality: &'static str,
    pub watermark_removed: bool,
}

/// Wire shape handed to HTTP front-ends.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadResponse {
    pub clean_url: String,
    pub size: String,
    pub filename: String,
    pub source: SourceTag,
    pub quality: &'static str,
    pub delogo_applied: bool,
}

impl DownloadResult {
    /// Load `file` into memory, encode it, and delete it.
    pub async fn assemble(
        file: TempFile,
        id: &ContentId,
        source: SourceTag,
        watermark_removed: bool,
    ) -> Result<Self, FetchError> {
        let bytes = tokio::fs::read(file.path()).await?;
        file.delete().await?;
        debug!(id = %id, bytes = bytes.len(), "assembling result");

        Ok(Self {
            payload: STANDARD.encode(&bytes),
            size_label: size_label(bytes.len() as u64),
            filename: id.filename(),
            source,
            quality: QUALITY,
            watermark_removed,
        })
    }

    pub fn clean_url(&self) -> String {
        format!("data:video/mp4;base64,{}", self.payload)
    }

    /// Decode the payload back into mp4 bytes.
    pub fn bytes(&self) -> Result<Vec<u8>, FetchError> {
        STANDARD
            .decode(&self.payload)
            .map_err(|e| FetchError::internal(format!("corrupt payload: {e}")))
    }

    pub fn to_response(&self) -> DownloadResponse {
        DownloadResponse {
            clean_url: self.clean_url(),
            size: self.size_label.clone(),
            filename: self.filename.clone(),
            source: self.source,
            quality: self.quality,
            delogo_applied: self.watermark_removed,
        }
    }
}

/// Size in MiB with one decimal, e.g. `2.0 MB`.
pub fn size_label(bytes: u64) -> String {
    format!("{:.1} MB", bytes as f64 / 1024.0 / 1024.0)
}
