use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

use crate::content_id::{ContentId, DEFAULT_PAGE_BASE};
use crate::error::FetchError;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/142.0.0.0 Safari/537.36";
pub const DEFAULT_API_ENDPOINT: &str = "https://sora.chatgpt.com/backend/project_y/post/{id}";

const ID_PLACEHOLDER: &str = "{id}";

/// Everything the fetch pipeline needs to know about its environment.
///
/// Source endpoints left empty disable that source.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Base of the primary mirror; `<id>.mp4` is appended.
    pub primary_mirror_base: String,
    /// Proxy endpoint, `{id}` is substituted.
    pub proxy_endpoint: String,
    /// Post-details API endpoint, `{id}` is substituted.
    pub api_endpoint: String,
    /// Base of the public clip pages, used for Referer and Origin.
    pub page_base: String,
    /// Base of the fallback CDN; `<id>.mp4` is appended.
    pub cdn_base: String,

    /// Bearer token for the API source. Without it that source is skipped.
    pub bearer_token: Option<String>,
    /// Raw `Cookie` header sent to the API source.
    pub cookies: Option<String>,
    pub user_agent: String,

    /// Time budget for each source request, in seconds.
    #[serde(with = "duration_secs")]
    pub http_timeout: Duration,
    /// Time budget for the fallback CDN, in seconds.
    #[serde(with = "duration_secs")]
    pub cdn_timeout: Duration,

    pub ffmpeg_path: String,
    /// Wall-clock limit for watermark removal, in seconds.
    #[serde(with = "duration_secs")]
    pub ffmpeg_timeout: Duration,

    /// Directory receiving per-request temporary files.
    pub temp_dir: PathBuf,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            primary_mirror_base: String::new(),
            proxy_endpoint: String::new(),
            api_endpoint: DEFAULT_API_ENDPOINT.to_owned(),
            page_base: DEFAULT_PAGE_BASE.to_owned(),
            cdn_base: String::new(),
            bearer_token: None,
            cookies: None,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            http_timeout: Duration::from_secs(30),
            cdn_timeout: Duration::from_secs(15),
            ffmpeg_path: "ffmpeg".to_owned(),
            ffmpeg_timeout: Duration::from_secs(300),
            temp_dir: std::env::temp_dir(),
        }
    }
}

impl FetchConfig {
    /// Check endpoints parse as URLs and every timeout is non-zero.
    pub fn validate(&self) -> Result<(), FetchError> {
        let endpoints = [
            ("primary_mirror_base", &self.primary_mirror_base),
            ("proxy_endpoint", &self.proxy_endpoint),
            ("api_endpoint", &self.api_endpoint),
            ("page_base", &self.page_base),
            ("cdn_base", &self.cdn_base),
        ];
        for (name, value) in endpoints {
            if value.is_empty() {
                continue;
            }
            Url::parse(&value.replace(ID_PLACEHOLDER, "s_00000000")).map_err(|e| {
                FetchError::internal(format!("invalid {name} `{value}`: {e}"))
            })?;
        }

        let timeouts = [
            ("http_timeout", self.http_timeout),
            ("cdn_timeout", self.cdn_timeout),
            ("ffmpeg_timeout", self.ffmpeg_timeout),
        ];
        for (name, value) in timeouts {
            if value.is_zero() {
                return Err(FetchError::internal(format!("{name} must be non-zero")));
            }
        }
        Ok(())
    }

    pub fn primary_mirror_url(&self, id: &ContentId) -> Option<String> {
        join_mp4(&self.primary_mirror_base, id)
    }

    pub fn proxy_url(&self, id: &ContentId) -> Option<String> {
        substitute(&self.proxy_endpoint, id)
    }

    pub fn api_url(&self, id: &ContentId) -> Option<String> {
        substitute(&self.api_endpoint, id)
    }

    pub fn cdn_url(&self, id: &ContentId) -> Option<String> {
        join_mp4(&self.cdn_base, id)
    }

    /// `scheme://host[:port]` of the page base.
    pub fn page_origin(&self) -> Option<String> {
        Url::parse(&self.page_base)
            .ok()
            .map(|url| url.origin().ascii_serialization())
    }
}

fn join_mp4(base: &str, id: &ContentId) -> Option<String> {
    (!base.is_empty()).then(|| format!("{base}{id}.mp4"))
}

fn substitute(template: &str, id: &ContentId) -> Option<String> {
    (!template.is_empty()).then(|| template.replace(ID_PLACEHOLDER, id.as_str()))
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}
