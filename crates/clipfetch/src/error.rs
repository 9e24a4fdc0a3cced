use reqwest::StatusCode;
use std::io;
use std::time::Duration;

use crate::source::SourceTag;

/// Terminal outcome of a fetch request. Every variant ends the request.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("could not find a content id in `{input}`")]
    InvalidInput { input: String },

    #[error("no source could supply content `{id}`")]
    SourceUnavailable { id: String },

    #[error("watermark removal failed")]
    ProcessingFailed,

    #[error("internal error: {reason}")]
    Internal { reason: String },
}

impl FetchError {
    pub fn invalid_input(input: impl Into<String>) -> Self {
        Self::InvalidInput {
            input: input.into(),
        }
    }

    pub fn source_unavailable(id: impl Into<String>) -> Self {
        Self::SourceUnavailable { id: id.into() }
    }

    pub fn internal(reason: impl Into<String>) -> Self {
        Self::Internal {
            reason: reason.into(),
        }
    }

    /// Status an HTTP front-end would answer with.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            Self::SourceUnavailable { .. } => StatusCode::NOT_FOUND,
            Self::ProcessingFailed | Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable name.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidInput { .. } => "invalid_input",
            Self::SourceUnavailable { .. } => "source_unavailable",
            Self::ProcessingFailed => "processing_failed",
            Self::Internal { .. } => "internal",
        }
    }
}

impl From<std::io::Error> for FetchError {
    fn from(err: std::io::Error) -> Self {
        Self::internal(format!("I/O error: {err}"))
    }
}

/// Why a single source could not supply the asset.
///
/// These never leave the resolver; they are logged and the next source runs.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("{source_tag} is not configured")]
    NotConfigured { source_tag: SourceTag },

    #[error("no bearer token configured")]
    MissingToken,

    #[error("HTTP request failed: {source}")]
    Network { source: reqwest::Error },

    #[error("timed out after {after:?} waiting for {url}")]
    Timeout { url: String, after: Duration },

    #[error("request failed with HTTP {status} for {url}")]
    HttpStatus { status: StatusCode, url: String },

    #[error("unexpected content type `{content_type}` for {url}")]
    UnexpectedContentType { content_type: String, url: String },

    #[error("invalid JSON response: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },

    #[error("no playable url in response")]
    NoPlayableUrl,
}

impl SourceError {
    pub fn http_status(status: StatusCode, url: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            url: url.into(),
        }
    }

    /// Classify a transport failure; timeouts get their own variant so they
    /// read as such in logs.
    pub fn transport(err: reqwest::Error, url: impl Into<String>, budget: Duration) -> Self {
        if is_timeout(&err) {
            Self::Timeout {
                url: url.into(),
                after: budget,
            }
        } else {
            Self::Network { source: err }
        }
    }

    /// True when the source was never contacted.
    pub fn is_skip(&self) -> bool {
        matches!(self, Self::NotConfigured { .. } | Self::MissingToken)
    }
}

/// Read timeouts surface as an `io::ErrorKind::TimedOut` deep in the chain
/// rather than through `reqwest::Error::is_timeout`.
fn is_timeout(err: &reqwest::Error) -> bool {
    if err.is_timeout() {
        return true;
    }
    let mut source = std::error::Error::source(err);
    while let Some(inner) = source {
        if let Some(io_err) = inner.downcast_ref::<io::Error>()
            && io_err.kind() == io::ErrorKind::TimedOut
        {
            return true;
        }
        source = inner.source();
    }
    false
}
