//! Turn a shared clip link into a clean mp4.
//!
//! A [`Pipeline`] extracts the [`ContentId`], asks each upstream source in
//! turn for the asset, writes the first stream that succeeds to a temporary
//! file, removes the watermark with ffmpeg when the source only had a marked
//! copy, and hands the result back. Temporary files never outlive a request.
//!
//! ```no_run
//! # async fn run() -> Result<(), clipfetch::FetchError> {
//! use clipfetch::{DownloadRequest, FetchConfig, Pipeline};
//!
//! let pipeline = Pipeline::new(FetchConfig::default())?;
//! let result = pipeline
//!     .fetch(&DownloadRequest::new("https://sora.chatgpt.com/p/s_68e3a1b2c4d5"))
//!     .await?;
//! println!("{} from {} ({})", result.filename, result.source, result.size_label);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod content_id;
pub mod delogo;
pub mod error;
pub mod hash;
pub mod persist;
pub mod pipeline;
pub mod resolver;
pub mod result;
pub mod source;
pub mod temp;

pub use config::FetchConfig;
pub use content_id::ContentId;
pub use error::{FetchError, SourceError};
pub use pipeline::{DownloadRequest, Pipeline, SavedDownload};
pub use result::{DownloadResponse, DownloadResult};
pub use source::SourceTag;
