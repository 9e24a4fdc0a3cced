//! Request-scoped temporary files.
//!
//! A [`TempFile`] owns its path: whatever happens to the request, the file is
//! gone once the guard is dropped or explicitly deleted.

use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::hash::RequestHash;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TempState {
    /// Path reserved; the file may be partially written.
    Created,
    /// Contents fully written and flushed.
    Finalized,
    Deleted,
}

#[derive(Debug)]
pub struct TempFile {
    path: PathBuf,
    state: TempState,
}

impl TempFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            state: TempState::Created,
        }
    }

    /// Downloaded asset for this request.
    pub fn input(dir: &Path, hash: &RequestHash) -> Self {
        Self::new(dir.join(format!("{hash}_input.mp4")))
    }

    /// Watermark-free output for this request.
    pub fn output(dir: &Path, hash: &RequestHash) -> Self {
        Self::new(dir.join(format!("{hash}_output.mp4")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn state(&self) -> TempState {
        self.state
    }

    pub(crate) fn finalize(&mut self) {
        self.state = TempState::Finalized;
    }

    /// Remove the file now. A file that was never written is not an error.
    pub async fn delete(mut self) -> io::Result<()> {
        self.state = TempState::Deleted;
        remove_if_exists(&self.path).await
    }

    /// Move the file to `dest`, releasing it from cleanup.
    pub async fn persist(mut self, dest: &Path) -> io::Result<()> {
        if tokio::fs::rename(&self.path, dest).await.is_err() {
            // rename fails across filesystems
            tokio::fs::copy(&self.path, dest).await?;
            remove_if_exists(&self.path).await?;
        }
        self.state = TempState::Deleted;
        Ok(())
    }
}

impl Drop for TempFile {
    fn drop(&mut self) {
        if self.state == TempState::Deleted {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "removed temporary file"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), error = %e, "failed to remove temporary file"),
        }
    }
}

pub(crate) async fn remove_if_exists(path: &Path) -> io::Result<()> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}
