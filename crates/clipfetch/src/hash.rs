use md5::{Digest, Md5};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::content_id::ContentId;

const HASH_LEN: usize = 12;

/// Tells apart requests for the same id started in the same millisecond.
static SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Short per-request token used to namespace temporary files and to
/// correlate proxy requests.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestHash(String);

impl RequestHash {
    /// Hash for a request submitted now by this process.
    pub fn generate(id: &ContentId) -> Self {
        let timestamp_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        let sequence = SEQUENCE.fetch_add(1, Ordering::Relaxed);
        Self::from_parts(id, timestamp_ms, std::process::id(), sequence)
    }

    pub fn from_parts(id: &ContentId, timestamp_ms: u128, pid: u32, sequence: u64) -> Self {
        let mut hasher = Md5::new();
        hasher.update(id.as_str().as_bytes());
        hasher.update(timestamp_ms.to_string().as_bytes());
        hasher.update(pid.to_string().as_bytes());
        hasher.update(b":");
        hasher.update(sequence.to_string().as_bytes());
        let digest = hex::encode(hasher.finalize());
        Self(digest[..HASH_LEN].to_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
