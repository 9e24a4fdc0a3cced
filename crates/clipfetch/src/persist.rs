use futures::StreamExt;
use std::io;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::debug;

use crate::source::ByteStream;
use crate::temp::TempFile;

const WRITE_BUFFER_SIZE: usize = 256 * 1024;

/// Drain `stream` into `file` chunk by chunk, returning the bytes written.
///
/// On error the partial file is left for the guard to remove.
pub async fn persist_stream(mut stream: ByteStream, file: &mut TempFile) -> io::Result<u64> {
    let out = tokio::fs::File::create(file.path()).await?;
    let mut writer = BufWriter::with_capacity(WRITE_BUFFER_SIZE, out);
    let mut written = 0u64;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        writer.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    writer.flush().await?;
    writer.into_inner().sync_all().await?;

    file.finalize();
    debug!(path = %file.path().display(), bytes = written, "stream persisted");
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::temp::TempState;
    use bytes::Bytes;
    use futures::stream;

    #[tokio::test]
    async fn test_persists_all_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = TempFile::new(dir.path().join("in.mp4"));
        let chunks: Vec<io::Result<Bytes>> = vec![
            Ok(Bytes::from_static(b"abc")),
            Ok(Bytes::from_static(b"")),
            Ok(Bytes::from_static(b"def")),
        ];

        let written = persist_stream(stream::iter(chunks).boxed(), &mut file)
            .await
            .unwrap();
        assert_eq!(written, 6);
        assert_eq!(file.state(), TempState::Finalized);
        assert_eq!(std::fs::read(file.path()).unwrap(), b"abcdef");
    }

    #[tokio::test]
    async fn test_stream_error_leaves_nothing_after_drop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("in.mp4");
        let mut file = TempFile::new(&path);
        let chunks: Vec<io::Result<Bytes>> = vec![
            Ok(Bytes::from_static(b"abc")),
            Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset")),
        ];

        let err = persist_stream(stream::iter(chunks).boxed(), &mut file)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::ConnectionReset);
        assert_eq!(file.state(), TempState::Created);

        drop(file);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_unwritable_destination_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = TempFile::new(dir.path().join("missing").join("in.mp4"));
        let chunks: Vec<io::Result<Bytes>> = vec![Ok(Bytes::from_static(b"abc"))];
        assert!(
            persist_stream(stream::iter(chunks).boxed(), &mut file)
                .await
                .is_err()
        );
    }
}
