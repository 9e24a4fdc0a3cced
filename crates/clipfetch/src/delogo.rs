//! Watermark removal through ffmpeg's `delogo` filter.

use process_utils::{ProcessOutcome, run_with_timeout, tokio_command};
use std::ffi::OsString;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use crate::config::FetchConfig;
use crate::error::FetchError;
use crate::temp::TempFile;

/// Blurs a 150x50 box anchored 160px from the right and 60px from the
/// bottom of the frame, where the mark sits at every resolution.
pub const DELOGO_FILTER: &str = "delogo=x=iw-160:y=ih-60:w=150:h=50";

const STDERR_TAIL: usize = 512;

pub struct WatermarkRemover {
    ffmpeg_path: String,
    timeout: Duration,
}

impl WatermarkRemover {
    pub fn new(ffmpeg_path: impl Into<String>, timeout: Duration) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            timeout,
        }
    }

    pub fn from_config(config: &FetchConfig) -> Self {
        Self::new(config.ffmpeg_path.clone(), config.ffmpeg_timeout)
    }

    /// Re-encode video through the filter, copy audio untouched.
    pub fn args(input: &Path, output: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = ["-y", "-hide_banner", "-loglevel", "error", "-i"]
            .into_iter()
            .map(OsString::from)
            .collect();
        args.push(input.as_os_str().to_owned());
        args.extend(
            [
                "-vf",
                DELOGO_FILTER,
                "-c:v",
                "libx264",
                "-preset",
                "veryfast",
                "-c:a",
                "copy",
            ]
            .into_iter()
            .map(OsString::from),
        );
        args.push(output.as_os_str().to_owned());
        args
    }

    /// Run the filter from `input` into `output`.
    ///
    /// `input` is deleted whatever happens. On failure `output` is deleted
    /// as well and only a generic [`FetchError::ProcessingFailed`] is returned.
    pub async fn remove(&self, input: TempFile, mut output: TempFile) -> Result<TempFile, FetchError> {
        let start = Instant::now();
        info!(
            input = %input.path().display(),
            output = %output.path().display(),
            "removing watermark"
        );

        let mut cmd = tokio_command(&self.ffmpeg_path);
        cmd.args(Self::args(input.path(), output.path()))
            .env("LC_ALL", "C");
        let outcome = run_with_timeout(&mut cmd, self.timeout).await;

        if let Err(e) = input.delete().await {
            warn!(error = %e, "failed to delete processing input");
        }

        let succeeded = match outcome {
            Ok(ProcessOutcome::Exited(out)) if out.status.success() => {
                debug!(stderr = %tail(&out.stderr), "ffmpeg finished");
                true
            }
            Ok(ProcessOutcome::Exited(out)) => {
                error!(
                    code = out.status.code().unwrap_or(-1),
                    stderr = %tail(&out.stderr),
                    "ffmpeg failed"
                );
                false
            }
            Ok(ProcessOutcome::TimedOut) => {
                error!(timeout_secs = self.timeout.as_secs(), "ffmpeg timed out");
                false
            }
            Err(e) => {
                error!(ffmpeg = %self.ffmpeg_path, error = %e, "failed to run ffmpeg");
                false
            }
        };

        let produced = succeeded && tokio::fs::metadata(output.path()).await.is_ok();
        if !produced {
            if succeeded {
                error!(path = %output.path().display(), "ffmpeg exited cleanly without output");
            }
            if let Err(e) = output.delete().await {
                warn!(error = %e, "failed to delete processing output");
            }
            return Err(FetchError::ProcessingFailed);
        }

        output.finalize();
        info!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            "watermark removed"
        );
        Ok(output)
    }
}

fn tail(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    let text = text.trim();
    let start = text
        .char_indices()
        .rev()
        .nth(STDERR_TAIL)
        .map(|(i, _)| i)
        .unwrap_or(0);
    text[start..].to_owned()
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::{Path, PathBuf};

    /// Write an executable shell script standing in for ffmpeg.
    #[cfg(unix)]
    pub fn fake_ffmpeg(dir: &Path, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join("fake-ffmpeg.sh");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    /// Writes "processed" to its last argument.
    pub const SUCCEEDS: &str = r#"for last; do :; done
printf processed > "$last""#;

    /// Leaves a partial output behind and fails.
    pub const FAILS: &str = r#"for last; do :; done
printf partial > "$last"
exit 1"#;

    pub const HANGS: &str = "sleep 5";
}

#[cfg(all(test, unix))]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::temp::TempState;

    fn files(dir: &Path) -> (TempFile, TempFile) {
        let input = TempFile::new(dir.join("in.mp4"));
        std::fs::write(input.path(), b"raw").unwrap();
        (input, TempFile::new(dir.join("out.mp4")))
    }

    #[test]
    fn test_args_shape() {
        let args = WatermarkRemover::args(Path::new("/t/in.mp4"), Path::new("/t/out.mp4"));
        let args: Vec<&str> = args.iter().map(|a| a.to_str().unwrap()).collect();
        let vf = args.iter().position(|a| *a == "-vf").unwrap();
        assert_eq!(args[vf + 1], "delogo=x=iw-160:y=ih-60:w=150:h=50");
        let ca = args.iter().position(|a| *a == "-c:a").unwrap();
        assert_eq!(args[ca + 1], "copy");
        let input = args.iter().position(|a| *a == "-i").unwrap();
        assert_eq!(args[input + 1], "/t/in.mp4");
        assert_eq!(*args.last().unwrap(), "/t/out.mp4");
    }

    #[tokio::test]
    async fn test_success_keeps_only_output() {
        let dir = tempfile::tempdir().unwrap();
        let ffmpeg = fake_ffmpeg(dir.path(), SUCCEEDS);
        let (input, output) = files(dir.path());
        let input_path = input.path().to_path_buf();

        let remover = WatermarkRemover::new(ffmpeg.to_string_lossy(), Duration::from_secs(10));
        let output = remover.remove(input, output).await.unwrap();

        assert!(!input_path.exists());
        assert_eq!(output.state(), TempState::Finalized);
        assert_eq!(std::fs::read(output.path()).unwrap(), b"processed");
    }

    #[tokio::test]
    async fn test_failure_removes_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let ffmpeg = fake_ffmpeg(dir.path(), FAILS);
        let (input, output) = files(dir.path());
        let (input_path, output_path) = (input.path().to_path_buf(), output.path().to_path_buf());

        let remover = WatermarkRemover::new(ffmpeg.to_string_lossy(), Duration::from_secs(10));
        let err = remover.remove(input, output).await.unwrap_err();

        assert!(matches!(err, FetchError::ProcessingFailed));
        assert!(!input_path.exists());
        assert!(!output_path.exists());
    }

    #[tokio::test]
    async fn test_timeout_fails() {
        let dir = tempfile::tempdir().unwrap();
        let ffmpeg = fake_ffmpeg(dir.path(), HANGS);
        let (input, output) = files(dir.path());
        let input_path = input.path().to_path_buf();

        let remover = WatermarkRemover::new(ffmpeg.to_string_lossy(), Duration::from_millis(200));
        let err = remover.remove(input, output).await.unwrap_err();

        assert!(matches!(err, FetchError::ProcessingFailed));
        assert!(!input_path.exists());
    }

    #[tokio::test]
    async fn test_missing_binary_fails() {
        let dir = tempfile::tempdir().unwrap();
        let (input, output) = files(dir.path());
        let input_path = input.path().to_path_buf();

        let remover = WatermarkRemover::new("/nonexistent/ffmpeg", Duration::from_secs(1));
        assert!(remover.remove(input, output).await.is_err());
        assert!(!input_path.exists());
    }

    #[test]
    fn test_tail_keeps_end() {
        let long = "x".repeat(2000) + "END";
        let t = tail(long.as_bytes());
        assert!(t.ends_with("END"));
        assert!(t.len() <= STDERR_TAIL + 1);
    }
}
