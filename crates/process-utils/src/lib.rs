//! Child-process helpers shared across the workspace.

use std::ffi::OsStr;
use std::process::Output;
use std::time::Duration;

#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// Apply the Windows `CREATE_NO_WINDOW` flag to child processes.
///
/// On non-Windows targets this is a no-op.
pub trait NoWindowExt {
    fn no_window(&mut self);
}

#[cfg(feature = "tokio")]
impl NoWindowExt for tokio::process::Command {
    fn no_window(&mut self) {
        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            self.as_std_mut().creation_flags(CREATE_NO_WINDOW);
        }
    }
}

/// Create a `tokio::process::Command` that never opens a console window and
/// is killed when its handle is dropped.
#[cfg(feature = "tokio")]
pub fn tokio_command(program: impl AsRef<OsStr>) -> tokio::process::Command {
    let mut cmd = tokio::process::Command::new(program);
    cmd.no_window();
    cmd.kill_on_drop(true);
    cmd
}

/// How a bounded child process run ended.
#[derive(Debug)]
pub enum ProcessOutcome {
    /// The process exited (successfully or not) within the budget.
    Exited(Output),
    /// The budget elapsed first; the child has been killed.
    TimedOut,
}

/// Run `cmd` to completion, capturing stdout/stderr, giving up after `limit`.
///
/// Relies on `kill_on_drop` (set by [`tokio_command`]) so the child does not
/// outlive the timeout.
#[cfg(feature = "tokio")]
pub async fn run_with_timeout(
    cmd: &mut tokio::process::Command,
    limit: Duration,
) -> std::io::Result<ProcessOutcome> {
    cmd.kill_on_drop(true)
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::piped())
        .stderr(std::process::Stdio::piped());

    match tokio::time::timeout(limit, cmd.output()).await {
        Ok(output) => output.map(ProcessOutcome::Exited),
        Err(_) => Ok(ProcessOutcome::TimedOut),
    }
}
