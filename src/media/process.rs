//! Subprocess spawning shared by every media adapter: argument-vector `Command`,
//! a hard timeout, and process-group kill on expiry, grounded on the teacher's
//! `audio/downloader.rs` `tokio::process::Command` idiom.

use std::process::Stdio;
use std::time::Duration;

use tokio::io::AsyncReadExt;
use tokio::process::Command;

use crate::error::{Result, SpiralmemError};

/// Output of a subprocess run to completion within its timeout.
pub struct ToolOutput {
    pub stdout: Vec<u8>,
    pub stderr: String,
    pub status_success: bool,
    pub exit_code: Option<i32>,
}

/// Run `binary args...` with a wall-clock timeout, killing the whole process
/// group if it expires. Never returns a raw subprocess error to the caller:
/// missing binaries and timeouts are mapped to typed [`SpiralmemError`]s.
pub async fn run_tool(binary: &str, args: &[&str], timeout: Duration) -> Result<ToolOutput> {
    let mut command = Command::new(binary);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        command.process_group(0);
    }

    let mut child = command.spawn().map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            SpiralmemError::ToolNotFound(binary.to_string())
        } else {
            SpiralmemError::Io(e)
        }
    })?;

    let pid = child.id();
    let mut stdout_pipe = child.stdout.take();
    let mut stderr_pipe = child.stderr.take();

    let run = async {
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        if let Some(mut pipe) = stdout_pipe.take() {
            let _ = pipe.read_to_end(&mut stdout).await;
        }
        if let Some(mut pipe) = stderr_pipe.take() {
            let _ = pipe.read_to_end(&mut stderr).await;
        }
        let status = child.wait().await?;
        Ok::<_, std::io::Error>((status, stdout, stderr))
    };

    match tokio::time::timeout(timeout, run).await {
        Ok(Ok((status, stdout, stderr))) => Ok(ToolOutput {
            stdout,
            stderr: String::from_utf8_lossy(&stderr).to_string(),
            status_success: status.success(),
            exit_code: status.code(),
        }),
        Ok(Err(e)) => Err(SpiralmemError::Io(e)),
        Err(_) => {
            kill_process_group(pid);
            Err(SpiralmemError::media_timeout(binary))
        }
    }
}

/// Best-effort: ask the OS to terminate the whole process group spawned for
/// this invocation, not just the direct child, so child processes a tool
/// forks (e.g. ffmpeg's helper threads) don't linger after a timeout.
#[cfg(unix)]
fn kill_process_group(pid: Option<u32>) {
    if let Some(pid) = pid {
        let _ = std::process::Command::new("kill")
            .arg("-TERM")
            .arg(format!("-{pid}"))
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pid: Option<u32>) {}

/// Convenience wrapper: fail the call with a `MediaTool` error unless the
/// process exited zero.
pub fn require_success(binary: &str, output: ToolOutput) -> Result<ToolOutput> {
    if output.status_success {
        Ok(output)
    } else {
        Err(SpiralmemError::media_tool(binary, output.exit_code, &output.stderr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_binary_maps_to_tool_not_found() {
        let err = run_tool("definitely-not-a-real-binary", &[], Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, SpiralmemError::ToolNotFound(_)));
    }

    #[tokio::test]
    async fn test_timeout_maps_to_media_timeout() {
        let err = run_tool("sleep", &["5"], Duration::from_millis(50)).await.unwrap_err();
        assert!(matches!(err, SpiralmemError::MediaTool { timed_out: true, .. }));
    }
}
