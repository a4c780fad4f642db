//! Real process runner using `tokio::process::Command`.

use std::io::ErrorKind;
use std::process::Stdio;
use std::time::Instant;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::domain::model::{ExternalInvocation, InvocationOutput};
use crate::domain::ports::ScriptRunner;
use crate::utils::error::{ConfluenceError, Result};

/// Subprocess execution backed by `tokio::process`.
///
/// stdout and stderr are drained on their own tasks while stdin is written, so a
/// chatty script cannot deadlock against a large payload. On unix each script runs
/// in its own process group, and a timeout kills the whole group.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioScriptRunner;

fn drain<R>(reader: Option<R>) -> JoinHandle<std::io::Result<String>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = Vec::new();
        if let Some(mut reader) = reader {
            reader.read_to_end(&mut buf).await?;
        }
        Ok(String::from_utf8_lossy(&buf).into_owned())
    })
}

async fn collect(handle: &mut JoinHandle<std::io::Result<String>>) -> Result<String> {
    handle
        .await
        .map_err(|e| ConfluenceError::ServerError {
            message: format!("Output reader task failed: {e}"),
        })?
        .map_err(ConfluenceError::IoError)
}

/// Kill everything the script started, then reap the direct child.
async fn terminate(child: &mut Child, pid: Option<u32>) {
    #[cfg(unix)]
    if let Some(pgid) = pid.and_then(|pid| i32::try_from(pid).ok()) {
        use nix::errno::Errno;
        use nix::sys::signal::{killpg, Signal};
        use nix::unistd::Pid;

        match killpg(Pid::from_raw(pgid), Signal::SIGKILL) {
            Ok(()) | Err(Errno::ESRCH) => {}
            Err(e) => warn!(error = %e, pgid, "failed to kill process group"),
        }
    }
    #[cfg(not(unix))]
    let _ = pid;

    // 子行程可能已結束（只剩背景行程佔住輸出）
    if let Ok(Some(_)) = child.try_wait() {
        return;
    }
    if let Err(e) = child.kill().await {
        warn!(error = %e, "failed to kill timed out process");
    }
}

#[async_trait]
impl ScriptRunner for TokioScriptRunner {
    async fn run(&self, invocation: &ExternalInvocation) -> Result<InvocationOutput> {
        let start = Instant::now();

        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args);
        cmd.stdin(if invocation.stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        });
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);
        #[cfg(unix)]
        cmd.process_group(0);

        debug!(program = %invocation.program, args = ?invocation.args, "spawning process");

        let mut child = cmd.spawn().map_err(|e| match e.kind() {
            ErrorKind::NotFound => ConfluenceError::InterpreterNotFound {
                command: invocation.program.clone(),
            },
            _ => ConfluenceError::IoError(e),
        })?;
        let pid = child.id();

        let mut stdout_task = drain(child.stdout.take());
        let mut stderr_task = drain(child.stderr.take());
        let mut stdin = child.stdin.take();

        // stdin、wait 與讀取輸出共用同一個期限
        let finished = tokio::time::timeout(invocation.timeout, async {
            if let (Some(pipe), Some(payload)) = (stdin.as_mut(), invocation.stdin.as_deref()) {
                match pipe.write_all(payload.as_bytes()).await {
                    // 腳本可能不讀 stdin 就結束
                    Err(e) if e.kind() == ErrorKind::BrokenPipe => {}
                    other => other?,
                }
            }
            drop(stdin.take());
            let status = child.wait().await?;
            let stdout = collect(&mut stdout_task).await?;
            let stderr = collect(&mut stderr_task).await?;
            Ok::<_, ConfluenceError>((status, stdout, stderr))
        })
        .await;

        let (status, stdout, stderr) = match finished {
            Ok(outcome) => outcome?,
            Err(_) => {
                warn!(
                    program = %invocation.program,
                    timeout_secs = invocation.timeout.as_secs_f64(),
                    "process timed out, killing it"
                );
                terminate(&mut child, pid).await;
                stdout_task.abort();
                stderr_task.abort();
                return Err(ConfluenceError::Timeout {
                    seconds: invocation.timeout.as_secs(),
                });
            }
        };
        let exit_code = status.code();

        debug!(
            program = %invocation.program,
            exit_code = ?exit_code,
            duration_ms = start.elapsed().as_millis() as u64,
            stdout_len = stdout.len(),
            "process completed"
        );

        Ok(InvocationOutput {
            stdout,
            stderr,
            exit_code,
        })
    }
}
