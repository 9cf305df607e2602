//! Wall-clock supervision of compile, run and syntax-check steps.
//!
//! Child processes are spawned with `kill_on_drop`, so dropping the
//! supervising future also kills the child. An expired deadline kills the
//! child explicitly and reaps it before the timeout error is returned.
//!
//! On unix each child leads its own process group. The whole group is
//! killed once the child exits or times out, so background processes it
//! started cannot outlive the request or hold its output pipes open.

use std::fmt;
use std::future::Future;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::config::types::SandboxConfig;
use crate::error::{CoderunError, Result};
use crate::sandbox::traits::Toolchain;
use crate::sandbox::CommandResult;

/// The bounded phase a deadline applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    SyntaxCheck,
    Compile,
    Run,
}

impl Step {
    pub fn timeout_message(&self, seconds: u64) -> String {
        match self {
            Self::SyntaxCheck => format!("Syntax check timed out ({} seconds limit)", seconds),
            Self::Compile => format!("Compilation timed out ({} seconds limit)", seconds),
            Self::Run => format!("Program execution timed out ({} seconds limit)", seconds),
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::SyntaxCheck => "syntax-check",
            Self::Compile => "compile",
            Self::Run => "run",
        };
        f.write_str(name)
    }
}

/// Deadlines for each [`Step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub syntax: Option<Duration>,
    pub compile: Duration,
    pub run: Duration,
}

impl Limits {
    pub fn for_step(&self, step: Step) -> Option<Duration> {
        match step {
            Step::SyntaxCheck => self.syntax,
            Step::Compile => Some(self.compile),
            Step::Run => Some(self.run),
        }
    }
}

impl Default for Limits {
    fn default() -> Self {
        Self::from(&SandboxConfig::default())
    }
}

impl From<&SandboxConfig> for Limits {
    fn from(config: &SandboxConfig) -> Self {
        Self {
            syntax: config.syntax_timeout(),
            compile: config.compile_timeout(),
            run: config.run_timeout(),
        }
    }
}

fn timeout_error(step: Step, limit: Duration) -> CoderunError {
    CoderunError::Timeout {
        step,
        seconds: limit.as_secs(),
    }
}

/// Bound `operation` by `limit`. `None` waits indefinitely.
pub async fn with_timeout<F, T>(step: Step, limit: Option<Duration>, operation: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    let Some(limit) = limit else {
        return operation.await;
    };

    match tokio::time::timeout(limit, operation).await {
        Ok(result) => result,
        Err(_) => Err(timeout_error(step, limit)),
    }
}

/// Spawn `cmd` and wait for it under `limit`, capturing stdout and stderr.
///
/// `toolchain` names the executable when it comes from the host; a missing
/// executable is then reported as [`CoderunError::ToolchainUnavailable`].
/// Pass `None` for artifacts produced inside the workspace.
pub async fn run_supervised(
    mut cmd: Command,
    toolchain: Option<&Toolchain>,
    step: Step,
    limit: Option<Duration>,
) -> Result<CommandResult> {
    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());
    cmd.kill_on_drop(true);
    #[cfg(unix)]
    cmd.process_group(0);

    let mut child = cmd.spawn().map_err(|e| match toolchain {
        Some(toolchain) if e.kind() == std::io::ErrorKind::NotFound => toolchain.unavailable(),
        _ => CoderunError::Io(e),
    })?;

    let group = child.id();
    debug!(step = %step, pid = ?group, limit = ?limit, "Spawned supervised process");

    // Limits too large to represent as an instant leave the pipes unbounded.
    let deadline = limit.and_then(|limit| Instant::now().checked_add(limit));
    let stdout_task = tokio::spawn(drain(child.stdout.take()));
    let stderr_task = tokio::spawn(drain(child.stderr.take()));

    let waited = with_timeout(step, limit, async {
        child.wait().await.map_err(CoderunError::from)
    })
    .await;

    let status = match waited {
        Ok(status) => status,
        Err(err @ CoderunError::Timeout { .. }) => {
            warn!(step = %step, pid = ?group, "Deadline elapsed, killing process group");
            kill_group(group);
            // kill() sends SIGKILL and waits for the exit, so the child is reaped here
            if let Err(e) = child.kill().await {
                warn!(step = %step, error = %e, "Failed to kill timed out process");
            }
            stdout_task.abort();
            stderr_task.abort();
            return Err(err);
        }
        Err(err) => return Err(err),
    };

    // Leftover background processes would otherwise keep the pipes open.
    kill_group(group);

    let readers = [stdout_task.abort_handle(), stderr_task.abort_handle()];
    let streams = async {
        Ok::<_, CoderunError>((collect(stdout_task).await?, collect(stderr_task).await?))
    };
    let (stdout, stderr) = match deadline {
        Some(deadline) => match tokio::time::timeout_at(deadline, streams).await {
            Ok(streams) => streams?,
            Err(_) => {
                warn!(step = %step, "Output pipes still open at deadline");
                readers.iter().for_each(|reader| reader.abort());
                return Err(timeout_error(step, limit.unwrap_or_default()));
            }
        },
        None => streams.await?,
    };

    let result = CommandResult::new(stdout, stderr, status);
    debug!(
        step = %step,
        exit_code = ?result.exit_code,
        signal = ?result.signal,
        stdout_len = result.stdout.len(),
        stderr_len = result.stderr.len(),
        "Supervised process completed"
    );

    Ok(result)
}

#[cfg(unix)]
fn kill_group(group: Option<u32>) {
    let Some(pgid) = group.and_then(|pid| i32::try_from(pid).ok()) else {
        return;
    };
    // SAFETY: killpg only sends a signal; ESRCH for an empty group is fine.
    let rc = unsafe { libc::killpg(pgid, libc::SIGKILL) };
    if rc != 0 {
        debug!(pgid, error = %std::io::Error::last_os_error(), "Process group already gone");
    }
}

#[cfg(not(unix))]
fn kill_group(_group: Option<u32>) {}

async fn drain<R: AsyncRead + Unpin>(pipe: Option<R>) -> std::io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        pipe.read_to_end(&mut buf).await?;
    }
    Ok(buf)
}

async fn collect(task: JoinHandle<std::io::Result<Vec<u8>>>) -> Result<String> {
    let bytes = task.await.map_err(anyhow::Error::from)??;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
