// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subprocess execution: streaming and wait-for-exit variants.
//!
//! Tools are invoked through `/bin/sh -c` in their own process group, so
//! a timeout can tear down the whole tree (the shell plus whatever it
//! spawned). Stdout is streamed line by line and teed raw to a log file;
//! stderr is captured in a bounded tail for error reporting.

use arx_core::cancel::CancelFlag;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdout, Command};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Bytes of stderr kept for error messages.
const STDERR_TAIL_BYTES: usize = 2_000;

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("failed to spawn {command:?}: {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },
    #[error("io error while streaming output: {0}")]
    Io(#[from] std::io::Error),
    #[error("command timed out after {}s", timeout.as_secs())]
    TimedOut { timeout: Duration },
    #[error("command cancelled")]
    Cancelled,
    #[error("command failed with {code:?}: {stderr_tail}")]
    CommandFailed {
        code: Option<i32>,
        stderr_tail: String,
    },
}

impl ExecError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, ExecError::TimedOut { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, ExecError::Cancelled)
    }
}

/// Resolves once the flag is set. Polling keeps the flag a plain atomic
/// shared freely across threads and processes of the scan.
pub async fn cancelled(cancel: &CancelFlag) {
    loop {
        if cancel.is_cancelled() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(200)).await;
    }
}

/// Options for a subprocess invocation.
#[derive(Debug, Clone, Default)]
pub struct ExecOptions {
    pub cwd: Option<PathBuf>,
    pub env: Vec<(String, String)>,
    /// Wall-clock bound; None means unbounded.
    pub timeout: Option<Duration>,
    /// Raw stdout tee destination.
    pub log_path: Option<PathBuf>,
}

impl ExecOptions {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
            ..Self::default()
        }
    }
}

/// Result of [`execute_and_wait`].
#[derive(Debug)]
pub struct ExecOutcome {
    pub code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr_tail: String,
}

impl ExecOutcome {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

fn build_command(command: &str, opts: &ExecOptions) -> Command {
    let mut cmd = Command::new("/bin/sh");
    cmd.arg("-c")
        .arg(command)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    #[cfg(unix)]
    cmd.process_group(0);
    if let Some(cwd) = &opts.cwd {
        cmd.current_dir(cwd);
    }
    for (key, value) in &opts.env {
        cmd.env(key, value);
    }
    cmd
}

/// Kill the child's whole process group, then the child itself as a
/// fallback. The group id equals the child pid because the child was
/// spawned with `process_group(0)`.
async fn kill_process_tree(child: &mut Child) {
    if let Some(pid) = child.id() {
        let _ = Command::new("kill")
            .arg("-9")
            .arg("--")
            .arg(format!("-{pid}"))
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;
    }
    let _ = child.kill().await;
}

fn spawn_stderr_tail(stderr: Option<tokio::process::ChildStderr>) -> JoinHandle<String> {
    tokio::spawn(async move {
        let Some(mut stderr) = stderr else {
            return String::new();
        };
        let mut tail: Vec<u8> = Vec::new();
        let mut buf = [0u8; 4096];
        while let Ok(n) = stderr.read(&mut buf).await {
            if n == 0 {
                break;
            }
            tail.extend_from_slice(&buf[..n]);
            if tail.len() > STDERR_TAIL_BYTES {
                let cut = tail.len() - STDERR_TAIL_BYTES;
                tail.drain(..cut);
            }
        }
        String::from_utf8_lossy(&tail).into_owned()
    })
}

/// A running subprocess whose stdout is consumed line by line.
///
/// `next_line` yields non-empty lines as they arrive. On clean exit it
/// returns `Ok(None)`; a non-zero exit or a timeout surfaces as an error
/// only after every line read so far has been yielded, so partial
/// results always survive.
pub struct ExecStream {
    child: Child,
    reader: BufReader<ChildStdout>,
    stderr_tail: Option<JoinHandle<String>>,
    log: Option<tokio::fs::File>,
    deadline: Option<Instant>,
    timeout: Option<Duration>,
    line_buf: Vec<u8>,
    finished: bool,
}

impl ExecStream {
    /// Read the next non-empty stdout line.
    pub async fn next_line(&mut self) -> Result<Option<String>, ExecError> {
        if self.finished {
            return Ok(None);
        }
        loop {
            self.line_buf.clear();
            let read = match self.deadline {
                Some(deadline) => {
                    match tokio::time::timeout_at(deadline, self.reader.read_until(b'\n', &mut self.line_buf))
                        .await
                    {
                        Ok(read) => read?,
                        Err(_) => {
                            let timeout = self.timeout.unwrap_or_default();
                            warn!(timeout_s = timeout.as_secs(), "tool timed out, killing process tree");
                            self.finished = true;
                            kill_process_tree(&mut self.child).await;
                            self.flush_log().await;
                            return Err(ExecError::TimedOut { timeout });
                        }
                    }
                }
                None => self.reader.read_until(b'\n', &mut self.line_buf).await?,
            };

            if read == 0 {
                // EOF: reap the child and classify the exit.
                self.finished = true;
                self.flush_log().await;
                let status = self.child.wait().await?;
                if status.success() {
                    return Ok(None);
                }
                let stderr_tail = match self.stderr_tail.take() {
                    Some(handle) => handle.await.unwrap_or_default(),
                    None => String::new(),
                };
                return Err(ExecError::CommandFailed {
                    code: status.code(),
                    stderr_tail,
                });
            }

            if let Some(log) = &mut self.log {
                log.write_all(&self.line_buf).await?;
            }

            let text = String::from_utf8_lossy(&self.line_buf);
            let trimmed = text.trim_end_matches(['\n', '\r']);
            if trimmed.is_empty() {
                continue;
            }
            return Ok(Some(trimmed.to_string()));
        }
    }

    /// Tear the process down early. Lines already yielded stay valid.
    pub async fn close(&mut self) {
        if !self.finished {
            self.finished = true;
            kill_process_tree(&mut self.child).await;
            self.flush_log().await;
        }
        if let Some(handle) = self.stderr_tail.take() {
            handle.abort();
        }
    }

    async fn flush_log(&mut self) {
        if let Some(log) = &mut self.log {
            let _ = log.flush().await;
        }
    }
}

/// Spawn `command` under `/bin/sh -c` and stream its stdout.
pub async fn execute_stream(command: &str, opts: ExecOptions) -> Result<ExecStream, ExecError> {
    debug!(command, timeout = ?opts.timeout, "spawning tool");
    let mut child = build_command(command, &opts)
        .spawn()
        .map_err(|source| ExecError::Spawn {
            command: command.to_string(),
            source,
        })?;

    let stdout = child.stdout.take().ok_or_else(|| ExecError::Spawn {
        command: command.to_string(),
        source: std::io::Error::other("child stdout not captured"),
    })?;
    let stderr_tail = Some(spawn_stderr_tail(child.stderr.take()));

    let log = match &opts.log_path {
        Some(path) => {
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            Some(tokio::fs::File::create(path).await?)
        }
        None => None,
    };

    Ok(ExecStream {
        child,
        reader: BufReader::new(stdout),
        stderr_tail,
        log,
        deadline: opts.timeout.map(|t| Instant::now() + t),
        timeout: opts.timeout,
        line_buf: Vec::with_capacity(4096),
        finished: false,
    })
}

/// Spawn `command` and wait for it to exit, with the process tree killed
/// on timeout. Used for merge/sample steps whose output lands in a file
/// rather than on stdout.
pub async fn execute_and_wait(command: &str, opts: ExecOptions) -> Result<ExecOutcome, ExecError> {
    debug!(command, timeout = ?opts.timeout, "running tool to completion");
    let mut child = build_command(command, &opts)
        .spawn()
        .map_err(|source| ExecError::Spawn {
            command: command.to_string(),
            source,
        })?;

    let stderr_tail = spawn_stderr_tail(child.stderr.take());
    let mut stdout_pipe = child.stdout.take();
    let stdout_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        if let Some(stdout) = stdout_pipe.as_mut() {
            let _ = stdout.read_to_end(&mut buf).await;
        }
        buf
    });

    let status = match opts.timeout {
        Some(timeout) => match tokio::time::timeout(timeout, child.wait()).await {
            Ok(status) => status?,
            Err(_) => {
                kill_process_tree(&mut child).await;
                return Err(ExecError::TimedOut { timeout });
            }
        },
        None => child.wait().await?,
    };

    let stdout = stdout_task.await.unwrap_or_default();
    let stderr_tail = stderr_tail.await.unwrap_or_default();
    Ok(ExecOutcome {
        code: status.code(),
        stdout,
        stderr_tail,
    })
}

/// [`execute_and_wait`], but torn down early (process tree killed) when
/// the cancel flag is set.
pub async fn execute_and_wait_cancellable(
    command: &str,
    opts: ExecOptions,
    cancel: &CancelFlag,
) -> Result<ExecOutcome, ExecError> {
    debug!(command, timeout = ?opts.timeout, "running cancellable tool");
    let mut child = build_command(command, &opts)
        .spawn()
        .map_err(|source| ExecError::Spawn {
            command: command.to_string(),
            source,
        })?;

    let stderr_tail = spawn_stderr_tail(child.stderr.take());
    let mut stdout_pipe = child.stdout.take();
    let stdout_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        if let Some(stdout) = stdout_pipe.as_mut() {
            let _ = stdout.read_to_end(&mut buf).await;
        }
        buf
    });

    // Inner scope so the wait future's borrow of the child ends before
    // any teardown.
    let status = {
        let timeout = opts.timeout;
        let wait = async {
            match timeout {
                Some(timeout) => tokio::time::timeout(timeout, child.wait())
                    .await
                    .map_err(|_| ExecError::TimedOut { timeout })?
                    .map_err(ExecError::Io),
                None => child.wait().await.map_err(ExecError::Io),
            }
        };
        tokio::pin!(wait);
        tokio::select! {
            status = &mut wait => status,
            _ = cancelled(cancel) => {
                warn!(command, "cancel requested, killing process tree");
                Err(ExecError::Cancelled)
            }
        }
    };
    let status = match status {
        Ok(status) => status,
        Err(err) => {
            kill_process_tree(&mut child).await;
            return Err(err);
        }
    };

    let stdout = stdout_task.await.unwrap_or_default();
    let stderr_tail = stderr_tail.await.unwrap_or_default();
    Ok(ExecOutcome {
        code: status.code(),
        stdout,
        stderr_tail,
    })
}

#[cfg(test)]
#[path = "subprocess_tests.rs"]
mod tests;
