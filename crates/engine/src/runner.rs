// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tool runner: one external tool, streamed through a parser into a
//! batched writer.

use crate::error::EngineError;
use crate::sink::RecordSink;
use crate::writer::BatchedWriter;
use arx_adapters::{cancelled, execute_stream, ExecError, ExecOptions};
use arx_core::cancel::CancelFlag;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, info_span, warn};

/// A fully rendered tool invocation.
#[derive(Debug, Clone)]
pub struct ToolRun {
    pub tool: String,
    pub command: String,
    pub timeout: Duration,
    pub log_path: PathBuf,
    pub cwd: Option<PathBuf>,
}

/// How a tool run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolStatus {
    Succeeded,
    /// Killed at the wall-clock bound; records streamed before the kill
    /// were kept.
    TimedOut,
    /// Torn down by scan cancellation; records streamed so far were kept.
    Cancelled,
    Failed(String),
}

/// Per-tool statistics.
#[derive(Debug, Clone)]
pub struct ToolOutcome {
    pub tool: String,
    pub status: ToolStatus,
    pub lines: u64,
    pub records: u64,
    pub parse_errors: u64,
}

impl ToolOutcome {
    pub fn succeeded(&self) -> bool {
        self.status == ToolStatus::Succeeded
    }
}

/// Run one tool, parsing each stdout line and submitting records to the
/// writer. Tool-level failures (spawn, exit code, timeout) land in the
/// outcome; only storage exhaustion escapes as an error, because that is
/// the one thing that fails the whole stage.
pub async fn run_streaming_tool<R, S: RecordSink<R>>(
    run: &ToolRun,
    cancel: &CancelFlag,
    parse: impl Fn(&str) -> Option<R>,
    writer: &mut BatchedWriter<R, S>,
) -> Result<ToolOutcome, EngineError> {
    let span = info_span!("tool", tool = %run.tool);
    let _guard = span.enter();
    info!(command = %run.command, timeout_s = run.timeout.as_secs(), "running");

    let opts = ExecOptions {
        cwd: run.cwd.clone(),
        env: Vec::new(),
        timeout: Some(run.timeout),
        log_path: Some(run.log_path.clone()),
    };

    let mut outcome = ToolOutcome {
        tool: run.tool.clone(),
        status: ToolStatus::Succeeded,
        lines: 0,
        records: 0,
        parse_errors: 0,
    };

    let mut stream = match execute_stream(&run.command, opts).await {
        Ok(stream) => stream,
        Err(err) => {
            warn!(error = %err, "tool spawn failed");
            outcome.status = ToolStatus::Failed(err.to_string());
            return Ok(outcome);
        }
    };

    let status = loop {
        let next = tokio::select! {
            next = stream.next_line() => next,
            _ = cancelled(cancel) => {
                warn!("cancel requested, tearing down tool");
                stream.close().await;
                break ToolStatus::Cancelled;
            }
        };
        match next {
            Ok(Some(line)) => {
                outcome.lines += 1;
                match parse(&line) {
                    Some(record) => {
                        outcome.records += 1;
                        writer.submit(record).await?;
                        if outcome.records % 100 == 0 {
                            info!(records = outcome.records, "streaming");
                        }
                    }
                    None => outcome.parse_errors += 1,
                }
            }
            Ok(None) => break ToolStatus::Succeeded,
            Err(ExecError::TimedOut { timeout }) => {
                warn!(timeout_s = timeout.as_secs(), "tool timed out, partial results kept");
                break ToolStatus::TimedOut;
            }
            Err(err) => {
                warn!(error = %err, "tool failed");
                break ToolStatus::Failed(err.to_string());
            }
        }
    };
    outcome.status = status;

    info!(
        lines = outcome.lines,
        records = outcome.records,
        parse_errors = outcome.parse_errors,
        succeeded = outcome.succeeded(),
        "tool finished"
    );
    Ok(outcome)
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
