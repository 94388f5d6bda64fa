// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Screenshot capture: render each website URL with bounded concurrency.

use crate::error::EngineError;
use crate::export::{export_targets, ExportSource};
use crate::provider::TargetProvider;
use crate::stage::{StageEnv, StageReport, ToolStats};
use crate::timeouts;
use arx_adapters::{execute_and_wait_cancellable, ExecOptions};
use arx_config::{render_command, StageConfig};
use arx_core::cancel::CancelFlag;
use arx_core::clock::Clock;
use arx_core::stage::StageKind;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

const STAGE: StageKind = StageKind::Screenshot;

pub const DEFAULT_CONCURRENCY: usize = 5;

const SOURCES: [ExportSource; 2] = [ExportSource::Websites, ExportSource::Default];

/// One capture per URL; returns whether the tool exited cleanly and the
/// output file appeared.
async fn capture_one(
    command: String,
    timeout: std::time::Duration,
    out_file: std::path::PathBuf,
    cancel: CancelFlag,
) -> bool {
    match execute_and_wait_cancellable(&command, ExecOptions::with_timeout(timeout), &cancel).await
    {
        Ok(outcome) if outcome.success() => out_file.exists(),
        Ok(outcome) => {
            warn!(code = ?outcome.code, "screenshot tool failed");
            false
        }
        Err(err) if err.is_cancelled() => false,
        Err(err) => {
            warn!(error = %err, "screenshot tool errored");
            false
        }
    }
}

fn shot_file(dir: &Path, index: usize) -> std::path::PathBuf {
    dir.join(format!("shot_{index:05}.png"))
}

pub async fn run<C: Clock>(
    env: &Arc<StageEnv<C>>,
    provider: &dyn TargetProvider,
    config: &StageConfig,
) -> Result<StageReport, EngineError> {
    let dir = env.enter_stage(STAGE).await?;
    let shots_dir = dir.join("shots");
    std::fs::create_dir_all(&shots_dir)?;

    let export = export_targets(provider, &SOURCES, &dir.join("sites.txt"))?;
    if export.is_empty() {
        return Ok(StageReport::skipped(STAGE, "no URLs to capture"));
    }
    let urls = super::read_lines(&export.output_file)?;

    let mut tools = ToolStats::default();
    let mut captured = 0u64;
    let mut failed = 0u64;

    for (tool_name, tool) in config.enabled_tools() {
        if env.cancel.is_cancelled() {
            return Err(EngineError::Cancelled);
        }
        let concurrency = tool
            .concurrency
            .map(|c| c as usize)
            .unwrap_or(DEFAULT_CONCURRENCY)
            .max(1);
        let timeout = timeouts::resolve(tool.timeout, || 60);

        info!(urls = urls.len(), concurrency, "capturing screenshots");
        let semaphore = Arc::new(Semaphore::new(concurrency));
        let mut join_set: JoinSet<bool> = JoinSet::new();

        for (index, url) in urls.iter().enumerate() {
            if env.cancel.is_cancelled() {
                break;
            }
            let out_file = shot_file(&shots_dir, index);
            let vars = super::base_vars(tool, timeout.as_secs(), Some(&env.target_name))
                .set("url", url.clone())
                .set_path("output_file", &out_file);
            let command = match render_command(&tool.command, &vars.into_map()) {
                Ok(command) => command,
                Err(err) => {
                    warn!(url = %url, error = %err, "command build failed");
                    failed += 1;
                    continue;
                }
            };
            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|_| EngineError::Cancelled)?;
            let cancel = env.cancel.clone();
            join_set.spawn(async move {
                let _permit = permit;
                capture_one(command, timeout, out_file, cancel).await
            });
        }

        while let Some(result) = join_set.join_next().await {
            match result {
                Ok(true) => captured += 1,
                _ => failed += 1,
            }
        }

        if captured > 0 {
            tools.record_success(tool_name);
        } else {
            tools.record_failure(tool_name, "no screenshots captured");
        }
    }

    env.scans.set_screenshot_count(&env.scan_id, captured)?;

    let mut report = StageReport::from_tools(STAGE, captured, tools);
    report.detail = format!("captured={captured}, failed={failed}");
    Ok(report)
}

#[cfg(test)]
#[path = "screenshot_tests.rs"]
mod tests;
