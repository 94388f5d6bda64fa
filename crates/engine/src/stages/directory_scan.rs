// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Directory scan: N-way fan-out of a bruteforce tool over site URLs.
//!
//! A worker pool of `max_workers` (default 5) runs the tool once per
//! site; one site timing out or failing only costs that site. Progress
//! milestones are logged every 20%.

use crate::error::EngineError;
use crate::export::{export_targets, ExportSource};
use crate::parsers::directories;
use crate::provider::TargetProvider;
use crate::runner::{run_streaming_tool, ToolRun, ToolStatus};
use crate::sink::DirectorySink;
use crate::stage::{StageEnv, StageReport, ToolStats};
use crate::timeouts;
use crate::wordlist;
use crate::writer::BatchedWriter;
use arx_config::{render_command, StageConfig, ToolConfig};
use arx_core::clock::Clock;
use arx_core::stage::StageKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

const STAGE: StageKind = StageKind::DirectoryScan;

pub const DEFAULT_MAX_WORKERS: usize = 5;

const SOURCES: [ExportSource; 2] = [ExportSource::Websites, ExportSource::Default];

struct SiteResult {
    site: String,
    records: u64,
    status: ToolStatus,
}

async fn scan_one_site<C: Clock>(
    env: Arc<StageEnv<C>>,
    dir: PathBuf,
    tool_name: String,
    command: String,
    timeout: std::time::Duration,
    site: String,
) -> SiteResult {
    let mut writer = BatchedWriter::new(
        DirectorySink(env.sink_context()),
        env.settings.batch_size,
        env.settings.max_write_attempts,
    );
    let run = ToolRun {
        tool: tool_name.clone(),
        command,
        timeout,
        log_path: env.tool_output_path(&dir, &tool_name, "log"),
        cwd: Some(dir),
    };
    let scan_id = env.scan_id.clone();
    let outcome = run_streaming_tool(
        &run,
        &env.cancel,
        |line| directories::parse_line(line).map(|r| r.to_snapshot(scan_id.clone())),
        &mut writer,
    )
    .await;

    match outcome {
        Ok(outcome) => {
            let records = writer.close().await.map(|s| s.written).unwrap_or(0);
            SiteResult {
                site,
                records,
                status: outcome.status,
            }
        }
        Err(err) => SiteResult {
            site,
            records: 0,
            status: ToolStatus::Failed(err.to_string()),
        },
    }
}

fn resolve_wordlist_var<C: Clock>(
    env: &StageEnv<C>,
    tool: &ToolConfig,
) -> Result<Option<PathBuf>, EngineError> {
    match &tool.wordlist_name {
        Some(name) => Ok(Some(wordlist::resolve_wordlist(
            &env.settings.wordlist_dir,
            name,
        )?)),
        None => Ok(None),
    }
}

async fn fan_out<C: Clock>(
    env: &Arc<StageEnv<C>>,
    dir: &Path,
    tool_name: &str,
    tool: &ToolConfig,
    sites: &[String],
    tools: &mut ToolStats,
) -> Result<(u64, u64, u64), EngineError> {
    let wordlist_path = match resolve_wordlist_var(env, tool) {
        Ok(path) => path,
        Err(err) => {
            tools.record_failure(tool_name, err.to_string());
            return Ok((0, 0, 0));
        }
    };
    let wordlist_lines = wordlist_path.as_deref().map(wordlist::count_lines).unwrap_or(0);
    let per_site_timeout = timeouts::resolve(tool.timeout, || {
        timeouts::directory_scan_auto(wordlist_lines)
    });
    let max_workers = tool.max_workers.unwrap_or(DEFAULT_MAX_WORKERS).max(1);

    info!(
        sites = sites.len(),
        max_workers,
        timeout_s = per_site_timeout.as_secs(),
        "directory scan fan-out"
    );

    let semaphore = Arc::new(Semaphore::new(max_workers));
    let mut join_set: JoinSet<SiteResult> = JoinSet::new();
    let total = sites.len();
    let mut records = 0u64;
    let mut processed = 0u64;
    let mut failed = 0u64;
    let mut completed_so_far = 0usize;
    let mut next_milestone = 20usize;

    for site in sites {
        if env.cancel.is_cancelled() {
            // Let in-flight sites finish draining below.
            break;
        }
        let vars = super::base_vars(tool, per_site_timeout.as_secs(), Some(&env.target_name))
            .set("url", site.clone());
        let vars = match &wordlist_path {
            Some(path) => vars.set_path("wordlist", path),
            None => vars,
        };
        let command = match render_command(&tool.command, &vars.into_map()) {
            Ok(command) => command,
            Err(err) => {
                warn!(site = %site, error = %err, "command build failed");
                failed += 1;
                continue;
            }
        };

        let permit = semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| EngineError::Cancelled)?;
        let env = env.clone();
        let dir = dir.to_path_buf();
        let tool_name = tool_name.to_string();
        let site = site.clone();
        join_set.spawn(async move {
            let _permit = permit;
            scan_one_site(env, dir, tool_name, command, per_site_timeout, site).await
        });

        // Drain any finished workers so milestones stay timely.
        while let Some(result) = join_set.try_join_next() {
            if let Ok(result) = result {
                completed_so_far += 1;
                records += result.records;
                match result.status {
                    ToolStatus::Succeeded => processed += 1,
                    _ => {
                        failed += 1;
                        warn!(site = %result.site, "site scan failed");
                    }
                }
                let pct = completed_so_far * 100 / total;
                if pct >= next_milestone {
                    info!(completed = completed_so_far, total, pct, "directory scan progress");
                    next_milestone = (pct / 20 + 1) * 20;
                }
            }
        }
    }

    while let Some(result) = join_set.join_next().await {
        if let Ok(result) = result {
            completed_so_far += 1;
            records += result.records;
            match result.status {
                ToolStatus::Succeeded => processed += 1,
                _ => {
                    failed += 1;
                    warn!(site = %result.site, "site scan failed");
                }
            }
            let pct = completed_so_far * 100 / total;
            if pct >= next_milestone {
                info!(completed = completed_so_far, total, pct, "directory scan progress");
                next_milestone = (pct / 20 + 1) * 20;
            }
        }
    }

    if processed > 0 {
        tools.record_success(tool_name);
    } else {
        tools.record_failure(tool_name, "every site failed");
    }
    Ok((records, processed, failed))
}

pub async fn run<C: Clock>(
    env: &Arc<StageEnv<C>>,
    provider: &dyn TargetProvider,
    config: &StageConfig,
) -> Result<StageReport, EngineError> {
    let dir = env.enter_stage(STAGE).await?;

    let export = export_targets(provider, &SOURCES, &dir.join("sites.txt"))?;
    if export.is_empty() {
        return Ok(StageReport::skipped(STAGE, "no sites"));
    }
    let sites = super::read_lines(&export.output_file)?;

    let mut tools = ToolStats::default();
    let mut records = 0u64;
    let mut processed = 0u64;
    let mut failed = 0u64;

    for (tool_name, tool) in config.enabled_tools() {
        if env.cancel.is_cancelled() {
            return Err(EngineError::Cancelled);
        }
        let (tool_records, tool_processed, tool_failed) =
            fan_out(env, &dir, tool_name, tool, &sites, &mut tools).await?;
        records += tool_records;
        processed += tool_processed;
        failed += tool_failed;
    }

    let mut report = StageReport::from_tools(STAGE, records, tools);
    report.detail = format!("processed_sites={processed}, failed_sites_count={failed}");
    Ok(report)
}

#[cfg(test)]
#[path = "directory_scan_tests.rs"]
mod tests;
