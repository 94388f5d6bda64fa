// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subdomain discovery: passive collectors in parallel, optional
//! bruteforce, optional permutation gated by a wildcard-DNS sampling
//! check, and an optional final resolve pass.
//!
//! Intermediate results live in line files merged with byte-order
//! deduplication; the surviving set is validated and written through the
//! subdomain sink. The stage is a no-op for IP and CIDR targets.

use crate::error::EngineError;
use crate::parsers::subdomains;
use crate::provider::TargetProvider;
use crate::sink::SubdomainSink;
use crate::stage::{StageEnv, StageReport, ToolStats};
use crate::timeouts;
use crate::wordlist;
use crate::writer::BatchedWriter;
use arx_adapters::{execute_and_wait_cancellable, ExecError, ExecOptions};
use arx_config::{render_command, CommandVars, StepConfig, SubdomainDiscoveryConfig};
use arx_core::cancel::CancelFlag;
use arx_core::clock::Clock;
use arx_core::snapshot::SubdomainSnapshot;
use arx_core::stage::StageKind;
use arx_core::target::TargetKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{info, warn};

const STAGE: StageKind = StageKind::SubdomainDiscovery;

// Wildcard-DNS sampling: sample `count * 100` permutations and declare a
// wildcard when more than `count * 50` resolve, within a two-hour
// budget. These factors bound memory on very large input sets; changing
// them changes which targets are scannable at all.
const SAMPLE_MULTIPLIER: u64 = 100;
const EXPANSION_THRESHOLD: u64 = 50;
const SAMPLE_TIMEOUT: Duration = Duration::from_secs(7_200);

/// Outcome of one file-output tool run.
enum FileToolResult {
    Output(PathBuf),
    NoOutput,
    Cancelled,
    Failed(String),
}

/// Run one file-output tool to completion. Returns the output file when
/// the tool exited cleanly and produced one.
async fn run_file_tool(
    dir: PathBuf,
    tool_name: String,
    command_template: String,
    timeout: Duration,
    vars: CommandVars,
    cancel: CancelFlag,
) -> (String, FileToolResult) {
    let nonce = uuid::Uuid::new_v4().simple().to_string();
    let output_file = dir.join(format!("{tool_name}_{}.txt", &nonce[..8]));
    let vars = vars.set_path("output_file", &output_file);
    let command = match render_command(&command_template, &vars.into_map()) {
        Ok(command) => command,
        Err(err) => return (tool_name, FileToolResult::Failed(err.to_string())),
    };

    info!(tool = %tool_name, %command, timeout_s = timeout.as_secs(), "running");
    let opts = ExecOptions {
        cwd: Some(dir.clone()),
        timeout: Some(timeout),
        log_path: Some(dir.join(format!("{tool_name}.log"))),
        ..ExecOptions::default()
    };
    let result = match execute_and_wait_cancellable(&command, opts, &cancel).await {
        Ok(outcome) if outcome.success() => {
            if output_file.is_file() {
                FileToolResult::Output(output_file)
            } else {
                FileToolResult::NoOutput
            }
        }
        Ok(outcome) => FileToolResult::Failed(format!(
            "exit {:?}: {}",
            outcome.code,
            outcome.stderr_tail.lines().last().unwrap_or("")
        )),
        Err(ExecError::Cancelled) => FileToolResult::Cancelled,
        Err(err) => FileToolResult::Failed(err.to_string()),
    };
    (tool_name, result)
}

/// Phase 1: passive collectors, in parallel. Returns their output files.
async fn run_passive<C: Clock>(
    env: &StageEnv<C>,
    dir: &Path,
    config: &SubdomainDiscoveryConfig,
    tools: &mut ToolStats,
) -> Vec<PathBuf> {
    let mut join_set: JoinSet<(String, FileToolResult)> = JoinSet::new();
    for (tool_name, tool) in config.passive_tools.iter().filter(|(_, t)| t.enabled) {
        let timeout = timeouts::resolve(tool.timeout, || 600);
        let vars = super::base_vars(tool, timeout.as_secs(), Some(&env.target_name));
        join_set.spawn(run_file_tool(
            dir.to_path_buf(),
            tool_name.clone(),
            tool.command.clone(),
            timeout,
            vars,
            env.cancel.clone(),
        ));
    }

    let mut result_files = Vec::new();
    while let Some(joined) = join_set.join_next().await {
        let Ok((tool_name, result)) = joined else {
            continue;
        };
        match result {
            FileToolResult::Output(file) => {
                tools.record_success(&tool_name);
                result_files.push(file);
            }
            FileToolResult::NoOutput => {
                warn!(tool = %tool_name, "no output file produced");
                tools.record_failure(&tool_name, "no output file");
            }
            FileToolResult::Cancelled => {
                tools.record_failure(&tool_name, "cancelled");
            }
            FileToolResult::Failed(reason) => {
                warn!(tool = %tool_name, %reason, "passive collector failed");
                tools.record_failure(&tool_name, reason);
            }
        }
    }
    result_files
}

/// Phase 2: wordlist bruteforce. Merges new names into `current`.
async fn run_bruteforce<C: Clock>(
    env: &StageEnv<C>,
    dir: &Path,
    step: &StepConfig,
    current: &mut PathBuf,
    tools: &mut ToolStats,
) -> Result<(), EngineError> {
    let Some((tool_name, tool)) = step.tool() else {
        return Ok(());
    };
    let Some(wordlist_name) = &tool.wordlist_name else {
        tools.record_failure(tool_name, "no wordlist configured");
        return Ok(());
    };
    let wordlist_path = match wordlist::resolve_wordlist(&env.settings.wordlist_dir, wordlist_name)
    {
        Ok(path) => path,
        Err(err) => {
            warn!(error = %err, "wordlist preparation failed, skipping bruteforce");
            tools.record_failure(tool_name, err.to_string());
            return Ok(());
        }
    };
    let lines = wordlist::count_lines(&wordlist_path);
    let timeout = timeouts::resolve(tool.timeout, || timeouts::bruteforce_auto(lines));
    let vars = super::base_vars(tool, timeout.as_secs(), Some(&env.target_name))
        .set_path("wordlist", &wordlist_path);

    let (_, result) = run_file_tool(
        dir.to_path_buf(),
        tool_name.clone(),
        tool.command.clone(),
        timeout,
        vars,
        env.cancel.clone(),
    )
    .await;
    match result {
        FileToolResult::Output(file) => {
            let merged = dir.join("subs_merged.txt");
            super::merge_line_files(&[current.clone(), file], &merged)?;
            *current = merged;
            tools.record_success(tool_name);
        }
        FileToolResult::NoOutput => tools.record_failure(tool_name, "no output file"),
        FileToolResult::Cancelled => return Err(EngineError::Cancelled),
        FileToolResult::Failed(reason) => tools.record_failure(tool_name, reason),
    }
    Ok(())
}

/// Phase 3: permutation plus resolution, gated by the sampling check.
async fn run_permutation<C: Clock>(
    env: &StageEnv<C>,
    dir: &Path,
    step: &StepConfig,
    current: &mut PathBuf,
    tools: &mut ToolStats,
) -> Result<(), EngineError> {
    let Some((tool_name, tool)) = step.tool() else {
        return Ok(());
    };
    let before_count = wordlist::count_lines(current);
    if before_count == 0 {
        info!("no seed subdomains, skipping permutation");
        return Ok(());
    }

    if let Some(sample_template) = &tool.sample_command {
        let sample_size = before_count * SAMPLE_MULTIPLIER;
        let max_allowed = before_count * EXPANSION_THRESHOLD;
        let sample_out = dir.join("subs_permuted_sample.txt");
        info!(
            seeds = before_count,
            sample_size, max_allowed, "wildcard sampling check"
        );

        let vars = CommandVars::new()
            .set_path("input_file", current)
            .set_path("output_file", &sample_out)
            .set("sample_size", sample_size.to_string());
        let command = match render_command(sample_template, &vars.into_map()) {
            Ok(command) => command,
            Err(err) => {
                tools.record_failure(tool_name, format!("sample command: {err}"));
                return Ok(());
            }
        };
        let opts = ExecOptions {
            cwd: Some(dir.to_path_buf()),
            timeout: Some(SAMPLE_TIMEOUT),
            log_path: Some(dir.join("wildcard_sample.log")),
            ..ExecOptions::default()
        };
        match execute_and_wait_cancellable(&command, opts, &env.cancel).await {
            Err(ExecError::Cancelled) => return Err(EngineError::Cancelled),
            Err(err) if err.is_timeout() => {
                warn!("sampling check timed out, skipping permutation");
                tools.record_failure(tool_name, "sampling check timed out");
                return Ok(());
            }
            // The sample pipe's exit status does not matter; only the
            // resolved count does.
            _ => {}
        }
        let sample_count = wordlist::count_lines(&sample_out);
        if sample_count > max_allowed {
            let ratio = sample_count as f64 / before_count as f64;
            warn!(
                sample_count,
                max_allowed,
                ratio = format!("{ratio:.1}"),
                "wildcard DNS detected, skipping permutation"
            );
            tools.record_failure(
                tool_name,
                format!("wildcard DNS detected (expansion {ratio:.1}x)"),
            );
            return Ok(());
        }
        info!(sample_count, "sampling check passed");
    }

    let timeout = timeouts::resolve(tool.timeout, || 3_600);
    let vars = super::base_vars(tool, timeout.as_secs(), Some(&env.target_name))
        .set_path("input_file", current);
    let (_, result) = run_file_tool(
        dir.to_path_buf(),
        tool_name.clone(),
        tool.command.clone(),
        timeout,
        vars,
        env.cancel.clone(),
    )
    .await;
    match result {
        FileToolResult::Output(file) => {
            let merged = dir.join("subs_with_permuted.txt");
            super::merge_line_files(&[current.clone(), file], &merged)?;
            *current = merged;
            tools.record_success(tool_name);
        }
        FileToolResult::NoOutput => tools.record_failure(tool_name, "no output file"),
        FileToolResult::Cancelled => return Err(EngineError::Cancelled),
        FileToolResult::Failed(reason) => tools.record_failure(tool_name, reason),
    }
    Ok(())
}

/// Phase 4: DNS liveness resolve. Replaces the current set.
async fn run_resolve<C: Clock>(
    env: &StageEnv<C>,
    dir: &Path,
    step: &StepConfig,
    current: &mut PathBuf,
    tools: &mut ToolStats,
) -> Result<(), EngineError> {
    let Some((tool_name, tool)) = step.tool() else {
        return Ok(());
    };
    let lines = wordlist::count_lines(current);
    let timeout = timeouts::resolve(tool.timeout, || timeouts::resolve_auto(lines));
    let vars = super::base_vars(tool, timeout.as_secs(), Some(&env.target_name))
        .set_path("input_file", current);
    let (_, result) = run_file_tool(
        dir.to_path_buf(),
        tool_name.clone(),
        tool.command.clone(),
        timeout,
        vars,
        env.cancel.clone(),
    )
    .await;
    match result {
        FileToolResult::Output(file) => {
            *current = file;
            tools.record_success(tool_name);
        }
        FileToolResult::NoOutput => tools.record_failure(tool_name, "no output file"),
        FileToolResult::Cancelled => return Err(EngineError::Cancelled),
        FileToolResult::Failed(reason) => tools.record_failure(tool_name, reason),
    }
    Ok(())
}

/// Final: validate names and persist through the subdomain sink. Only
/// names under the root domain survive.
async fn save_results<C: Clock>(
    env: &StageEnv<C>,
    current: &Path,
) -> Result<u64, EngineError> {
    let suffix = format!(".{}", env.target_name);
    let mut writer = BatchedWriter::new(
        SubdomainSink(env.sink_context()),
        env.settings.batch_size,
        env.settings.max_write_attempts,
    );
    for line in super::read_lines(current)? {
        let Some(name) = subdomains::parse_line(&line) else {
            continue;
        };
        if name != env.target_name && !name.ends_with(&suffix) {
            continue;
        }
        writer
            .submit(SubdomainSnapshot {
                scan_id: env.scan_id.clone(),
                name,
            })
            .await?;
    }
    Ok(writer.close().await?.written)
}

fn step_enabled(step: &Option<StepConfig>) -> Option<&StepConfig> {
    step.as_ref().filter(|s| s.enabled)
}

pub async fn run<C: Clock>(
    env: &Arc<StageEnv<C>>,
    _provider: &dyn TargetProvider,
    config: &SubdomainDiscoveryConfig,
) -> Result<StageReport, EngineError> {
    if env.target_kind != TargetKind::Domain {
        info!(kind = %env.target_kind, "subdomain discovery only applies to domains");
        return Ok(StageReport::skipped(STAGE, "target is not a domain"));
    }

    let dir = env.enter_stage(STAGE).await?;
    let mut tools = ToolStats::default();

    // Phase 1: passive collection (parallel).
    let result_files = run_passive(env, &dir, config, &mut tools).await;
    let mut current = dir.join("subs_passive.txt");
    let merged = super::merge_line_files(&result_files, &current)?;
    info!(merged, "passive collection merged");

    // Phase 2: bruteforce.
    if let Some(step) = step_enabled(&config.bruteforce) {
        if env.cancel.is_cancelled() {
            return Err(EngineError::Cancelled);
        }
        run_bruteforce(env, &dir, step, &mut current, &mut tools).await?;
    }

    // Phase 3: permutation behind the wildcard gate.
    if let Some(step) = step_enabled(&config.permutation) {
        if env.cancel.is_cancelled() {
            return Err(EngineError::Cancelled);
        }
        run_permutation(env, &dir, step, &mut current, &mut tools).await?;
    }

    // Phase 4: liveness resolve.
    if let Some(step) = step_enabled(&config.resolve) {
        if env.cancel.is_cancelled() {
            return Err(EngineError::Cancelled);
        }
        run_resolve(env, &dir, step, &mut current, &mut tools).await?;
    }

    let records = save_results(env, &current).await?;
    info!(records, "subdomain discovery complete");
    Ok(StageReport::from_tools(STAGE, records, tools))
}

#[cfg(test)]
#[path = "subdomain_discovery_tests.rs"]
mod tests;
