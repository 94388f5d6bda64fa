// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! URL fetch: collect endpoint URLs two ways.
//!
//! Passive collectors query archives once per root domain (skipped for
//! IP and CIDR targets, which have no root domain). Crawlers walk the
//! known websites from a sites file. Both feed the endpoint sink.

use crate::error::EngineError;
use crate::export::{export_targets, ExportSource};
use crate::parsers::http::{self, HttpRecord};
use crate::provider::TargetProvider;
use crate::runner::{run_streaming_tool, ToolRun};
use crate::sink::EndpointSink;
use crate::stage::{StageEnv, StageReport, ToolStats};
use crate::timeouts;
use crate::writer::BatchedWriter;
use arx_config::{render_command, ToolConfig, UrlFetchConfig};
use arx_core::clock::Clock;
use arx_core::sanitize::sanitize;
use arx_core::snapshot::EndpointSnapshot;
use arx_core::stage::StageKind;
use arx_core::target::TargetKind;
use std::path::Path;
use tracing::info;

const STAGE: StageKind = StageKind::UrlFetch;

const SITE_SOURCES: [ExportSource; 2] = [ExportSource::Websites, ExportSource::Default];

/// Collectors emit either prober-style JSON or bare URL lines.
fn parse_url_line(line: &str) -> Option<HttpRecord> {
    if let Some(record) = http::parse_line(line) {
        if record.failed {
            return None;
        }
        return Some(record);
    }
    let cleaned = sanitize(line);
    let trimmed = cleaned.trim();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        return Some(HttpRecord {
            url: trimmed.to_string(),
            host: arx_core::net::extract_hostname(trimmed),
            ..HttpRecord::default()
        });
    }
    None
}

#[allow(clippy::too_many_arguments)]
async fn run_url_tool<C: Clock>(
    env: &StageEnv<C>,
    dir: &Path,
    tool_name: &str,
    tool: &ToolConfig,
    input_lines: u64,
    input_file: Option<&Path>,
    tools: &mut ToolStats,
    records: &mut u64,
) -> Result<(), EngineError> {
    let timeout = timeouts::resolve(tool.timeout, || timeouts::url_tool_auto(input_lines));
    let mut vars = super::base_vars(tool, timeout.as_secs(), Some(&env.target_name))
        .set_path("output_file", &env.tool_output_path(dir, tool_name, "out"));
    if let Some(input_file) = input_file {
        vars = vars.set_path("input_file", input_file);
    }

    let command = match render_command(&tool.command, &vars.into_map()) {
        Ok(command) => command,
        Err(err) => {
            tools.record_failure(tool_name, err.to_string());
            return Ok(());
        }
    };

    let mut writer = BatchedWriter::new(
        EndpointSink(env.sink_context()),
        env.settings.batch_size,
        env.settings.max_write_attempts,
    );
    let run = ToolRun {
        tool: tool_name.to_string(),
        command,
        timeout,
        log_path: dir.join(format!("{tool_name}.log")),
        cwd: Some(dir.to_path_buf()),
    };
    let scan_id = env.scan_id.clone();
    let outcome = run_streaming_tool(
        &run,
        &env.cancel,
        |line| {
            parse_url_line(line).map(|r| -> EndpointSnapshot { r.to_endpoint_snapshot(scan_id.clone()) })
        },
        &mut writer,
    )
    .await?;
    *records += writer.close().await?.written;
    tools.absorb(&outcome);
    if outcome.status == crate::runner::ToolStatus::Cancelled {
        return Err(EngineError::Cancelled);
    }
    Ok(())
}

pub async fn run<C: Clock>(
    env: &StageEnv<C>,
    provider: &dyn TargetProvider,
    config: &UrlFetchConfig,
) -> Result<StageReport, EngineError> {
    let dir = env.enter_stage(STAGE).await?;

    let mut tools = ToolStats::default();
    let mut records = 0u64;

    // Sub-flow A: passive, once per root domain.
    if env.target_kind == TargetKind::Domain {
        for (tool_name, tool) in config.domain_tools.iter().filter(|(_, t)| t.enabled) {
            if env.cancel.is_cancelled() {
                return Err(EngineError::Cancelled);
            }
            run_url_tool(env, &dir, tool_name, tool, 1, None, &mut tools, &mut records).await?;
        }
    } else if !config.domain_tools.is_empty() {
        info!(kind = %env.target_kind, "skipping passive URL collectors for non-domain target");
    }

    // Sub-flow B: crawlers over the sites file.
    let enabled_crawlers: Vec<_> = config.site_tools.iter().filter(|(_, t)| t.enabled).collect();
    if !enabled_crawlers.is_empty() {
        let export = export_targets(provider, &SITE_SOURCES, &dir.join("sites.txt"))?;
        if export.is_empty() {
            info!("no sites to crawl");
        } else {
            for (tool_name, tool) in enabled_crawlers {
                if env.cancel.is_cancelled() {
                    return Err(EngineError::Cancelled);
                }
                run_url_tool(
                    env,
                    &dir,
                    tool_name,
                    tool,
                    export.written,
                    Some(&export.output_file),
                    &mut tools,
                    &mut records,
                )
                .await?;
            }
        }
    }

    if tools.total == 0 {
        return Ok(StageReport::skipped(STAGE, "no applicable tools"));
    }
    Ok(StageReport::from_tools(STAGE, records, tools))
}

#[cfg(test)]
#[path = "url_fetch_tests.rs"]
mod tests;
