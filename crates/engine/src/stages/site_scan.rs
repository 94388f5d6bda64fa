// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Site scan: probe host:port URLs and persist the live websites.

use crate::error::EngineError;
use crate::export::{export_targets, ExportSource};
use crate::parsers::http;
use crate::provider::TargetProvider;
use crate::runner::{run_streaming_tool, ToolRun};
use crate::sink::WebsiteSink;
use crate::stage::{StageEnv, StageReport, ToolStats};
use crate::timeouts;
use crate::writer::BatchedWriter;
use arx_config::{render_command, StageConfig};
use arx_core::clock::Clock;
use arx_core::stage::StageKind;
use arx_storage::MergeMode;
use tracing::info;

const STAGE: StageKind = StageKind::SiteScan;

/// Fall-back chain: probe what the port scan found; with no port data,
/// probe the subdomains directly; with nothing at all, probe the target.
const SOURCES: [ExportSource; 3] = [
    ExportSource::HostPorts,
    ExportSource::SubdomainUrls,
    ExportSource::Default,
];

pub async fn run<C: Clock>(
    env: &StageEnv<C>,
    provider: &dyn TargetProvider,
    config: &StageConfig,
) -> Result<StageReport, EngineError> {
    let dir = env.enter_stage(STAGE).await?;

    let export = export_targets(provider, &SOURCES, &dir.join("urls.txt"))?;
    if export.is_empty() {
        return Ok(StageReport::skipped(STAGE, "no input URLs"));
    }
    info!(
        count = export.written,
        source = %export.source.map(|s| s.to_string()).unwrap_or_default(),
        "probing URLs"
    );

    let mut tools = ToolStats::default();
    let mut records = 0u64;

    for (tool_name, tool) in config.enabled_tools() {
        if env.cancel.is_cancelled() {
            return Err(EngineError::Cancelled);
        }
        let timeout = timeouts::resolve(tool.timeout, || {
            timeouts::site_scan_auto(export.written)
        });
        let vars = super::base_vars(tool, timeout.as_secs(), Some(&env.target_name))
            .set_path("input_file", &export.output_file)
            .set_path("output_file", &env.tool_output_path(&dir, tool_name, "out"));

        let command = match render_command(&tool.command, &vars.into_map()) {
            Ok(command) => command,
            Err(err) => {
                tools.record_failure(tool_name, err.to_string());
                continue;
            }
        };

        let sink = WebsiteSink {
            ctx: env.sink_context(),
            merge_mode: MergeMode::Overwrite,
        };
        let mut writer = BatchedWriter::new(
            sink,
            env.settings.batch_size,
            env.settings.max_write_attempts,
        );
        let run = ToolRun {
            tool: tool_name.clone(),
            command,
            timeout,
            log_path: dir.join(format!("{tool_name}.log")),
            cwd: Some(dir.clone()),
        };
        let scan_id = env.scan_id.clone();
        let outcome = run_streaming_tool(
            &run,
            &env.cancel,
            |line| {
                http::parse_line(line)
                    .filter(|r| !r.failed)
                    .map(|r| r.to_website_snapshot(scan_id.clone()))
            },
            &mut writer,
        )
        .await?;
        records += writer.close().await?.written;
        tools.absorb(&outcome);
        if outcome.status == crate::runner::ToolStatus::Cancelled {
            return Err(EngineError::Cancelled);
        }
    }

    Ok(StageReport::from_tools(STAGE, records, tools))
}

#[cfg(test)]
#[path = "site_scan_tests.rs"]
mod tests;
