// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Vulnerability scan over endpoint URLs.

use crate::error::EngineError;
use crate::export::{export_targets, ExportSource};
use crate::parsers::vulns;
use crate::provider::TargetProvider;
use crate::runner::{run_streaming_tool, ToolRun};
use crate::sink::VulnerabilitySink;
use crate::stage::{StageEnv, StageReport, ToolStats};
use crate::timeouts;
use crate::writer::BatchedWriter;
use arx_config::{render_command, StageConfig};
use arx_core::clock::Clock;
use arx_core::stage::StageKind;

const STAGE: StageKind = StageKind::VulnScan;

/// Endpoints carry the parameters scanners want; fall back to plain
/// website URLs, then to the target itself.
const SOURCES: [ExportSource; 3] = [
    ExportSource::Endpoints,
    ExportSource::Websites,
    ExportSource::Default,
];

pub async fn run<C: Clock>(
    env: &StageEnv<C>,
    provider: &dyn TargetProvider,
    config: &StageConfig,
) -> Result<StageReport, EngineError> {
    let dir = env.enter_stage(STAGE).await?;

    let export = export_targets(provider, &SOURCES, &dir.join("endpoints.txt"))?;
    if export.is_empty() {
        return Ok(StageReport::skipped(STAGE, "no input URLs"));
    }

    let mut tools = ToolStats::default();
    let mut records = 0u64;

    for (tool_name, tool) in config.enabled_tools() {
        if env.cancel.is_cancelled() {
            return Err(EngineError::Cancelled);
        }
        let timeout = timeouts::resolve(tool.timeout, || {
            timeouts::url_tool_auto(export.written)
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

        let mut writer = BatchedWriter::new(
            VulnerabilitySink(env.sink_context()),
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
        let source = tool_name.clone();
        let outcome = run_streaming_tool(
            &run,
            &env.cancel,
            |line| vulns::parse_line(line).map(|r| r.to_snapshot(scan_id.clone(), &source)),
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
#[path = "vuln_scan_tests.rs"]
mod tests;
