// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fingerprint detection over known website URLs.
//!
//! Results merge into existing website rows with fill-only-if-empty
//! semantics for the scalars: a probe's title or status never gets
//! clobbered by the fingerprinter, while the tech set always unions.

use crate::error::EngineError;
use crate::export::{export_targets, ExportSource};
use crate::parsers::fingerprint;
use crate::provider::TargetProvider;
use crate::runner::{run_streaming_tool, ToolRun};
use crate::sink::WebsiteSink;
use crate::stage::{StageEnv, StageReport, ToolStats};
use crate::timeouts;
use crate::writer::BatchedWriter;
use arx_config::{render_command, StageConfig, ToolConfig};
use arx_core::clock::Clock;
use arx_core::stage::StageKind;
use arx_storage::MergeMode;
use tracing::warn;

const STAGE: StageKind = StageKind::FingerprintDetect;

const SOURCES: [ExportSource; 2] = [ExportSource::Websites, ExportSource::Default];

/// Resolve configured fingerprint library names to local files; missing
/// libraries are skipped with a warning rather than failing the tool.
fn resolve_libs<C: Clock>(env: &StageEnv<C>, tool: &ToolConfig) -> Vec<String> {
    tool.fingerprint_libs
        .iter()
        .filter_map(|name| {
            let path = env.settings.fingerprint_dir.join(format!("{name}.json"));
            if path.is_file() {
                Some(path.display().to_string())
            } else {
                warn!(lib = %name, "fingerprint library not found, skipping");
                None
            }
        })
        .collect()
}

pub async fn run<C: Clock>(
    env: &StageEnv<C>,
    provider: &dyn TargetProvider,
    config: &StageConfig,
) -> Result<StageReport, EngineError> {
    let dir = env.enter_stage(STAGE).await?;

    let export = export_targets(provider, &SOURCES, &dir.join("urls.txt"))?;
    if export.is_empty() {
        return Ok(StageReport::skipped(STAGE, "no website URLs"));
    }

    let mut tools = ToolStats::default();
    let mut records = 0u64;

    for (tool_name, tool) in config.enabled_tools() {
        if env.cancel.is_cancelled() {
            return Err(EngineError::Cancelled);
        }
        let timeout = timeouts::resolve(tool.timeout, || {
            timeouts::fingerprint_auto(export.written)
        });
        let libs = resolve_libs(env, tool);
        let vars = super::base_vars(tool, timeout.as_secs(), Some(&env.target_name))
            .set_path("input_file", &export.output_file)
            .set_path("output_file", &env.tool_output_path(&dir, tool_name, "json"))
            .set("fingerprint_libs", libs.join(","));

        let command = match render_command(&tool.command, &vars.into_map()) {
            Ok(command) => command,
            Err(err) => {
                tools.record_failure(tool_name, err.to_string());
                continue;
            }
        };

        let sink = WebsiteSink {
            ctx: env.sink_context(),
            merge_mode: MergeMode::FillEmpty,
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
            |line| fingerprint::parse_line(line).map(|r| r.to_website_snapshot(scan_id.clone())),
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
#[path = "fingerprint_detect_tests.rs"]
mod tests;
