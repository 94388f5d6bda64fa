// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Port scan: probe the target name (CIDR expanded) plus every known
//! subdomain.

use crate::error::EngineError;
use crate::parsers::ports;
use crate::provider::TargetProvider;
use crate::runner::{run_streaming_tool, ToolRun};
use crate::sink::HostPortSink;
use crate::stage::{StageEnv, StageReport, ToolStats};
use crate::timeouts;
use crate::writer::BatchedWriter;
use arx_config::{render_command, StageConfig};
use arx_core::clock::Clock;
use arx_core::net::expand_cidr;
use arx_core::stage::StageKind;
use arx_core::target::TargetKind;
use std::collections::BTreeSet;
use std::io::Write;
use tracing::{info, warn};

const STAGE: StageKind = StageKind::PortScan;

/// Write the scan input file: the target itself plus its subdomains,
/// deduplicated, all blacklist-checked.
fn write_hosts_file<C: Clock>(
    env: &StageEnv<C>,
    provider: &dyn TargetProvider,
    path: &std::path::Path,
) -> Result<u64, EngineError> {
    let blacklist = provider.blacklist();
    let allowed = |value: &str| blacklist.as_ref().map(|f| f.is_allowed(value)).unwrap_or(true);

    let mut hosts: BTreeSet<String> = BTreeSet::new();
    match env.target_kind {
        TargetKind::Domain | TargetKind::Ip => {
            if allowed(&env.target_name) {
                hosts.insert(env.target_name.clone());
            }
        }
        TargetKind::Cidr => match expand_cidr(&env.target_name) {
            Ok(ips) => {
                for ip in ips {
                    let ip = ip.to_string();
                    if allowed(&ip) {
                        hosts.insert(ip);
                    }
                }
            }
            Err(err) => warn!(target = %env.target_name, error = %err, "CIDR expansion failed"),
        },
    }

    let mut subdomains = provider.subdomains();
    while let Some(name) = subdomains.next_value()? {
        hosts.insert(name);
    }

    let mut writer = std::io::BufWriter::new(std::fs::File::create(path)?);
    for host in &hosts {
        writer.write_all(host.as_bytes())?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(hosts.len() as u64)
}

pub async fn run<C: Clock>(
    env: &StageEnv<C>,
    provider: &dyn TargetProvider,
    config: &StageConfig,
) -> Result<StageReport, EngineError> {
    let dir = env.enter_stage(STAGE).await?;

    let hosts_file = dir.join("hosts.txt");
    let host_count = write_hosts_file(env, provider, &hosts_file)?;
    if host_count == 0 {
        return Ok(StageReport::skipped(STAGE, "no hosts to scan"));
    }
    info!(hosts = host_count, "port scanning");

    let mut tools = ToolStats::default();
    let mut records = 0u64;

    // Port scanners run one at a time; two of them fighting over the
    // same network path just slows both down.
    for (tool_name, tool) in config.enabled_tools() {
        if env.cancel.is_cancelled() {
            return Err(EngineError::Cancelled);
        }
        let timeout = timeouts::resolve(tool.timeout, || {
            timeouts::port_scan_auto(host_count, tool.port_count())
        });
        let vars = super::base_vars(tool, timeout.as_secs(), Some(&env.target_name))
            .set_path("input_file", &hosts_file)
            .set_path("output_file", &env.tool_output_path(&dir, tool_name, "out"));

        let command = match render_command(&tool.command, &vars.into_map()) {
            Ok(command) => command,
            Err(err) => {
                tools.record_failure(tool_name, err.to_string());
                continue;
            }
        };

        let mut writer = BatchedWriter::new(
            HostPortSink(env.sink_context()),
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
            |line| ports::parse_line(line).map(|r| r.to_snapshot(scan_id.clone())),
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
#[path = "port_scan_tests.rs"]
mod tests;
