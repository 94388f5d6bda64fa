// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The eight scan stages.
//!
//! Each module exposes `run(env, provider, config)` returning a
//! [`crate::stage::StageReport`]. Stages are polymorphic over the
//! provider: none of them knows whether it is reading the asset
//! inventory or the current scan's snapshots.

pub mod directory_scan;
pub mod fingerprint_detect;
pub mod port_scan;
pub mod screenshot;
pub mod site_scan;
pub mod subdomain_discovery;
pub mod url_fetch;
pub mod vuln_scan;

use crate::error::EngineError;
use arx_config::{CommandVars, ToolConfig};
use std::path::Path;

/// Build the standard template variables for a tool invocation.
///
/// Only variables with values are bound; a template referencing a
/// variable this stage cannot supply fails to render and the tool is
/// recorded as failed, which beats silently running a half-built
/// command.
pub(crate) fn base_vars(
    tool: &ToolConfig,
    timeout_secs: u64,
    domain: Option<&str>,
) -> CommandVars {
    let mut vars = CommandVars::new().set("timeout", timeout_secs.to_string());
    if let Some(domain) = domain {
        vars = vars.set("domain", domain);
    }
    if let Some(concurrency) = tool.concurrency {
        vars = vars.set("concurrency", concurrency.to_string());
    }
    if let Some(rate) = tool.rate {
        vars = vars.set("rate", rate.to_string());
    }
    vars
}

/// Merge line files into `out`, deduplicating in byte order (the
/// `sort -u` the shell pipelines used).
pub(crate) fn merge_line_files(
    inputs: &[std::path::PathBuf],
    out: &Path,
) -> Result<u64, EngineError> {
    use std::collections::BTreeSet;
    use std::io::{BufRead, BufReader, Write};

    let mut merged: BTreeSet<String> = BTreeSet::new();
    for path in inputs {
        let Ok(file) = std::fs::File::open(path) else {
            continue;
        };
        for line in BufReader::new(file).lines().map_while(Result::ok) {
            let line = line.trim().to_string();
            if !line.is_empty() {
                merged.insert(line);
            }
        }
    }
    let mut writer = std::io::BufWriter::new(std::fs::File::create(out)?);
    for line in &merged {
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(merged.len() as u64)
}

/// Read the non-empty lines of a file.
pub(crate) fn read_lines(path: &Path) -> Result<Vec<String>, EngineError> {
    use std::io::{BufRead, BufReader};
    let file = std::fs::File::open(path)?;
    Ok(BufReader::new(file)
        .lines()
        .map_while(Result::ok)
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .collect())
}
