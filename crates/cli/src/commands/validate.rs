// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `arx validate` command.

use anyhow::Context;
use std::path::PathBuf;

pub fn run(engine: PathBuf) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(&engine)
        .with_context(|| format!("reading engine config {}", engine.display()))?;
    let config = arx_config::parse_engine_config(&text)?;

    let stages = config.enabled_stages();
    if stages.is_empty() {
        println!("{}: valid, no stages enabled", engine.display());
        return Ok(());
    }
    println!("{}: valid", engine.display());
    for stage in stages {
        println!("  {stage}");
    }
    Ok(())
}
