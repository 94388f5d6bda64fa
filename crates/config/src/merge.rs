// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Multi-engine configuration merge.
//!
//! A scan can run several engines at once; their documents merge into the
//! one configuration the orchestrator executes. A stage is enabled if any
//! engine enables it; later engines add tools and override same-named
//! tools in earlier engines.

use crate::defs::{EngineConfig, StageConfig, StepConfig};
use crate::parser::{parse_engine_config, ConfigError};
use indexmap::IndexMap;

fn merge_tool_maps<V: Clone>(dest: &mut IndexMap<String, V>, src: &IndexMap<String, V>) {
    for (name, tool) in src {
        dest.insert(name.clone(), tool.clone());
    }
}

fn merge_stage(dest: &mut Option<StageConfig>, src: &Option<StageConfig>) {
    let Some(src) = src else { return };
    let dest = dest.get_or_insert_with(StageConfig::default);
    dest.enabled |= src.enabled;
    merge_tool_maps(&mut dest.tools, &src.tools);
}

fn merge_step(dest: &mut Option<StepConfig>, src: &Option<StepConfig>) {
    let Some(src) = src else { return };
    let dest = dest.get_or_insert_with(StepConfig::default);
    dest.enabled |= src.enabled;
    merge_tool_maps(&mut dest.tools, &src.tools);
}

fn merge_into(dest: &mut EngineConfig, src: &EngineConfig) {
    if let Some(src_sub) = &src.subdomain_discovery {
        let dest_sub = dest.subdomain_discovery.get_or_insert_with(Default::default);
        dest_sub.enabled |= src_sub.enabled;
        merge_tool_maps(&mut dest_sub.passive_tools, &src_sub.passive_tools);
        merge_step(&mut dest_sub.bruteforce, &src_sub.bruteforce);
        merge_step(&mut dest_sub.permutation, &src_sub.permutation);
        merge_step(&mut dest_sub.resolve, &src_sub.resolve);
    }
    if let Some(src_fetch) = &src.url_fetch {
        let dest_fetch = dest.url_fetch.get_or_insert_with(Default::default);
        dest_fetch.enabled |= src_fetch.enabled;
        merge_tool_maps(&mut dest_fetch.domain_tools, &src_fetch.domain_tools);
        merge_tool_maps(&mut dest_fetch.site_tools, &src_fetch.site_tools);
    }
    merge_stage(&mut dest.port_scan, &src.port_scan);
    merge_stage(&mut dest.site_scan, &src.site_scan);
    merge_stage(&mut dest.directory_scan, &src.directory_scan);
    merge_stage(&mut dest.fingerprint_detect, &src.fingerprint_detect);
    merge_stage(&mut dest.screenshot, &src.screenshot);
    merge_stage(&mut dest.vuln_scan, &src.vuln_scan);
}

/// Merge engine documents in order and return the merged document text
/// alongside the parsed configuration. The text is what gets stored on
/// the scan row.
pub fn merge_engine_configs(texts: &[String]) -> Result<(String, EngineConfig), ConfigError> {
    let mut merged = EngineConfig::default();
    for text in texts {
        let config = parse_engine_config(text)?;
        merge_into(&mut merged, &config);
    }
    let text = toml::to_string_pretty(&merged)?;
    Ok((text, merged))
}

#[cfg(test)]
#[path = "merge_tests.rs"]
mod tests;
