// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine configuration parsing and structural validation.

use crate::defs::{EngineConfig, StepConfig, ToolConfig};
use indexmap::IndexMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid engine config: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("stage {stage}: tool {tool}: {message}")]
    InvalidTool {
        stage: String,
        tool: String,
        message: String,
    },
    #[error("stage {stage}: {message}")]
    InvalidStage { stage: String, message: String },
    #[error("config serialization failed: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Parse and validate an engine configuration document.
pub fn parse_engine_config(text: &str) -> Result<EngineConfig, ConfigError> {
    let config: EngineConfig = toml::from_str(text)?;
    validate(&config)?;
    Ok(config)
}

fn validate_tools(
    stage: &str,
    tools: &IndexMap<String, ToolConfig>,
) -> Result<(), ConfigError> {
    for (name, tool) in tools {
        if tool.command.trim().is_empty() {
            return Err(ConfigError::InvalidTool {
                stage: stage.to_string(),
                tool: name.clone(),
                message: "empty command template".to_string(),
            });
        }
        if tool.max_workers == Some(0) {
            return Err(ConfigError::InvalidTool {
                stage: stage.to_string(),
                tool: name.clone(),
                message: "max_workers must be at least 1".to_string(),
            });
        }
        if tool.concurrency == Some(0) {
            return Err(ConfigError::InvalidTool {
                stage: stage.to_string(),
                tool: name.clone(),
                message: "concurrency must be at least 1".to_string(),
            });
        }
    }
    Ok(())
}

fn validate_step(stage: &str, step: &Option<StepConfig>) -> Result<(), ConfigError> {
    if let Some(step) = step {
        validate_tools(stage, &step.tools)?;
        if step.enabled && step.tool().is_none() {
            return Err(ConfigError::InvalidStage {
                stage: stage.to_string(),
                message: "step enabled but has no enabled tool".to_string(),
            });
        }
    }
    Ok(())
}

fn validate(config: &EngineConfig) -> Result<(), ConfigError> {
    if let Some(sub) = &config.subdomain_discovery {
        validate_tools("subdomain_discovery", &sub.passive_tools)?;
        validate_step("subdomain_discovery.bruteforce", &sub.bruteforce)?;
        validate_step("subdomain_discovery.permutation", &sub.permutation)?;
        validate_step("subdomain_discovery.resolve", &sub.resolve)?;
        if sub.enabled && sub.passive_tools.is_empty() {
            return Err(ConfigError::InvalidStage {
                stage: "subdomain_discovery".to_string(),
                message: "enabled but has no passive tools".to_string(),
            });
        }
    }
    if let Some(fetch) = &config.url_fetch {
        validate_tools("url_fetch.domain_tools", &fetch.domain_tools)?;
        validate_tools("url_fetch.site_tools", &fetch.site_tools)?;
        if fetch.enabled && fetch.domain_tools.is_empty() && fetch.site_tools.is_empty() {
            return Err(ConfigError::InvalidStage {
                stage: "url_fetch".to_string(),
                message: "enabled but has no tools".to_string(),
            });
        }
    }
    for (name, stage) in [
        ("port_scan", &config.port_scan),
        ("site_scan", &config.site_scan),
        ("directory_scan", &config.directory_scan),
        ("fingerprint_detect", &config.fingerprint_detect),
        ("screenshot", &config.screenshot),
        ("vuln_scan", &config.vuln_scan),
    ] {
        if let Some(stage_config) = stage {
            validate_tools(name, &stage_config.tools)?;
            if stage_config.enabled && stage_config.tools.is_empty() {
                return Err(ConfigError::InvalidStage {
                    stage: name.to_string(),
                    message: "enabled but has no tools".to_string(),
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "parser_tests.rs"]
mod tests;
