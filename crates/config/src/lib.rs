// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! arx-config: Engine configuration for the scan orchestrator.
//!
//! An engine configuration is a TOML document with one section per stage;
//! each section carries `enabled` plus a map of tools and their options.
//! Multiple engine documents can be merged into the single configuration
//! a scan actually runs with.

pub mod defs;
pub mod merge;
pub mod parser;
pub mod plan;
pub mod template;

pub use defs::{
    EngineConfig, StageConfig, StepConfig, SubdomainDiscoveryConfig, TimeoutSetting, ToolConfig,
    UrlFetchConfig,
};
pub use merge::merge_engine_configs;
pub use parser::{parse_engine_config, ConfigError};
pub use plan::{ExecMode, ExecutionPlan};
pub use template::{render_command, CommandVars, TemplateError};
