// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Execution plan: ordered groups of stages with their execution mode.

use crate::defs::EngineConfig;
use arx_core::stage::StageKind;

/// How the stages in one group are driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecMode {
    Sequential,
    Parallel,
}

/// The ordered execution groups for one scan.
///
/// Conventional layout: discovery stages run sequentially (each feeds the
/// next), then the analysis stages fan out in parallel. Only enabled
/// stages appear; empty groups are dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionPlan {
    pub groups: Vec<(ExecMode, Vec<StageKind>)>,
}

impl ExecutionPlan {
    pub fn from_config(config: &EngineConfig) -> Self {
        let discovery: Vec<StageKind> = StageKind::DISCOVERY
            .into_iter()
            .filter(|s| config.is_enabled(*s))
            .collect();
        let analysis: Vec<StageKind> = StageKind::ANALYSIS
            .into_iter()
            .filter(|s| config.is_enabled(*s))
            .collect();

        let mut groups = Vec::new();
        if !discovery.is_empty() {
            groups.push((ExecMode::Sequential, discovery));
        }
        if !analysis.is_empty() {
            groups.push((ExecMode::Parallel, analysis));
        }
        Self { groups }
    }

    /// All planned stages in execution order.
    pub fn stages(&self) -> Vec<StageKind> {
        self.groups
            .iter()
            .flat_map(|(_, stages)| stages.iter().copied())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

#[cfg(test)]
#[path = "plan_tests.rs"]
mod tests;
