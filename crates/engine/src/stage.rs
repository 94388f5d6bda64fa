// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared stage skeleton: environment, observer, report aggregation.
//!
//! Every stage follows the same arc: wait at the load gate, resolve the
//! target name, make a working directory, export inputs, run tools,
//! stream-parse into the sink, and aggregate an outcome. The per-stage
//! modules under [`crate::stages`] fill in the specifics.

use crate::error::EngineError;
use crate::gate;
use crate::runner::ToolOutcome;
use crate::settings::EngineSettings;
use arx_adapters::LoadProbe;
use arx_core::cancel::CancelFlag;
use arx_core::clock::Clock;
use arx_core::scan::ScanId;
use arx_core::stage::{StageKind, StageState};
use arx_core::target::{TargetId, TargetKind};
use arx_storage::{AssetStore, ScanStore, SnapshotStore, TargetStore};
use std::path::PathBuf;
use std::sync::Arc;

/// One tool's failure, with why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolFailure {
    pub tool: String,
    pub reason: String,
}

/// Aggregated per-stage tool statistics.
#[derive(Debug, Clone, Default)]
pub struct ToolStats {
    pub total: u64,
    pub succeeded: Vec<String>,
    pub failed: Vec<ToolFailure>,
}

impl ToolStats {
    pub fn absorb(&mut self, outcome: &ToolOutcome) {
        self.total += 1;
        match &outcome.status {
            crate::runner::ToolStatus::Succeeded => self.succeeded.push(outcome.tool.clone()),
            crate::runner::ToolStatus::TimedOut => self.failed.push(ToolFailure {
                tool: outcome.tool.clone(),
                reason: "timeout".to_string(),
            }),
            crate::runner::ToolStatus::Cancelled => self.failed.push(ToolFailure {
                tool: outcome.tool.clone(),
                reason: "cancelled".to_string(),
            }),
            crate::runner::ToolStatus::Failed(reason) => self.failed.push(ToolFailure {
                tool: outcome.tool.clone(),
                reason: reason.clone(),
            }),
        }
    }

    pub fn record_failure(&mut self, tool: &str, reason: impl Into<String>) {
        self.total += 1;
        self.failed.push(ToolFailure {
            tool: tool.to_string(),
            reason: reason.into(),
        });
    }

    pub fn record_success(&mut self, tool: &str) {
        self.total += 1;
        self.succeeded.push(tool.to_string());
    }
}

/// What a finished stage reports back to the orchestrator.
#[derive(Debug, Clone)]
pub struct StageReport {
    pub stage: StageKind,
    pub state: StageState,
    /// Records written through the sink.
    pub records: u64,
    pub tools: ToolStats,
    pub detail: String,
}

impl StageReport {
    pub fn skipped(stage: StageKind, detail: impl Into<String>) -> Self {
        Self {
            stage,
            state: StageState::Skipped,
            records: 0,
            tools: ToolStats::default(),
            detail: detail.into(),
        }
    }

    /// Classify from tool stats: success if anything produced rows or at
    /// least one tool succeeded; failed only when every tool errored.
    pub fn from_tools(stage: StageKind, records: u64, tools: ToolStats) -> Self {
        let state = if tools.total == 0 {
            StageState::Skipped
        } else if tools.succeeded.is_empty() && records == 0 {
            StageState::Failed
        } else {
            StageState::Completed
        };
        let detail = if tools.failed.is_empty() {
            String::new()
        } else {
            let names: Vec<&str> = tools.failed.iter().map(|f| f.tool.as_str()).collect();
            format!("failed tools: {}", names.join(", "))
        };
        Self {
            stage,
            state,
            records,
            tools,
            detail,
        }
    }
}

/// Progress callbacks, implemented by the orchestrator to persist stage
/// and scan state.
pub trait StageObserver: Send + Sync {
    fn on_stage_start(&self, stage: StageKind);
    fn on_stage_complete(&self, stage: StageKind, report: &StageReport);
    fn on_stage_fail(&self, stage: StageKind, error: &str);
    fn on_stage_skip(&self, stage: StageKind, reason: &str);
}

/// Everything a stage needs, threaded explicitly (no ambient state).
pub struct StageEnv<C: Clock> {
    pub scan_id: ScanId,
    pub target_id: TargetId,
    pub target_name: String,
    pub target_kind: TargetKind,
    /// The scan's results directory; stages make subdirectories per
    /// stage under it.
    pub workspace: PathBuf,
    pub settings: EngineSettings,
    pub probe: Arc<dyn LoadProbe>,
    pub cancel: CancelFlag,
    pub scans: ScanStore<C>,
    pub targets: TargetStore<C>,
    pub assets: AssetStore,
    pub snapshots: SnapshotStore,
    pub clock: C,
}

impl<C: Clock> StageEnv<C> {
    /// Gate on system load, then create and return this stage's working
    /// directory.
    pub async fn enter_stage(&self, stage: StageKind) -> Result<PathBuf, EngineError> {
        if self.cancel.is_cancelled() {
            return Err(EngineError::Cancelled);
        }
        gate::wait_for_capacity(self.probe.as_ref(), &self.settings, stage.as_str()).await;
        let dir = self.workspace.join(stage.as_str());
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    pub fn sink_context(&self) -> crate::sink::SinkContext<C> {
        crate::sink::SinkContext {
            scans: self.scans.clone(),
            snapshots: self.snapshots.clone(),
            assets: self.assets.clone(),
            scan_id: self.scan_id.clone(),
            target_id: self.target_id.clone(),
        }
    }

    /// Unique output file for one tool run inside a stage directory.
    pub fn tool_output_path(&self, dir: &std::path::Path, tool: &str, ext: &str) -> PathBuf {
        let nonce = uuid::Uuid::new_v4().simple().to_string();
        dir.join(format!("{tool}_{}.{ext}", &nonce[..8]))
    }
}

#[cfg(test)]
#[path = "stage_tests.rs"]
mod tests;
