// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scan rows and the scan status state machine.

use crate::stage::StageState;
use crate::target::TargetId;
use crate::worker::WorkerId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

crate::define_id! {
    /// Unique identifier for one orchestrator run against one target.
    #[derive(Default)]
    pub struct ScanId;
}

/// Full scans read the target's asset inventory; quick scans read only the
/// snapshots produced earlier in the same run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanMode {
    #[default]
    Full,
    Quick,
}

impl fmt::Display for ScanMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanMode::Full => write!(f, "full"),
            ScanMode::Quick => write!(f, "quick"),
        }
    }
}

/// Scan lifecycle status. Terminal states are never left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanStatus {
    Initiated,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl ScanStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ScanStatus::Completed | ScanStatus::Failed | ScanStatus::Cancelled
        )
    }

    /// Whether moving from `self` to `next` is a legal transition.
    ///
    /// Terminal states are sticky; INITIATED may move anywhere, RUNNING
    /// may only move to a terminal state.
    pub fn can_transition_to(&self, next: ScanStatus) -> bool {
        if *self == next {
            return false;
        }
        match self {
            ScanStatus::Initiated => true,
            ScanStatus::Running => next.is_terminal(),
            _ => false,
        }
    }
}

impl fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanStatus::Initiated => write!(f, "initiated"),
            ScanStatus::Running => write!(f, "running"),
            ScanStatus::Completed => write!(f, "completed"),
            ScanStatus::Failed => write!(f, "failed"),
            ScanStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// One entry in the ordered per-stage progress list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageProgress {
    pub name: String,
    pub status: StageState,
}

/// Cached asset counts, refreshed when a scan completes.
///
/// Derived data: must equal the live count of the corresponding rows
/// (asset rows for FULL mode, snapshot rows for QUICK mode) at the moment
/// `stats_updated_at_ms` was stamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScanCounts {
    pub subdomains: u64,
    pub host_ports: u64,
    pub websites: u64,
    pub endpoints: u64,
    pub directories: u64,
    pub screenshots: u64,
    pub vulns_total: u64,
    pub vulns_critical: u64,
    pub vulns_high: u64,
    pub vulns_medium: u64,
    pub vulns_low: u64,
}

/// One execution of the orchestrator against one target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scan {
    pub id: ScanId,
    pub target_id: TargetId,
    #[serde(default)]
    pub engine_ids: Vec<String>,
    #[serde(default)]
    pub engine_names: Vec<String>,
    /// Merged engine configuration, stored as the text that was dispatched.
    #[serde(default)]
    pub config_text: String,
    #[serde(default)]
    pub mode: ScanMode,
    pub status: ScanStatus,
    pub created_at_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stopped_at_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worker_id: Option<WorkerId>,
    /// Globally unique on-disk workspace for this scan's results.
    pub results_dir: PathBuf,
    #[serde(default)]
    pub container_ids: Vec<String>,
    #[serde(default)]
    pub error_message: String,
    /// 0-100, derived from settled stages over total stages.
    #[serde(default)]
    pub progress: u8,
    #[serde(default)]
    pub current_stage: String,
    #[serde(default)]
    pub stage_progress: Vec<StageProgress>,
    #[serde(default)]
    pub counts: ScanCounts,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats_updated_at_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at_ms: Option<u64>,
}

impl Scan {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at_ms.is_some()
    }

    /// Recompute `progress` from the stage list: completed stages over
    /// total, as an integer percentage.
    pub fn recompute_progress(&mut self) {
        let total = self.stage_progress.len();
        if total == 0 {
            return;
        }
        let done = self
            .stage_progress
            .iter()
            .filter(|s| s.status == StageState::Completed)
            .count();
        self.progress = ((done * 100) / total) as u8;
    }

    pub fn stage_mut(&mut self, name: &str) -> Option<&mut StageProgress> {
        self.stage_progress.iter_mut().find(|s| s.name == name)
    }
}

#[cfg(test)]
#[path = "scan_tests.rs"]
mod tests;
