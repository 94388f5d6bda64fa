// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker nodes and their reported load.

use serde::{Deserialize, Serialize};
use std::fmt;

crate::define_id! {
    /// Unique identifier for a worker node.
    pub struct WorkerId;
}

/// Worker deployment status. A freshly registered worker flips to online
/// on its first heartbeat; the dispatcher treats a worker without a live
/// heartbeat as offline regardless of this field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerStatus {
    Registered,
    Online,
    Offline,
}

impl fmt::Display for WorkerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerStatus::Registered => write!(f, "registered"),
            WorkerStatus::Online => write!(f, "online"),
            WorkerStatus::Offline => write!(f, "offline"),
        }
    }
}

/// A host that executes scans.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Worker {
    pub id: WorkerId,
    pub name: String,
    pub status: WorkerStatus,
    pub is_local: bool,
}

impl Worker {
    pub fn new(id: WorkerId, name: impl Into<String>, is_local: bool) -> Self {
        Self {
            id,
            name: name.into(),
            status: WorkerStatus::Registered,
            is_local,
        }
    }
}

/// A single heartbeat sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorkerLoad {
    pub cpu_percent: f32,
    pub memory_percent: f32,
}

impl WorkerLoad {
    /// Combined load score used by the dispatcher to rank workers.
    pub fn score(&self) -> f32 {
        self.cpu_percent + self.memory_percent
    }
}
