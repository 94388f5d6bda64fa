// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Registry of in-flight local scan runs and their cancel flags.

use arx_core::cancel::CancelFlag;
use arx_core::scan::ScanId;
use parking_lot::Mutex;
use std::collections::HashMap;

/// Shared between the local invoker (registers runs) and `stop_scan`
/// (cancels them).
#[derive(Default)]
pub struct ScanRuntime {
    running: Mutex<HashMap<ScanId, CancelFlag>>,
}

impl ScanRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, scan_id: ScanId, cancel: CancelFlag) {
        self.running.lock().insert(scan_id, cancel);
    }

    pub fn remove(&self, scan_id: &ScanId) {
        self.running.lock().remove(scan_id);
    }

    /// Set the cancel intent for a running scan. Returns false when the
    /// scan is not running locally (already finished, or remote).
    pub fn cancel(&self, scan_id: &ScanId) -> bool {
        match self.running.lock().get(scan_id) {
            Some(flag) => {
                flag.cancel();
                true
            }
            None => false,
        }
    }

    pub fn is_running(&self, scan_id: &ScanId) -> bool {
        self.running.lock().contains_key(scan_id)
    }
}
