// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cooperative cancellation flag.
//!
//! `stop_scan` sets the flag; the orchestrator polls it at stage
//! boundaries and refuses to start further stages. In-flight tools are
//! torn down separately by killing their process trees.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_clear_and_sticks_once_set() {
        let flag = CancelFlag::new();
        assert!(!flag.is_cancelled());
        let shared = flag.clone();
        shared.cancel();
        assert!(flag.is_cancelled());
    }
}
