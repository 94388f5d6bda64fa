// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine settings, constructed once and threaded into stages and the
//! dispatcher. Nothing here is read from ambient global state.

use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Stage gate: proceed when CPU usage is below this.
    pub cpu_threshold: f32,
    /// Stage gate: proceed when memory usage is below this.
    pub memory_threshold: f32,
    /// Stage gate poll interval.
    pub load_poll_interval: Duration,
    /// Stage gate gives up (and proceeds with a warning) after this long.
    pub load_max_wait: Duration,
    /// Directory holding named wordlists and their hash sidecars.
    pub wordlist_dir: PathBuf,
    /// Directory holding named fingerprint libraries.
    pub fingerprint_dir: PathBuf,
    /// Records per writer flush.
    pub batch_size: usize,
    /// Flush attempts before a transient storage failure fails the stage.
    pub max_write_attempts: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            cpu_threshold: 85.0,
            memory_threshold: 90.0,
            load_poll_interval: Duration::from_secs(5),
            load_max_wait: Duration::from_secs(300),
            wordlist_dir: PathBuf::from("wordlists"),
            fingerprint_dir: PathBuf::from("fingerprints"),
            batch_size: 100,
            max_write_attempts: 3,
        }
    }
}
