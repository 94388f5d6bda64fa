// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! System-load probing for the stage backpressure gate and worker
//! heartbeats.

use arx_core::worker::WorkerLoad;
use parking_lot::Mutex;
use sysinfo::System;

/// Samples the current host load.
pub trait LoadProbe: Send + Sync {
    fn sample(&self) -> WorkerLoad;
}

/// Production probe backed by `sysinfo`.
pub struct SysinfoProbe {
    system: Mutex<System>,
}

impl SysinfoProbe {
    pub fn new() -> Self {
        let mut system = System::new();
        // First CPU refresh establishes the baseline; the next sample
        // returns a real delta.
        system.refresh_cpu_usage();
        Self {
            system: Mutex::new(system),
        }
    }
}

impl Default for SysinfoProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl LoadProbe for SysinfoProbe {
    fn sample(&self) -> WorkerLoad {
        let mut system = self.system.lock();
        system.refresh_cpu_usage();
        system.refresh_memory();
        let total = system.total_memory();
        let memory_percent = if total == 0 {
            0.0
        } else {
            (system.used_memory() as f64 / total as f64 * 100.0) as f32
        };
        WorkerLoad {
            cpu_percent: system.global_cpu_usage(),
            memory_percent,
        }
    }
}

/// Scripted probe for tests: replays a sequence of samples, then repeats
/// the last one.
#[cfg(any(test, feature = "test-support"))]
pub struct FakeLoadProbe {
    samples: Mutex<std::collections::VecDeque<WorkerLoad>>,
    last: Mutex<WorkerLoad>,
}

#[cfg(any(test, feature = "test-support"))]
impl FakeLoadProbe {
    pub fn new(samples: Vec<WorkerLoad>) -> Self {
        let last = samples.last().copied().unwrap_or(WorkerLoad {
            cpu_percent: 0.0,
            memory_percent: 0.0,
        });
        Self {
            samples: Mutex::new(samples.into()),
            last: Mutex::new(last),
        }
    }

    /// A probe that always reports an idle host.
    pub fn idle() -> Self {
        Self::new(vec![WorkerLoad {
            cpu_percent: 0.0,
            memory_percent: 0.0,
        }])
    }
}

#[cfg(any(test, feature = "test-support"))]
impl LoadProbe for FakeLoadProbe {
    fn sample(&self) -> WorkerLoad {
        match self.samples.lock().pop_front() {
            Some(sample) => {
                *self.last.lock() = sample;
                sample
            }
            None => *self.last.lock(),
        }
    }
}

#[cfg(test)]
#[path = "load_tests.rs"]
mod tests;
