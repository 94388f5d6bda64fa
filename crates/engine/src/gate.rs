// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! System-load backpressure gate.
//!
//! Before launching a stage (and its external tools), wait until the host
//! has headroom. The wait is bounded: a saturated host eventually lets
//! the stage through with a warning rather than wedging the scan.

use crate::settings::EngineSettings;
use arx_adapters::LoadProbe;
use tracing::{debug, warn};

/// Returns true if the gate opened because load dropped below the
/// thresholds, false if the bounded wait expired.
pub async fn wait_for_capacity(
    probe: &dyn LoadProbe,
    settings: &EngineSettings,
    context: &str,
) -> bool {
    let started = tokio::time::Instant::now();
    loop {
        let load = probe.sample();
        if load.cpu_percent < settings.cpu_threshold
            && load.memory_percent < settings.memory_threshold
        {
            debug!(
                context,
                cpu = load.cpu_percent,
                memory = load.memory_percent,
                "load gate open"
            );
            return true;
        }
        if started.elapsed() >= settings.load_max_wait {
            warn!(
                context,
                cpu = load.cpu_percent,
                memory = load.memory_percent,
                waited_s = started.elapsed().as_secs(),
                "load gate wait expired, proceeding anyway"
            );
            return false;
        }
        debug!(
            context,
            cpu = load.cpu_percent,
            memory = load.memory_percent,
            "system busy, waiting"
        );
        tokio::time::sleep(settings.load_poll_interval).await;
    }
}

#[cfg(test)]
#[path = "gate_tests.rs"]
mod tests;
