// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `arx scan` command: a single-host end-to-end scan run.

use crate::output;
use anyhow::Context;
use arx_adapters::{LoadProbe, SysinfoProbe};
use arx_core::clock::SystemClock;
use arx_core::scan::{ScanId, ScanMode};
use arx_core::target::{normalize_domain, TargetId, TargetKind};
use arx_core::worker::WorkerId;
use arx_dispatch::{Dispatcher, HeartbeatService, LocalInvoker, ScanLifecycle, ScanRuntime};
use arx_engine::{EngineSettings, Orchestrator, Stores};
use arx_storage::{HeartbeatStore, StorageHandle, WorkerStore};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

pub async fn run(
    target: String,
    kind: String,
    engine: PathBuf,
    mode: String,
    results_dir: PathBuf,
    wordlist_dir: PathBuf,
) -> anyhow::Result<()> {
    let kind = match kind.as_str() {
        "ip" => TargetKind::Ip,
        "cidr" => TargetKind::Cidr,
        _ => TargetKind::Domain,
    };
    let mode = if mode == "quick" {
        ScanMode::Quick
    } else {
        ScanMode::Full
    };
    let target_name = match kind {
        TargetKind::Domain => normalize_domain(&target)?,
        _ => target.trim().to_string(),
    };
    let config_text = std::fs::read_to_string(&engine)
        .with_context(|| format!("reading engine config {}", engine.display()))?;
    // Fail early on a broken config rather than through a FAILED scan row.
    arx_config::parse_engine_config(&config_text)?;

    let clock = SystemClock;
    let handle = StorageHandle::connect();
    let stores = Stores::open(handle.clone(), clock);
    let workers = WorkerStore::new(handle.clone());
    let heartbeats = HeartbeatStore::new(handle.clone(), clock);

    let probe: Arc<dyn LoadProbe> = Arc::new(SysinfoProbe::new());
    let settings = EngineSettings {
        wordlist_dir,
        ..EngineSettings::default()
    };
    let orchestrator = Arc::new(Orchestrator::new(
        stores.clone(),
        settings,
        probe.clone(),
        clock,
    ));

    // Self-register the local worker and seed its heartbeat.
    let (worker, _) = workers.register(
        WorkerId::new(uuid::Uuid::new_v4().to_string()),
        "local-worker",
        true,
    )?;
    let heartbeat_service = HeartbeatService::new(workers.clone(), heartbeats.clone());
    heartbeat_service.record(&worker.id, probe.sample())?;

    let runtime = Arc::new(ScanRuntime::new());
    let invoker = Arc::new(LocalInvoker::new(
        orchestrator,
        stores.scans.clone(),
        runtime.clone(),
    ));
    let dispatcher = Arc::new(Dispatcher::new(
        workers,
        heartbeats,
        stores.scans.clone(),
        invoker,
    ));
    let lifecycle = ScanLifecycle::new(
        stores.scans.clone(),
        stores.targets.clone(),
        dispatcher,
        runtime,
        clock,
        results_dir,
    );

    let target_row = stores
        .targets
        .create(
            TargetId::new(uuid::Uuid::new_v4().to_string()),
            &target_name,
            kind,
        )
        .context("creating target")?;
    println!("target {} ({})", target_row.name, target_row.kind);

    let created = lifecycle.create_scans(
        &[target_row.id.clone()],
        vec!["cli".to_string()],
        vec!["CLI Engine".to_string()],
        std::slice::from_ref(&config_text),
        mode,
    )?;
    let scan_id: ScanId = created[0].id.clone();
    println!("scan {} dispatched, waiting...", scan_id.short(8));

    // Poll until terminal, keeping the worker's heartbeat alive.
    loop {
        tokio::time::sleep(Duration::from_millis(500)).await;
        heartbeat_service.record(&worker.id, probe.sample())?;
        let scan = stores.scans.get(&scan_id)?;
        if scan.status.is_terminal() {
            output::print_scan(&scan);
            if !scan.error_message.is_empty() {
                anyhow::bail!("scan failed: {}", scan.error_message);
            }
            break;
        }
    }
    Ok(())
}
