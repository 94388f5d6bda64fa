// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for engine tests.

use crate::orchestrator::Stores;
use crate::provider::{InventoryProvider, SnapshotProvider};
use crate::settings::EngineSettings;
use crate::stage::StageEnv;
use arx_adapters::FakeLoadProbe;
use arx_config::{StageConfig, ToolConfig};
use arx_core::cancel::CancelFlag;
use arx_core::clock::FakeClock;
use arx_core::scan::{Scan, ScanMode};
use arx_core::target::{TargetId, TargetKind};
use arx_core::test_support;
use arx_storage::StorageHandle;
use std::sync::Arc;

#[allow(dead_code)] // not every test touches every handle
pub(crate) struct Fixture {
    pub tmp: tempfile::TempDir,
    pub clock: FakeClock,
    pub handle: StorageHandle,
    pub stores: Stores<FakeClock>,
    pub scan: Scan,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_target(TargetKind::Domain, "example.com", ScanMode::Full)
    }

    pub fn with_target(kind: TargetKind, name: &str, mode: ScanMode) -> Self {
        let tmp = tempfile::tempdir().unwrap();
        let clock = FakeClock::default();
        let handle = StorageHandle::connect();
        let stores = Stores::open(handle.clone(), clock.clone());

        stores
            .targets
            .create(TargetId::new("t1"), name, kind)
            .unwrap();
        let mut scan = test_support::scan("s1", "t1", mode);
        scan.results_dir = tmp.path().join("scan_s1");
        stores.scans.create(scan.clone()).unwrap();

        Self {
            tmp,
            clock,
            handle,
            stores,
            scan,
        }
    }

    pub fn env(&self) -> Arc<StageEnv<FakeClock>> {
        self.env_with_settings(EngineSettings {
            wordlist_dir: self.tmp.path().join("wordlists"),
            fingerprint_dir: self.tmp.path().join("fingerprints"),
            ..EngineSettings::default()
        })
    }

    pub fn env_with_settings(&self, settings: EngineSettings) -> Arc<StageEnv<FakeClock>> {
        let target = self.stores.targets.get(&TargetId::new("t1")).unwrap();
        Arc::new(StageEnv {
            scan_id: self.scan.id.clone(),
            target_id: target.id.clone(),
            target_name: target.name.clone(),
            target_kind: target.kind,
            workspace: self.scan.results_dir.clone(),
            settings,
            probe: Arc::new(FakeLoadProbe::idle()),
            cancel: CancelFlag::new(),
            scans: self.stores.scans.clone(),
            targets: self.stores.targets.clone(),
            assets: self.stores.assets.clone(),
            snapshots: self.stores.snapshots.clone(),
            clock: self.clock.clone(),
        })
    }

    pub fn inventory_provider(&self) -> InventoryProvider<FakeClock> {
        InventoryProvider::new(
            self.stores.targets.clone(),
            self.stores.assets.clone(),
            self.stores.blacklists.clone(),
            TargetId::new("t1"),
            Some(self.scan.id.clone()),
        )
    }

    pub fn snapshot_provider(&self) -> SnapshotProvider<FakeClock> {
        SnapshotProvider::new(
            self.stores.targets.clone(),
            self.stores.snapshots.clone(),
            self.scan.id.clone(),
            Some(TargetId::new("t1")),
        )
    }
}

/// One-tool stage config with the given command template.
pub(crate) fn stage_config(tool_name: &str, command: &str) -> StageConfig {
    let mut config = StageConfig {
        enabled: true,
        ..StageConfig::default()
    };
    config
        .tools
        .insert(tool_name.to_string(), ToolConfig::new(command));
    config
}
