//! Shared harness for behavioral specs: a fully wired single-host
//! platform with an idle load probe and a fake clock.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, dead_code)]

use arx_adapters::FakeLoadProbe;
use arx_core::clock::FakeClock;
use arx_core::scan::{Scan, ScanId, ScanMode, ScanStatus};
use arx_core::target::{TargetId, TargetKind};
use arx_core::worker::{WorkerId, WorkerLoad};
use arx_dispatch::{Dispatcher, HeartbeatService, LocalInvoker, ScanLifecycle, ScanRuntime};
use arx_engine::{EngineSettings, Orchestrator, Stores};
use arx_storage::{HeartbeatStore, StorageHandle, WorkerStore};
use std::sync::Arc;
use std::time::Duration;

pub const SPEC_POLL_INTERVAL_MS: u64 = 20;
pub const SPEC_WAIT_MAX_MS: u64 = 30_000;

pub struct Platform {
    pub tmp: tempfile::TempDir,
    pub clock: FakeClock,
    pub handle: StorageHandle,
    pub stores: Stores<FakeClock>,
    pub workers: WorkerStore,
    pub heartbeats: HeartbeatStore<FakeClock>,
    pub runtime: Arc<ScanRuntime>,
    pub lifecycle: ScanLifecycle<FakeClock>,
}

impl Platform {
    /// A platform with one registered, heartbeating local worker.
    pub fn start() -> Self {
        let tmp = tempfile::tempdir().unwrap();
        let clock = FakeClock::default();
        let handle = StorageHandle::connect();
        let stores = Stores::open(handle.clone(), clock.clone());
        let workers = WorkerStore::new(handle.clone());
        let heartbeats = HeartbeatStore::new(handle.clone(), clock.clone());

        let settings = EngineSettings {
            wordlist_dir: tmp.path().join("wordlists"),
            fingerprint_dir: tmp.path().join("fingerprints"),
            ..EngineSettings::default()
        };
        let orchestrator = Arc::new(Orchestrator::new(
            stores.clone(),
            settings,
            Arc::new(FakeLoadProbe::idle()),
            clock.clone(),
        ));

        let runtime = Arc::new(ScanRuntime::new());
        let invoker = Arc::new(LocalInvoker::new(
            orchestrator,
            stores.scans.clone(),
            runtime.clone(),
        ));
        let dispatcher = Arc::new(Dispatcher::new(
            workers.clone(),
            heartbeats.clone(),
            stores.scans.clone(),
            invoker,
        ));
        let lifecycle = ScanLifecycle::new(
            stores.scans.clone(),
            stores.targets.clone(),
            dispatcher,
            runtime.clone(),
            clock.clone(),
            tmp.path().join("results"),
        );

        let platform = Self {
            tmp,
            clock,
            handle,
            stores,
            workers,
            heartbeats,
            runtime,
            lifecycle,
        };
        platform.add_worker("w1", 5.0, 5.0);
        platform
    }

    pub fn add_worker(&self, id: &str, cpu: f32, mem: f32) {
        self.workers
            .register(WorkerId::new(id), &format!("worker-{id}"), true)
            .unwrap();
        let service = HeartbeatService::new(self.workers.clone(), self.heartbeats.clone());
        service
            .record(
                &WorkerId::new(id),
                WorkerLoad {
                    cpu_percent: cpu,
                    memory_percent: mem,
                },
            )
            .unwrap();
    }

    pub fn create_target(&self, id: &str, name: &str, kind: TargetKind) -> TargetId {
        self.stores
            .targets
            .create(TargetId::new(id), name, kind)
            .unwrap()
            .id
    }

    /// Create one scan for the target and wait until it settles.
    pub async fn run_scan(&self, target_id: &TargetId, config: &str, mode: ScanMode) -> Scan {
        let created = self
            .lifecycle
            .create_scans(
                std::slice::from_ref(target_id),
                vec!["engine-1".to_string()],
                vec!["Spec Engine".to_string()],
                &[config.to_string()],
                mode,
            )
            .unwrap();
        self.wait_terminal(&created[0].id).await
    }

    /// Poll until the scan reaches a terminal status.
    pub async fn wait_terminal(&self, scan_id: &ScanId) -> Scan {
        let started = std::time::Instant::now();
        loop {
            let scan = self.stores.scans.get(scan_id).unwrap();
            if scan.status.is_terminal() {
                return scan;
            }
            assert!(
                started.elapsed() < Duration::from_millis(SPEC_WAIT_MAX_MS),
                "scan {} stuck in {}",
                scan_id,
                scan.status
            );
            tokio::time::sleep(Duration::from_millis(SPEC_POLL_INTERVAL_MS)).await;
        }
    }

    pub fn stage_state(&self, scan: &Scan, name: &str) -> arx_core::stage::StageState {
        scan.stage_progress
            .iter()
            .find(|s| s.name == name)
            .unwrap_or_else(|| panic!("stage {name} missing"))
            .status
    }
}

/// Marker-file helper: tools touch `<dir>/invocations/<uuid>` so specs
/// can count how many times a command actually ran.
pub fn invocation_counter_dir(platform: &Platform) -> std::path::PathBuf {
    let dir = platform.tmp.path().join("invocations");
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

pub fn invocation_count(dir: &std::path::Path) -> usize {
    std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
}

pub fn assert_completed(scan: &Scan) {
    assert_eq!(
        scan.status,
        ScanStatus::Completed,
        "scan ended {} with error {:?}",
        scan.status,
        scan.error_message
    );
}
