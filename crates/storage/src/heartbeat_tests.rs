// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use arx_core::clock::FakeClock;

fn store() -> (HeartbeatStore<FakeClock>, FakeClock) {
    let clock = FakeClock::default();
    (
        HeartbeatStore::new(StorageHandle::connect(), clock.clone()),
        clock,
    )
}

fn load(cpu: f32, mem: f32) -> WorkerLoad {
    WorkerLoad {
        cpu_percent: cpu,
        memory_percent: mem,
    }
}

#[test]
fn first_heartbeat_is_flagged() {
    let (hb, _) = store();
    let worker = WorkerId::new("w1");
    assert!(hb.record(&worker, load(10.0, 20.0)).unwrap());
    assert!(!hb.record(&worker, load(11.0, 21.0)).unwrap());
}

#[test]
fn load_reads_latest_sample() {
    let (hb, _) = store();
    let worker = WorkerId::new("w1");
    hb.record(&worker, load(10.0, 20.0)).unwrap();
    hb.record(&worker, load(55.0, 30.0)).unwrap();
    let current = hb.load(&worker).unwrap().unwrap();
    assert_eq!(current.cpu_percent, 55.0);
    assert_eq!(current.score(), 85.0);
}

#[test]
fn entries_expire_after_ttl() {
    let (hb, clock) = store();
    let worker = WorkerId::new("w1");
    hb.record(&worker, load(10.0, 20.0)).unwrap();

    clock.advance(HEARTBEAT_TTL_MS - 1);
    assert!(hb.load(&worker).unwrap().is_some());

    clock.advance(2);
    assert!(hb.load(&worker).unwrap().is_none());

    // A heartbeat after expiry counts as a first heartbeat again.
    assert!(hb.record(&worker, load(5.0, 5.0)).unwrap());
}

#[test]
fn live_loads_prunes_expired_entries() {
    let (hb, clock) = store();
    hb.record(&WorkerId::new("w1"), load(10.0, 10.0)).unwrap();
    clock.advance(HEARTBEAT_TTL_MS / 2);
    hb.record(&WorkerId::new("w2"), load(20.0, 20.0)).unwrap();
    clock.advance(HEARTBEAT_TTL_MS / 2 + 1);

    let live = hb.live_loads().unwrap();
    assert_eq!(live.len(), 1);
    assert_eq!(live[0].0, "w2");
}

#[test]
fn remove_drops_the_entry() {
    let (hb, _) = store();
    let worker = WorkerId::new("w1");
    hb.record(&worker, load(1.0, 1.0)).unwrap();
    hb.remove(&worker).unwrap();
    assert!(hb.load(&worker).unwrap().is_none());
}
