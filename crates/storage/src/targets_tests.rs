// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::assets::AssetStore;
use arx_core::asset::Subdomain;
use arx_core::clock::FakeClock;

fn store() -> (TargetStore<FakeClock>, StorageHandle, FakeClock) {
    let handle = StorageHandle::connect();
    let clock = FakeClock::default();
    (
        TargetStore::new(handle.clone(), clock.clone()),
        handle,
        clock,
    )
}

#[test]
fn create_and_get() {
    let (targets, _, _) = store();
    let created = targets
        .create(TargetId::new("t1"), "example.com", TargetKind::Domain)
        .unwrap();
    assert_eq!(created.name, "example.com");
    let fetched = targets.get(&created.id).unwrap();
    assert_eq!(fetched.kind, TargetKind::Domain);
}

#[test]
fn duplicate_live_name_is_rejected() {
    let (targets, _, _) = store();
    targets
        .create(TargetId::new("t1"), "example.com", TargetKind::Domain)
        .unwrap();
    let err = targets
        .create(TargetId::new("t2"), "example.com", TargetKind::Domain)
        .unwrap_err();
    assert!(err.is_integrity());
}

#[test]
fn name_is_reusable_after_soft_delete() {
    let (targets, _, _) = store();
    let first = targets
        .create(TargetId::new("t1"), "example.com", TargetKind::Domain)
        .unwrap();
    targets.soft_delete(&first.id).unwrap();
    targets
        .create(TargetId::new("t2"), "example.com", TargetKind::Domain)
        .unwrap();
}

#[test]
fn get_hides_soft_deleted_targets() {
    let (targets, _, _) = store();
    let target = targets
        .create(TargetId::new("t1"), "example.com", TargetKind::Domain)
        .unwrap();
    targets.soft_delete(&target.id).unwrap();
    assert!(matches!(
        targets.get(&target.id),
        Err(StoreError::NotFound(_))
    ));
    assert!(!targets.is_live(&target.id).unwrap());
}

#[test]
fn soft_delete_cascades_to_asset_rows() {
    let (targets, handle, _) = store();
    let target = targets
        .create(TargetId::new("t1"), "example.com", TargetKind::Domain)
        .unwrap();
    let assets = AssetStore::new(handle.clone());
    assets
        .upsert_subdomains(&[Subdomain {
            target_id: target.id.clone(),
            name: "api.example.com".to_string(),
        }])
        .unwrap();

    targets.soft_delete(&target.id).unwrap();

    // Invariant: no asset row may outlive its target.
    let orphans = handle.run(|tables| Ok(tables.subdomains.len())).unwrap();
    assert_eq!(orphans, 0);
}

#[test]
fn update_last_scanned_stamps_clock_time() {
    let (targets, _, clock) = store();
    let target = targets
        .create(TargetId::new("t1"), "example.com", TargetKind::Domain)
        .unwrap();
    clock.advance(5_000);
    targets.update_last_scanned(&target.id).unwrap();
    let fetched = targets.get(&target.id).unwrap();
    assert_eq!(fetched.last_scanned_at_ms, Some(clock.epoch_ms()));
}

#[test]
fn find_by_name_ignores_deleted() {
    let (targets, _, _) = store();
    let target = targets
        .create(TargetId::new("t1"), "example.com", TargetKind::Domain)
        .unwrap();
    assert!(targets.find_by_name("example.com").unwrap().is_some());
    targets.soft_delete(&target.id).unwrap();
    assert!(targets.find_by_name("example.com").unwrap().is_none());
}
