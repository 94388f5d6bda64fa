// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Test builders shared by other crates' tests (feature `test-support`).

use crate::asset::WebSite;
use crate::scan::{Scan, ScanCounts, ScanId, ScanMode, ScanStatus};
use crate::snapshot::WebSiteSnapshot;
use crate::target::{Target, TargetId, TargetKind};
use std::path::PathBuf;

/// A domain target with fixed timestamps.
pub fn target(id: &str, name: &str) -> Target {
    Target::new(TargetId::new(id), name, TargetKind::Domain, 1_700_000_000_000)
}

pub fn target_of_kind(id: &str, name: &str, kind: TargetKind) -> Target {
    Target::new(TargetId::new(id), name, kind, 1_700_000_000_000)
}

/// A freshly initiated scan with an empty stage list.
pub fn scan(id: &str, target_id: &str, mode: ScanMode) -> Scan {
    Scan {
        id: ScanId::new(id),
        target_id: TargetId::new(target_id),
        engine_ids: vec!["engine-1".to_string()],
        engine_names: vec!["Default".to_string()],
        config_text: String::new(),
        mode,
        status: ScanStatus::Initiated,
        created_at_ms: 1_700_000_000_000,
        stopped_at_ms: None,
        worker_id: None,
        results_dir: PathBuf::from(format!("/tmp/arx-test/scan_{}", id)),
        container_ids: Vec::new(),
        error_message: String::new(),
        progress: 0,
        current_stage: String::new(),
        stage_progress: Vec::new(),
        counts: ScanCounts::default(),
        stats_updated_at_ms: None,
        deleted_at_ms: None,
    }
}

/// A minimal live website row.
pub fn website(target_id: &str, url: &str) -> WebSite {
    WebSite {
        target_id: TargetId::new(target_id),
        url: url.to_string(),
        host: crate::net::extract_hostname(url),
        status_code: Some(200),
        ..WebSite::default()
    }
}

/// A minimal website snapshot row.
pub fn website_snapshot(scan_id: &str, url: &str) -> WebSiteSnapshot {
    WebSiteSnapshot {
        scan_id: ScanId::new(scan_id),
        url: url.to_string(),
        host: crate::net::extract_hostname(url),
        status_code: Some(200),
        ..WebSiteSnapshot::default()
    }
}
