// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! arx-core: Domain types for the arx attack-surface scanning platform

pub mod asset;
pub mod blacklist;
pub mod cancel;
pub mod clock;
pub mod id;
pub mod net;
pub mod sanitize;
pub mod scan;
pub mod snapshot;
pub mod stage;
pub mod target;
pub mod worker;

#[cfg(feature = "test-support")]
pub mod test_support;

pub use asset::{
    Directory, Endpoint, HostPortMapping, Severity, Subdomain, Vulnerability, WebSite,
};
pub use blacklist::{BlacklistError, BlacklistFilter, BlacklistRule, RuleKind};
pub use cancel::CancelFlag;
pub use clock::{Clock, FakeClock, SystemClock};
pub use id::{IdGen, SequentialIdGen, ShortId, UuidIdGen};
pub use net::{expand_cidr, extract_hostname, host_port_urls, CidrHosts, InvalidCidr};
pub use sanitize::sanitize;
pub use scan::{Scan, ScanCounts, ScanId, ScanMode, ScanStatus, StageProgress};
pub use snapshot::{
    DirectorySnapshot, EndpointSnapshot, HostPortSnapshot, SubdomainSnapshot,
    VulnerabilitySnapshot, WebSiteSnapshot,
};
pub use stage::{StageKind, StageState};
pub use target::{normalize_domain, InvalidTarget, Target, TargetId, TargetKind};
pub use worker::{Worker, WorkerId, WorkerLoad, WorkerStatus};
