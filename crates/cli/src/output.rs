// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Terminal output for scan results.

use arx_core::scan::Scan;

pub fn print_scan(scan: &Scan) {
    println!();
    println!(
        "scan {}  status={}  progress={}%",
        scan.id.short(8),
        scan.status,
        scan.progress
    );
    if !scan.stage_progress.is_empty() {
        println!("stages:");
        for stage in &scan.stage_progress {
            println!("  {:<22} {}", stage.name, stage.status);
        }
    }
    let c = &scan.counts;
    println!(
        "assets: {} subdomains, {} host:ports, {} websites, {} endpoints, {} directories, {} screenshots",
        c.subdomains, c.host_ports, c.websites, c.endpoints, c.directories, c.screenshots
    );
    println!(
        "vulns: {} total ({} critical, {} high, {} medium, {} low)",
        c.vulns_total, c.vulns_critical, c.vulns_high, c.vulns_medium, c.vulns_low
    );
}
