// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn parses_json_form() {
    let record = parse_line(r#"{"host":"api.example.com","ip":"10.0.0.1","port":443}"#).unwrap();
    assert_eq!(record.host, "api.example.com");
    assert_eq!(record.ip, "10.0.0.1");
    assert_eq!(record.port, 443);
}

#[test]
fn json_without_host_uses_ip() {
    let record = parse_line(r#"{"ip":"10.0.0.1","port":80}"#).unwrap();
    assert_eq!(record.host, "10.0.0.1");
}

#[test]
fn parses_host_port_form() {
    let record = parse_line("API.example.com:8080").unwrap();
    assert_eq!(record.host, "api.example.com");
    assert_eq!(record.ip, "");
    assert_eq!(record.port, 8080);
}

#[test]
fn bare_ip_port_fills_ip_field() {
    let record = parse_line("10.0.0.7:22").unwrap();
    assert_eq!(record.host, "10.0.0.7");
    assert_eq!(record.ip, "10.0.0.7");
}

#[yare::parameterized(
    no_port        = { "api.example.com" },
    bad_port       = { "api.example.com:eighty" },
    port_overflow  = { "api.example.com:70000" },
    empty          = { "" },
    json_no_port   = { r#"{"host":"x"}"# },
)]
fn invalid_lines(line: &str) {
    assert!(parse_line(line).is_none());
}

#[test]
fn snapshot_conversion() {
    let snap = parse_line("a.example.com:443")
        .unwrap()
        .to_snapshot(arx_core::scan::ScanId::new("s1"));
    assert_eq!(snap.scan_id, "s1");
    assert_eq!(snap.port, 443);
}
