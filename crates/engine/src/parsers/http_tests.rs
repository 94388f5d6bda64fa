// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use arx_core::scan::ScanId;

#[test]
fn parses_a_full_probe_record() {
    let line = r#"{"url":"https://api.example.com","input":"http://api.example.com","host":"api.example.com","title":"API","status_code":200,"content_length":512,"content_type":"application/json","webserver":"nginx","tech":["nginx","OpenResty"],"vhost":true,"failed":false}"#;
    let record = parse_line(line).unwrap();
    assert_eq!(record.url, "https://api.example.com");
    assert_eq!(record.title, "API");
    assert_eq!(record.status_code, Some(200));
    assert_eq!(record.tech, vec!["nginx", "OpenResty"]);
    assert!(record.vhost);
    assert!(!record.failed);
}

#[test]
fn missing_host_is_extracted_from_url() {
    let record = parse_line(r#"{"url":"https://API.example.com:8443/x"}"#).unwrap();
    assert_eq!(record.host, "api.example.com");
}

#[yare::parameterized(
    not_json     = { "api.example.com [200]" },
    json_array   = { "[1,2,3]" },
    empty_url    = { r#"{"title":"x"}"# },
    empty_line   = { "" },
)]
fn invalid_lines_are_discarded(line: &str) {
    assert!(parse_line(line).is_none());
}

#[test]
fn nul_bytes_are_stripped_from_fields() {
    let line = "{\"url\":\"https://x/\",\"title\":\"bad\\u0000title\"}";
    let record = parse_line(line).unwrap();
    assert_eq!(record.title, "badtitle");
}

#[test]
fn website_snapshot_carries_everything() {
    let line = r#"{"url":"https://x/","title":"Home","status_code":200,"tech":["react"],"raw_header":"HTTP/1.1 200 OK"}"#;
    let snap = parse_line(line)
        .unwrap()
        .to_website_snapshot(ScanId::new("s1"));
    assert_eq!(snap.scan_id, "s1");
    assert_eq!(snap.title, "Home");
    assert_eq!(snap.response_headers, "HTTP/1.1 200 OK");
}

#[test]
fn endpoint_snapshot_prefers_input_over_url() {
    let line = r#"{"url":"https://x/login","input":"https://x/login?next=/admin"}"#;
    let snap = parse_line(line)
        .unwrap()
        .to_endpoint_snapshot(ScanId::new("s1"));
    assert_eq!(snap.url, "https://x/login?next=/admin");
}

#[test]
fn endpoint_snapshot_falls_back_to_url() {
    let snap = parse_line(r#"{"url":"https://x/a"}"#)
        .unwrap()
        .to_endpoint_snapshot(ScanId::new("s1"));
    assert_eq!(snap.url, "https://x/a");
}
