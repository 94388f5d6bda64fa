// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn write_wordlist(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

#[test]
fn resolves_existing_wordlist_without_sidecar() {
    let tmp = tempfile::tempdir().unwrap();
    write_wordlist(tmp.path(), "dns.txt", "admin\napi\n");
    let path = resolve_wordlist(tmp.path(), "dns.txt").unwrap();
    assert!(path.ends_with("dns.txt"));
}

#[test]
fn missing_wordlist_errors() {
    let tmp = tempfile::tempdir().unwrap();
    assert!(resolve_wordlist(tmp.path(), "nope.txt").is_err());
}

#[test]
fn path_traversal_names_are_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    assert!(resolve_wordlist(tmp.path(), "../etc/passwd").is_err());
    assert!(resolve_wordlist(tmp.path(), "a/b.txt").is_err());
}

#[test]
fn sidecar_hash_must_match() {
    let tmp = tempfile::tempdir().unwrap();
    write_wordlist(tmp.path(), "dns.txt", "admin\n");
    // sha256 of "admin\n"
    std::fs::write(
        tmp.path().join("dns.txt.sha256"),
        "fc8252c8dc55839967c58b9ad755a59b61b67c13227ddae4bd3f78a38bf394f7  dns.txt\n",
    )
    .unwrap();
    resolve_wordlist(tmp.path(), "dns.txt").unwrap();
}

#[test]
fn sidecar_mismatch_fails() {
    let tmp = tempfile::tempdir().unwrap();
    write_wordlist(tmp.path(), "dns.txt", "admin\n");
    std::fs::write(tmp.path().join("dns.txt.sha256"), "deadbeef\n").unwrap();
    let err = resolve_wordlist(tmp.path(), "dns.txt").unwrap_err();
    assert!(err.to_string().contains("hash mismatch"));
}

#[test]
fn count_lines_skips_blanks() {
    let tmp = tempfile::tempdir().unwrap();
    let path = write_wordlist(tmp.path(), "w.txt", "a\n\n  \nb\nc\n");
    assert_eq!(count_lines(&path), 3);
}

#[test]
fn count_lines_of_missing_file_is_zero() {
    assert_eq!(count_lines(Path::new("/no/such/file")), 0);
}
