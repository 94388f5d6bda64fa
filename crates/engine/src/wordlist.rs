// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wordlist resolution and integrity checking.
//!
//! A tool config names a wordlist; the engine resolves it to a file under
//! the configured wordlist directory. When a `<name>.sha256` sidecar
//! exists, the file's digest must match it, so a half-synced or tampered
//! wordlist fails loudly instead of silently scanning with garbage.

use crate::error::EngineError;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Resolve `name` to a local path, verifying the sidecar hash if present.
pub fn resolve_wordlist(dir: &Path, name: &str) -> Result<PathBuf, EngineError> {
    // A wordlist name is a bare file name, never a path.
    if name.contains('/') || name.contains("..") {
        return Err(EngineError::Wordlist {
            name: name.to_string(),
            message: "name must not contain path separators".to_string(),
        });
    }
    let path = dir.join(name);
    if !path.is_file() {
        return Err(EngineError::Wordlist {
            name: name.to_string(),
            message: format!("not found under {}", dir.display()),
        });
    }

    let sidecar = dir.join(format!("{name}.sha256"));
    if sidecar.is_file() {
        let expected = std::fs::read_to_string(&sidecar)?;
        let expected = expected.split_whitespace().next().unwrap_or("").to_lowercase();
        let actual = file_sha256(&path)?;
        if actual != expected {
            return Err(EngineError::Wordlist {
                name: name.to_string(),
                message: format!("hash mismatch: expected {expected}, got {actual}"),
            });
        }
        debug!(name, "wordlist hash verified");
    }
    Ok(path)
}

fn file_sha256(path: &Path) -> Result<String, EngineError> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

/// Count non-empty lines; 0 when the file cannot be read.
pub fn count_lines(path: &Path) -> u64 {
    let Ok(file) = File::open(path) else {
        return 0;
    };
    BufReader::new(file)
        .lines()
        .map_while(Result::ok)
        .filter(|l| !l.trim().is_empty())
        .count() as u64
}

#[cfg(test)]
#[path = "wordlist_tests.rs"]
mod tests;
