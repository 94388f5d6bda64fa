// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dispatch error types.

use arx_storage::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("storage error: {0}")]
    Storage(#[from] StoreError),
    #[error("config error: {0}")]
    Config(#[from] arx_config::ConfigError),
    #[error("no online workers available")]
    NoWorkers,
    #[error("scan {scan_id} cannot be stopped from status {status}")]
    NotStoppable { scan_id: String, status: String },
    #[error("worker invocation failed: {0}")]
    Invoke(String),
}
