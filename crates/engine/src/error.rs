// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine error types.

use arx_storage::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("storage error: {0}")]
    Storage(#[from] StoreError),
    #[error("storage retries exhausted: {0}")]
    StorageExhausted(StoreError),
    #[error("exec error: {0}")]
    Exec(#[from] arx_adapters::ExecError),
    #[error("config error: {0}")]
    Config(#[from] arx_config::ConfigError),
    #[error("template error: {0}")]
    Template(#[from] arx_config::TemplateError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("target name unavailable")]
    TargetNameUnavailable,
    #[error("wordlist {name}: {message}")]
    Wordlist { name: String, message: String },
    #[error("scan cancelled")]
    Cancelled,
    #[error("{0}")]
    Stage(String),
}
