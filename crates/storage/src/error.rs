// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Store error taxonomy.
//!
//! Callers branch on the class, not the variant: integrity errors mean the
//! data is wrong (drop the batch, keep going), transient errors mean the
//! backend hiccuped (retry with backoff).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("duplicate key: {0}")]
    DuplicateKey(String),
    #[error("constraint violation: {0}")]
    Constraint(String),
    #[error("connection lost: {0}")]
    ConnectionLost(String),
    #[error("backend unavailable: {0}")]
    Unavailable(String),
    #[error("operation timed out: {0}")]
    Timeout(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("invalid value: {0}")]
    Invalid(String),
}

impl StoreError {
    /// Retrying may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            StoreError::ConnectionLost(_) | StoreError::Unavailable(_) | StoreError::Timeout(_)
        )
    }

    /// The data itself violates a constraint; retrying cannot help.
    pub fn is_integrity(&self) -> bool {
        matches!(self, StoreError::DuplicateKey(_) | StoreError::Constraint(_))
    }
}
