// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Batched record writer with retry.
//!
//! Records accumulate until `batch_size`, then flush to the sink. An
//! integrity failure discards that batch and the scan continues; a
//! transient failure retries with exponential backoff (1 s, 2 s, 4 s)
//! and, once attempts are exhausted, fails the stage.

use crate::error::EngineError;
use crate::sink::RecordSink;
use arx_storage::StoreError;
use std::time::Duration;
use tracing::{error, warn};

/// Counters accumulated over the writer's lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriterStats {
    pub submitted: u64,
    /// Records accepted by the sink (post in-batch dedup and drops).
    pub written: u64,
    pub batches: u64,
    /// Batches discarded on integrity errors.
    pub data_errors: u64,
    /// Transient flush retries performed.
    pub retries: u64,
}

/// Accumulates records and flushes them through a [`RecordSink`].
pub struct BatchedWriter<R, S: RecordSink<R>> {
    sink: S,
    batch: Vec<R>,
    batch_size: usize,
    max_attempts: usize,
    stats: WriterStats,
}

impl<R, S: RecordSink<R>> BatchedWriter<R, S> {
    pub fn new(sink: S, batch_size: usize, max_attempts: usize) -> Self {
        Self {
            sink,
            batch: Vec::with_capacity(batch_size.max(1)),
            batch_size: batch_size.max(1),
            max_attempts: max_attempts.max(1),
            stats: WriterStats::default(),
        }
    }

    pub fn stats(&self) -> WriterStats {
        self.stats
    }

    /// Add a record; flushes when the buffer reaches the batch size.
    pub async fn submit(&mut self, record: R) -> Result<(), EngineError> {
        self.stats.submitted += 1;
        self.batch.push(record);
        if self.batch.len() >= self.batch_size {
            self.flush().await?;
        }
        Ok(())
    }

    /// Flush the tail and return the final counters.
    pub async fn close(mut self) -> Result<WriterStats, EngineError> {
        self.flush().await?;
        Ok(self.stats)
    }

    async fn flush(&mut self) -> Result<(), EngineError> {
        if self.batch.is_empty() {
            return Ok(());
        }
        let batch = std::mem::take(&mut self.batch);
        self.stats.batches += 1;

        for attempt in 1..=self.max_attempts {
            match self.sink.flush(&batch) {
                Ok(written) => {
                    self.stats.written += written as u64;
                    return Ok(());
                }
                Err(err) if err.is_integrity() => {
                    // Duplicate data is not worth dying over; drop the
                    // batch and keep the scan moving.
                    warn!(batch_len = batch.len(), error = %err, "integrity error, batch discarded");
                    self.stats.data_errors += 1;
                    return Ok(());
                }
                Err(err) if err.is_transient() && attempt < self.max_attempts => {
                    let backoff = Duration::from_secs(1 << (attempt - 1));
                    warn!(
                        attempt,
                        backoff_s = backoff.as_secs(),
                        error = %err,
                        "transient storage error, retrying flush"
                    );
                    self.stats.retries += 1;
                    tokio::time::sleep(backoff).await;
                }
                Err(err) => {
                    error!(
                        attempts = attempt,
                        error = %err,
                        "flush failed, giving up"
                    );
                    return Err(EngineError::StorageExhausted(err));
                }
            }
        }
        unreachable_guard()
    }
}

// The retry loop always returns inside the final iteration; this keeps
// the compiler convinced without a panicking macro.
fn unreachable_guard() -> Result<(), EngineError> {
    Err(EngineError::StorageExhausted(StoreError::Unavailable(
        "retry loop exited unexpectedly".to_string(),
    )))
}

#[cfg(test)]
#[path = "writer_tests.rs"]
mod tests;
