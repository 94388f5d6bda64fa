// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Chunk-streamed row iterators.
//!
//! Query methods return a [`RowIter`] that pulls `chunk_size` rows per
//! lock acquisition instead of holding the store locked for the whole
//! walk. Every iterator exposes `close()`, and closing also happens on
//! drop, so a stage bailing out early cannot leak a cursor.

use crate::error::StoreError;
use crate::handle::StorageHandle;
use crate::tables::Tables;
use std::collections::VecDeque;

/// Stateful fetch: returns the next chunk of at most `chunk_size` rows,
/// or an empty vec when exhausted. The closure tracks its own resume key.
pub(crate) type FetchFn<T> =
    Box<dyn FnMut(&mut Tables, usize) -> Result<Vec<T>, StoreError> + Send>;

struct IterState<T> {
    handle: StorageHandle,
    fetch: FetchFn<T>,
    chunk_size: usize,
    buffer: VecDeque<T>,
    exhausted: bool,
}

/// A closable, chunk-buffered row iterator.
pub struct RowIter<T> {
    state: Option<IterState<T>>,
}

impl<T> RowIter<T> {
    pub(crate) fn new(handle: StorageHandle, chunk_size: usize, fetch: FetchFn<T>) -> Self {
        Self {
            state: Some(IterState {
                handle,
                fetch,
                chunk_size: chunk_size.max(1),
                buffer: VecDeque::new(),
                exhausted: false,
            }),
        }
    }

    /// An iterator over a fixed set of rows, no cursor behind it.
    pub fn from_vec(rows: Vec<T>) -> Self
    where
        T: Send + 'static,
    {
        let mut rows = Some(rows);
        let handle = StorageHandle::connect();
        Self::new(
            handle,
            usize::MAX,
            Box::new(move |_, _| Ok(rows.take().unwrap_or_default())),
        )
    }

    /// Fetch the next row, refilling the buffer from the store as needed.
    pub fn next_row(&mut self) -> Result<Option<T>, StoreError> {
        let Some(state) = self.state.as_mut() else {
            return Ok(None);
        };
        if let Some(row) = state.buffer.pop_front() {
            return Ok(Some(row));
        }
        if state.exhausted {
            self.close();
            return Ok(None);
        }
        let chunk_size = state.chunk_size;
        let fetch = &mut state.fetch;
        let chunk = state.handle.run(|tables| fetch(tables, chunk_size))?;
        if chunk.len() < chunk_size {
            state.exhausted = true;
        }
        state.buffer = chunk.into();
        match self.state.as_mut().and_then(|s| s.buffer.pop_front()) {
            Some(row) => Ok(Some(row)),
            None => {
                self.close();
                Ok(None)
            }
        }
    }

    /// Release the cursor. Further calls yield no rows.
    pub fn close(&mut self) {
        self.state = None;
    }

    pub fn is_closed(&self) -> bool {
        self.state.is_none()
    }
}

impl<T> Iterator for RowIter<T> {
    type Item = Result<T, StoreError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_row().transpose()
    }
}

impl<T> Drop for RowIter<T> {
    fn drop(&mut self) {
        self.close();
    }
}

/// Build a fetch closure that pages a `BTreeMap` whose composite key
/// starts with the scope (target or scan id). Rows for one scope are
/// contiguous, so each chunk is a bounded range scan resuming after the
/// last emitted key.
macro_rules! paged_fetch {
    ($table:ident, $scope:expr, $start_key:expr, $key_scope:expr, $map:expr) => {{
        let scope = $scope;
        let start = $start_key;
        let mut resume = None;
        Box::new(
            move |tables: &mut crate::tables::Tables, chunk_size: usize| {
                use std::ops::Bound;
                let lower = match &resume {
                    Some(last) => Bound::Excluded(std::clone::Clone::clone(last)),
                    None => Bound::Included(std::clone::Clone::clone(&start)),
                };
                let mut out = Vec::new();
                for (key, row) in tables.$table.range((lower, Bound::Unbounded)) {
                    if $key_scope(key) != &scope {
                        break;
                    }
                    out.push($map(row));
                    resume = Some(std::clone::Clone::clone(key));
                    if out.len() >= chunk_size {
                        break;
                    }
                }
                Ok(out)
            },
        )
    }};
}

pub(crate) use paged_fetch;

#[cfg(test)]
#[path = "iter_tests.rs"]
mod tests;
