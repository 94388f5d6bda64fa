// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! arx-adapters: Process execution and system-load probing.

pub mod load;
pub mod subprocess;

pub use load::{LoadProbe, SysinfoProbe};
pub use subprocess::{
    cancelled, execute_and_wait, execute_and_wait_cancellable, execute_stream, ExecError,
    ExecOptions, ExecOutcome, ExecStream,
};

#[cfg(any(test, feature = "test-support"))]
pub use load::FakeLoadProbe;
