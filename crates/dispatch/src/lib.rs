// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! arx-dispatch: Scan lifecycle and load-aware worker dispatch.
//!
//! The lifecycle service creates scan rows and hands them to the
//! dispatcher off the request path; the dispatcher picks the
//! least-loaded online worker and invokes the engine there through a
//! [`WorkerInvoker`]. Stop and two-phase delete live here too.

pub mod dispatcher;
pub mod error;
pub mod heartbeat;
pub mod invoker;
pub mod lifecycle;
pub mod runtime;

pub use dispatcher::{DispatchOutcome, Dispatcher};
pub use error::DispatchError;
pub use heartbeat::HeartbeatService;
pub use invoker::{InvokeReceipt, LocalInvoker, WorkerInvoker};
pub use lifecycle::ScanLifecycle;
pub use runtime::ScanRuntime;

#[cfg(any(test, feature = "test-support"))]
pub use invoker::FakeInvoker;
