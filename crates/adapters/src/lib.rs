// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Adapters for OS process control

mod env;
pub mod process;
pub mod subprocess;
pub mod traced;

pub use process::{
    kill_group_leftovers, kill_tree, KillReport, KillTimeouts, LaunchCommand, OsProcessAdapter, PlatformControl,
    ProcessAdapter, ProcessControl, ProcessError, ProcessInfo, ProcessTable, WorkerHandle,
};
pub use traced::TracedProcess;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use process::{FakeProcessAdapter, ProcessCall};
