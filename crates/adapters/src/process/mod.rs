// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker process control: spawning, liveness, tree termination

mod os;
mod spawn;
mod table;
mod tree;
#[cfg(unix)]
mod unix;
#[cfg(windows)]
mod windows;

#[cfg(any(test, feature = "test-support"))]
mod fake;

pub use os::OsProcessAdapter;
pub use spawn::{LaunchCommand, WorkerHandle};
pub use table::{ProcessInfo, ProcessTable};
pub use tree::{kill_group_leftovers, kill_tree, KillReport, KillTimeouts};

#[cfg(unix)]
pub use unix::UnixControl as PlatformControl;
#[cfg(windows)]
pub use windows::WindowsControl as PlatformControl;

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeProcessAdapter, ProcessCall};

use async_trait::async_trait;
use std::fs::File;
use thiserror::Error;

/// Errors from process operations
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("spawned {0} but the OS reported no pid")]
    NoPid(String),
    #[error("failed to redirect worker output: {0}")]
    Log(#[source] std::io::Error),
    #[error("signal to {pid} failed: {message}")]
    Signal { pid: u32, message: String },
    #[error("process query failed: {0}")]
    Query(String),
    #[error("refusing to signal pid {0}")]
    Forbidden(u32),
    #[error("{0} is not supported on this platform")]
    Unsupported(&'static str),
}

/// Low-level OS primitives the tree killer is built from.
///
/// Implementations must treat an already-exited process as success for
/// the signal operations.
#[async_trait]
pub trait ProcessControl: Send + Sync + 'static {
    /// Full process table.
    async fn snapshot(&self) -> Result<ProcessTable, ProcessError>;

    /// Current info for one pid, `None` if no such process exists.
    async fn probe(&self, pid: u32) -> Option<ProcessInfo>;

    /// Ask a process to exit.
    async fn terminate(&self, pid: u32) -> Result<(), ProcessError>;

    /// Kill a process outright.
    async fn force_kill(&self, pid: u32) -> Result<(), ProcessError>;

    /// Ask every member of the process group led by `pgid` to exit.
    async fn terminate_group(&self, pgid: u32) -> Result<(), ProcessError>;

    /// Kill every member of the process group led by `pgid`.
    async fn force_kill_group(&self, pgid: u32) -> Result<(), ProcessError>;

    /// True if `pid` exists and is not a zombie.
    async fn is_running(&self, pid: u32) -> bool {
        self.probe(pid).await.is_some_and(|info| !info.zombie)
    }
}

/// Adapter the supervisor drives worker processes through
#[async_trait]
pub trait ProcessAdapter: Clone + Send + Sync + 'static {
    /// Start `command` as a process-group leader with stdout and stderr
    /// appended to `log`.
    async fn spawn(&self, command: &LaunchCommand, log: File)
        -> Result<WorkerHandle, ProcessError>;

    /// Whether the worker is still running.
    ///
    /// Reaps the owned child when it has exited. When the OS exposes the
    /// command line, it must contain `expect_in_cmdline`; a mismatch means
    /// the pid was reused.
    async fn is_alive(&self, worker: &mut WorkerHandle, expect_in_cmdline: &str) -> bool;

    /// Terminate `pid` and all of its descendants.
    async fn kill_tree(&self, pid: u32) -> KillReport;

    /// Kill members of the process group `pgid` left running after its
    /// leader exited. A no-op while the leader is running.
    async fn kill_leftovers(&self, pgid: u32) -> KillReport;

    /// Pids of running processes whose command line contains every needle,
    /// excluding the current process.
    async fn find_by_command(&self, needles: &[String]) -> Vec<u32>;
}
