// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake process adapter for deterministic testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{KillReport, LaunchCommand, ProcessAdapter, ProcessError, WorkerHandle};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fs::File;
use std::sync::Arc;

/// Recorded call to FakeProcessAdapter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessCall {
    Spawn { command: LaunchCommand },
    KillTree { pid: u32 },
    KillLeftovers { pgid: u32 },
    FindByCommand { needles: Vec<String> },
}

/// Fake process adapter for testing
///
/// Processes exist only in memory. Tests decide when they exit, whether
/// they survive kills, and what else is in the process table.
#[derive(Clone)]
pub struct FakeProcessAdapter {
    inner: Arc<Mutex<FakeState>>,
}

struct FakeState {
    next_pid: u32,
    procs: BTreeMap<u32, FakeProc>,
    calls: Vec<ProcessCall>,
    spawn_error: Option<String>,
    exit_on_spawn: bool,
    write_marker: bool,
}

struct FakeProc {
    command_line: String,
    alive: bool,
    unkillable: bool,
}

impl Default for FakeProcessAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeProcessAdapter {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeState {
                next_pid: 10_000,
                procs: BTreeMap::new(),
                calls: Vec::new(),
                spawn_error: None,
                exit_on_spawn: false,
                write_marker: false,
            })),
        }
    }

    pub fn calls(&self) -> Vec<ProcessCall> {
        self.inner.lock().calls.clone()
    }

    /// Commands passed to spawn, in order
    pub fn spawned(&self) -> Vec<LaunchCommand> {
        self.inner
            .lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                ProcessCall::Spawn { command } => Some(command.clone()),
                _ => None,
            })
            .collect()
    }

    /// Pids passed to kill_tree, in order
    pub fn killed(&self) -> Vec<u32> {
        self.inner
            .lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                ProcessCall::KillTree { pid } => Some(*pid),
                _ => None,
            })
            .collect()
    }

    /// Fail the next spawn with `message`
    pub fn set_spawn_error(&self, message: impl Into<String>) {
        self.inner.lock().spawn_error = Some(message.into());
    }

    /// Spawned processes exit before anyone can look at them
    pub fn set_exit_on_spawn(&self, exit: bool) {
        self.inner.lock().exit_on_spawn = exit;
    }

    /// Write the worker's `USER_AGENT_PID_FILE` on spawn, as a real worker would
    pub fn set_write_marker(&self, write: bool) {
        self.inner.lock().write_marker = write;
    }

    /// Simulate the process exiting on its own
    pub fn exit(&self, pid: u32) {
        if let Some(p) = self.inner.lock().procs.get_mut(&pid) {
            p.alive = false;
        }
    }

    /// Make kill_tree fail to stop this process
    pub fn set_unkillable(&self, pid: u32) {
        if let Some(p) = self.inner.lock().procs.get_mut(&pid) {
            p.unkillable = true;
        }
    }

    /// Add a process the adapter did not spawn, returning its pid
    pub fn add_stray(&self, command_line: impl Into<String>) -> u32 {
        let mut inner = self.inner.lock();
        let pid = inner.next_pid;
        inner.next_pid += 1;
        inner.procs.insert(
            pid,
            FakeProc {
                command_line: command_line.into(),
                alive: true,
                unkillable: false,
            },
        );
        pid
    }

    pub fn is_running(&self, pid: u32) -> bool {
        self.inner.lock().procs.get(&pid).is_some_and(|p| p.alive)
    }

    pub fn running_pids(&self) -> Vec<u32> {
        self.inner
            .lock()
            .procs
            .iter()
            .filter(|(_, p)| p.alive)
            .map(|(pid, _)| *pid)
            .collect()
    }
}

#[async_trait]
impl ProcessAdapter for FakeProcessAdapter {
    async fn spawn(
        &self,
        command: &LaunchCommand,
        _log: File,
    ) -> Result<WorkerHandle, ProcessError> {
        let mut inner = self.inner.lock();
        inner.calls.push(ProcessCall::Spawn {
            command: command.clone(),
        });
        if let Some(message) = inner.spawn_error.take() {
            return Err(ProcessError::Spawn {
                program: command.program.clone(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, message),
            });
        }

        let pid = inner.next_pid;
        inner.next_pid += 1;
        let alive = !inner.exit_on_spawn;
        inner.procs.insert(
            pid,
            FakeProc {
                command_line: command.display(),
                alive,
                unkillable: false,
            },
        );
        if inner.write_marker && alive {
            if let Some(marker) = command.env_value("USER_AGENT_PID_FILE") {
                if let Err(e) = std::fs::write(marker, pid.to_string()) {
                    tracing::warn!(error = %e, "fake worker failed to write marker");
                }
            }
        }
        Ok(WorkerHandle::unowned(pid))
    }

    async fn is_alive(&self, worker: &mut WorkerHandle, expect_in_cmdline: &str) -> bool {
        self.inner
            .lock()
            .procs
            .get(&worker.pid())
            .is_some_and(|p| p.alive && p.command_line.contains(expect_in_cmdline))
    }

    async fn kill_tree(&self, pid: u32) -> KillReport {
        let mut inner = self.inner.lock();
        inner.calls.push(ProcessCall::KillTree { pid });
        match inner.procs.get_mut(&pid) {
            Some(p) if p.alive && p.unkillable => KillReport {
                pid,
                root_gone: false,
                signaled: vec![pid],
                survivors: vec![pid],
                ..KillReport::default()
            },
            Some(p) if p.alive => {
                p.alive = false;
                KillReport {
                    pid,
                    root_gone: true,
                    signaled: vec![pid],
                    ..KillReport::default()
                }
            }
            _ => KillReport::already_gone(pid),
        }
    }

    async fn kill_leftovers(&self, pgid: u32) -> KillReport {
        self.inner
            .lock()
            .calls
            .push(ProcessCall::KillLeftovers { pgid });
        KillReport::already_gone(pgid)
    }

    async fn find_by_command(&self, needles: &[String]) -> Vec<u32> {
        let mut inner = self.inner.lock();
        inner.calls.push(ProcessCall::FindByCommand {
            needles: needles.to_vec(),
        });
        if needles.is_empty() {
            return Vec::new();
        }
        inner
            .procs
            .iter()
            .filter(|(_, p)| p.alive)
            .filter(|(_, p)| needles.iter().all(|n| p.command_line.contains(n.as_str())))
            .map(|(pid, _)| *pid)
            .collect()
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
