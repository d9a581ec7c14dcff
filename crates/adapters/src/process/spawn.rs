// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Spawning workers directly from a command + environment

use super::ProcessError;
use std::fs::File;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::process::{Child, Command};

#[cfg(windows)]
const CREATE_NEW_PROCESS_GROUP: u32 = 0x0000_0200;
#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// Executable, arguments and environment overlay for one worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchCommand {
    pub program: String,
    pub args: Vec<String>,
    /// Added on top of the inherited environment
    pub env: Vec<(String, String)>,
    pub cwd: Option<PathBuf>,
}

impl LaunchCommand {
    /// Program and arguments joined for logging.
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn env_value(&self, key: &str) -> Option<&str> {
        self.env
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// A spawned worker.
///
/// Owns the child handle when the worker was spawned by this process, so
/// its exit status can be collected and no zombie is left behind.
#[derive(Debug)]
pub struct WorkerHandle {
    pid: u32,
    child: Option<Child>,
    exit: Option<ExitStatus>,
}

impl WorkerHandle {
    pub fn from_child(child: Child, program: &str) -> Result<Self, ProcessError> {
        let pid = child
            .id()
            .ok_or_else(|| ProcessError::NoPid(program.to_string()))?;
        Ok(Self {
            pid,
            child: Some(child),
            exit: None,
        })
    }

    /// Handle for a process not owned by this one.
    pub fn unowned(pid: u32) -> Self {
        Self {
            pid,
            child: None,
            exit: None,
        }
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn is_owned(&self) -> bool {
        self.child.is_some()
    }

    /// Exit status if the owned child has exited. Never blocks.
    pub fn try_exit(&mut self) -> Option<ExitStatus> {
        if self.exit.is_none() {
            if let Some(child) = self.child.as_mut() {
                match child.try_wait() {
                    Ok(status) => self.exit = status,
                    Err(e) => tracing::debug!(pid = self.pid, error = %e, "try_wait failed"),
                }
            }
        }
        self.exit
    }

    /// Wait up to `timeout` for the owned child to be collected.
    pub async fn reap(&mut self, timeout: Duration) -> Option<ExitStatus> {
        if let Some(status) = self.try_exit() {
            return Some(status);
        }
        let child = self.child.as_mut()?;
        match tokio::time::timeout(timeout, child.wait()).await {
            Ok(Ok(status)) => self.exit = Some(status),
            Ok(Err(e)) => tracing::debug!(pid = self.pid, error = %e, "wait failed"),
            Err(_) => tracing::debug!(pid = self.pid, "child not reaped within timeout"),
        }
        self.exit
    }
}

/// Spawn `command` in its own process group with output appended to `log`.
pub(crate) fn spawn_worker(command: &LaunchCommand, log: File) -> Result<WorkerHandle, ProcessError> {
    let stderr = log.try_clone().map_err(ProcessError::Log)?;

    let mut cmd = Command::new(&command.program);
    cmd.args(&command.args)
        .envs(command.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .stdin(Stdio::null())
        .stdout(Stdio::from(log))
        .stderr(Stdio::from(stderr))
        .kill_on_drop(false);
    if let Some(cwd) = &command.cwd {
        cmd.current_dir(cwd);
    }
    #[cfg(unix)]
    cmd.process_group(0);
    #[cfg(windows)]
    cmd.creation_flags(CREATE_NEW_PROCESS_GROUP | CREATE_NO_WINDOW);

    let child = cmd.spawn().map_err(|source| ProcessError::Spawn {
        program: command.program.clone(),
        source,
    })?;
    WorkerHandle::from_child(child, &command.program)
}

#[cfg(test)]
#[path = "spawn_tests.rs"]
mod tests;
