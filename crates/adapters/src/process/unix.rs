// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! POSIX strategy: process groups, signals and `ps`

use super::{ProcessControl, ProcessError, ProcessInfo, ProcessTable};
use crate::subprocess::run_with_timeout;
use async_trait::async_trait;
use nix::errno::Errno;
use nix::sys::signal::{kill, killpg, Signal};
use nix::unistd::Pid;
use tokio::process::Command;

const PS_FORMAT: &str = "pid=,ppid=,pgid=,stat=,args=";

#[derive(Debug, Clone, Copy, Default)]
pub struct UnixControl;

/// Convert to a nix pid, refusing pids whose signal would hit more than one
/// process (0, 1, wraparound) or this process itself.
fn target(pid: u32) -> Result<Pid, ProcessError> {
    match i32::try_from(pid) {
        Ok(raw) if raw > 1 && pid != std::process::id() => Ok(Pid::from_raw(raw)),
        _ => Err(ProcessError::Forbidden(pid)),
    }
}

fn signal_result(pid: u32, result: nix::Result<()>) -> Result<(), ProcessError> {
    match result {
        Ok(()) | Err(Errno::ESRCH) => Ok(()),
        Err(errno) => Err(ProcessError::Signal {
            pid,
            message: errno.desc().to_string(),
        }),
    }
}

async fn ps(args: &[&str]) -> Result<String, ProcessError> {
    let mut cmd = Command::new("ps");
    cmd.args(args);
    let output = run_with_timeout(cmd, crate::env::process_query_timeout(), "ps")
        .await
        .map_err(ProcessError::Query)?;
    // ps exits 1 when `-p` matches nothing; stdout is empty in that case.
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

#[async_trait]
impl ProcessControl for UnixControl {
    async fn snapshot(&self) -> Result<ProcessTable, ProcessError> {
        let out = ps(&["-axo", PS_FORMAT]).await?;
        let table = ProcessTable::parse_ps(&out);
        if table.is_empty() {
            return Err(ProcessError::Query("ps returned no processes".into()));
        }
        Ok(table)
    }

    async fn probe(&self, pid: u32) -> Option<ProcessInfo> {
        let nix_pid = match i32::try_from(pid) {
            Ok(raw) if raw > 0 => Pid::from_raw(raw),
            _ => return None,
        };
        // EPERM still means the process exists
        if let Err(Errno::ESRCH) = kill(nix_pid, None) {
            return None;
        }
        let pid_arg = pid.to_string();
        match ps(&["-o", PS_FORMAT, "-p", pid_arg.as_str()]).await {
            Ok(out) => ProcessTable::parse_ps(&out).get(pid).cloned(),
            Err(e) => {
                tracing::debug!(pid, error = %e, "ps probe failed, trusting kill(0)");
                Some(ProcessInfo {
                    pid,
                    ppid: 0,
                    pgid: None,
                    zombie: false,
                    command: String::new(),
                })
            }
        }
    }

    async fn terminate(&self, pid: u32) -> Result<(), ProcessError> {
        signal_result(pid, kill(target(pid)?, Signal::SIGTERM))
    }

    async fn force_kill(&self, pid: u32) -> Result<(), ProcessError> {
        signal_result(pid, kill(target(pid)?, Signal::SIGKILL))
    }

    async fn terminate_group(&self, pgid: u32) -> Result<(), ProcessError> {
        guard_own_group(pgid)?;
        signal_result(pgid, killpg(target(pgid)?, Signal::SIGTERM))
    }

    async fn force_kill_group(&self, pgid: u32) -> Result<(), ProcessError> {
        guard_own_group(pgid)?;
        signal_result(pgid, killpg(target(pgid)?, Signal::SIGKILL))
    }
}

fn guard_own_group(pgid: u32) -> Result<(), ProcessError> {
    let own = nix::unistd::getpgrp().as_raw();
    if i32::try_from(pgid).is_ok_and(|raw| raw == own) {
        return Err(ProcessError::Forbidden(pgid));
    }
    Ok(())
}

#[cfg(test)]
#[path = "unix_tests.rs"]
mod tests;
