// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process tree termination with graceful-then-forceful escalation

use super::ProcessControl;
use std::time::Duration;
use tokio::time::Instant;

/// Escalation bounds for [`kill_tree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KillTimeouts {
    /// How long to wait after the graceful signal
    pub term: Duration,
    /// How long to wait after the forceful signal
    pub kill: Duration,
    /// Liveness poll interval while waiting
    pub poll: Duration,
}

impl Default for KillTimeouts {
    fn default() -> Self {
        Self {
            term: Duration::from_secs(1),
            kill: Duration::from_secs(1),
            poll: crate::env::kill_poll_ms(),
        }
    }
}

/// Outcome of one tree termination
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KillReport {
    pub pid: u32,
    /// The root process is confirmed gone
    pub root_gone: bool,
    /// The process did not exist when the kill started
    pub already_gone: bool,
    /// Every pid a signal was sent to, descendants first
    pub signaled: Vec<u32>,
    /// Pids still running after the forceful round
    pub survivors: Vec<u32>,
    /// The whole group was signalled at once
    pub used_group: bool,
}

impl KillReport {
    pub fn already_gone(pid: u32) -> Self {
        Self {
            pid,
            root_gone: true,
            already_gone: true,
            ..Self::default()
        }
    }

    /// Root and all known descendants are gone.
    pub fn is_complete(&self) -> bool {
        self.root_gone && self.survivors.is_empty()
    }
}

/// Terminate `root` and every descendant.
///
/// Signal and query failures are logged and never abort the sequence; the
/// report reflects the final liveness check only. A root that is already
/// gone still has its leftover group members killed.
pub async fn kill_tree<C: ProcessControl + ?Sized>(
    control: &C,
    root: u32,
    timeouts: KillTimeouts,
) -> KillReport {
    if !control.is_running(root).await {
        return kill_group_leftovers(control, root, timeouts).await;
    }

    let mut report = KillReport {
        pid: root,
        ..KillReport::default()
    };

    let (mut targets, group) = match control.snapshot().await {
        Ok(table) => {
            let mut targets = table.descendants(root);
            let leader = table.get(root).is_some_and(|p| p.is_group_leader());
            if leader {
                for pid in table.group_members(root) {
                    if !targets.contains(&pid) {
                        targets.insert(0, pid);
                    }
                }
            }
            (targets, leader)
        }
        Err(e) => {
            tracing::warn!(pid = root, error = %e, "process table unavailable, killing root only");
            (Vec::new(), true)
        }
    };
    targets.push(root);

    let alive = escalate(control, root, group, &targets, timeouts, &mut report).await;
    report.root_gone = !alive.contains(&root);
    report.survivors = alive;
    report
}

/// Kill what is left of the group led by `pgid` once its leader has
/// exited. Does nothing while the leader still runs, since then the pid
/// may belong to an unrelated process.
pub async fn kill_group_leftovers<C: ProcessControl + ?Sized>(
    control: &C,
    pgid: u32,
    timeouts: KillTimeouts,
) -> KillReport {
    let mut report = KillReport::already_gone(pgid);
    if control.is_running(pgid).await {
        return report;
    }
    let members: Vec<u32> = match control.snapshot().await {
        Ok(table) => table
            .group_members(pgid)
            .into_iter()
            .filter(|&pid| table.get(pid).is_some_and(|p| !p.zombie))
            .collect(),
        Err(e) => {
            tracing::debug!(pgid, error = %e, "process table unavailable, skipping group leftovers");
            Vec::new()
        }
    };
    if members.is_empty() {
        tracing::debug!(pid = pgid, "process already gone");
        return report;
    }

    tracing::info!(pgid, members = members.len(), "leader gone, killing leftover group members");
    let alive = escalate(control, pgid, true, &members, timeouts, &mut report).await;
    report.survivors = alive;
    report
}

/// TERM (group first when `group`), wait, then KILL what is left and wait
/// again. Returns the pids still running.
async fn escalate<C: ProcessControl + ?Sized>(
    control: &C,
    pgid: u32,
    group: bool,
    targets: &[u32],
    timeouts: KillTimeouts,
    report: &mut KillReport,
) -> Vec<u32> {
    if group {
        match control.terminate_group(pgid).await {
            Ok(()) => report.used_group = true,
            Err(e) => tracing::debug!(pgid, error = %e, "group terminate failed"),
        }
    }
    for &pid in targets {
        if let Err(e) = control.terminate(pid).await {
            tracing::warn!(pid, error = %e, "terminate failed");
        }
    }
    report.signaled = targets.to_vec();

    let mut alive = wait_for_exit(control, targets, timeouts.term, timeouts.poll).await;
    if !alive.is_empty() {
        tracing::info!(pid = pgid, remaining = alive.len(), "escalating to forceful kill");
        if report.used_group {
            if let Err(e) = control.force_kill_group(pgid).await {
                tracing::debug!(pgid, error = %e, "group kill failed");
            }
        }
        for &pid in &alive {
            if let Err(e) = control.force_kill(pid).await {
                tracing::warn!(pid, error = %e, "force kill failed");
            }
        }
        alive = wait_for_exit(control, &alive, timeouts.kill, timeouts.poll).await;
    }
    alive
}

/// Poll until every pid has exited or `within` elapses; returns the
/// pids still running.
async fn wait_for_exit<C: ProcessControl + ?Sized>(
    control: &C,
    pids: &[u32],
    within: Duration,
    poll: Duration,
) -> Vec<u32> {
    let deadline = Instant::now() + within;
    loop {
        let mut alive = Vec::new();
        for &pid in pids {
            if control.is_running(pid).await {
                alive.push(pid);
            }
        }
        if alive.is_empty() || Instant::now() >= deadline {
            return alive;
        }
        tokio::time::sleep(poll).await;
    }
}

#[cfg(test)]
#[path = "tree_tests.rs"]
mod tests;
