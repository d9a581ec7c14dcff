// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Production process adapter over the platform control strategy

use super::spawn::spawn_worker;
use super::{
    kill_group_leftovers, kill_tree, KillReport, KillTimeouts, LaunchCommand, PlatformControl, ProcessAdapter,
    ProcessControl, ProcessError, WorkerHandle,
};
use async_trait::async_trait;
use std::fs::File;
use std::sync::Arc;

pub struct OsProcessAdapter<C = PlatformControl> {
    control: Arc<C>,
    timeouts: KillTimeouts,
}

impl<C> Clone for OsProcessAdapter<C> {
    fn clone(&self) -> Self {
        Self {
            control: Arc::clone(&self.control),
            timeouts: self.timeouts,
        }
    }
}

impl OsProcessAdapter<PlatformControl> {
    pub fn new(timeouts: KillTimeouts) -> Self {
        Self::with_control(PlatformControl::default(), timeouts)
    }
}

impl<C: ProcessControl> OsProcessAdapter<C> {
    pub fn with_control(control: C, timeouts: KillTimeouts) -> Self {
        Self {
            control: Arc::new(control),
            timeouts,
        }
    }

    pub fn timeouts(&self) -> KillTimeouts {
        self.timeouts
    }
}

#[async_trait]
impl<C: ProcessControl> ProcessAdapter for OsProcessAdapter<C> {
    async fn spawn(
        &self,
        command: &LaunchCommand,
        log: File,
    ) -> Result<WorkerHandle, ProcessError> {
        spawn_worker(command, log)
    }

    async fn is_alive(&self, worker: &mut WorkerHandle, expect_in_cmdline: &str) -> bool {
        if worker.try_exit().is_some() {
            return false;
        }
        match self.control.probe(worker.pid()).await {
            None => false,
            Some(info) if info.zombie => false,
            Some(info) if info.command.is_empty() || expect_in_cmdline.is_empty() => true,
            Some(info) => {
                let matches = info.command.contains(expect_in_cmdline);
                if !matches {
                    tracing::warn!(
                        pid = info.pid,
                        command = %info.command,
                        expected = expect_in_cmdline,
                        "pid reused by an unrelated process"
                    );
                }
                matches
            }
        }
    }

    async fn kill_tree(&self, pid: u32) -> KillReport {
        kill_tree(self.control.as_ref(), pid, self.timeouts).await
    }

    async fn kill_leftovers(&self, pgid: u32) -> KillReport {
        kill_group_leftovers(self.control.as_ref(), pgid, self.timeouts).await
    }

    async fn find_by_command(&self, needles: &[String]) -> Vec<u32> {
        match self.control.snapshot().await {
            Ok(table) => table.matching(needles, std::process::id()),
            Err(e) => {
                tracing::warn!(error = %e, "process table scan failed");
                Vec::new()
            }
        }
    }
}
