// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced adapter wrapper for consistent observability

use crate::process::{KillReport, LaunchCommand, ProcessAdapter, ProcessError, WorkerHandle};
use async_trait::async_trait;
use std::fs::File;
use tracing::Instrument;

/// Wrapper that adds tracing to any ProcessAdapter
#[derive(Clone)]
pub struct TracedProcess<P> {
    inner: P,
}

impl<P> TracedProcess<P> {
    pub fn new(inner: P) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }
}

#[async_trait]
impl<P: ProcessAdapter> ProcessAdapter for TracedProcess<P> {
    async fn spawn(
        &self,
        command: &LaunchCommand,
        log: File,
    ) -> Result<WorkerHandle, ProcessError> {
        async {
            tracing::info!(command = %command.display(), env_count = command.env.len(), "starting");
            let start = std::time::Instant::now();
            let result = self.inner.spawn(command, log).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;
            match &result {
                Ok(worker) => tracing::info!(pid = worker.pid(), elapsed_ms, "worker spawned"),
                Err(e) => tracing::error!(elapsed_ms, error = %e, "spawn failed"),
            }
            result
        }
        .instrument(tracing::info_span!("process.spawn", program = %command.program))
        .await
    }

    async fn is_alive(&self, worker: &mut WorkerHandle, expect_in_cmdline: &str) -> bool {
        let alive = self.inner.is_alive(worker, expect_in_cmdline).await;
        tracing::trace!(pid = worker.pid(), alive, "checked");
        alive
    }

    async fn kill_tree(&self, pid: u32) -> KillReport {
        async {
            let start = std::time::Instant::now();
            let report = self.inner.kill_tree(pid).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;
            if report.already_gone {
                tracing::debug!(elapsed_ms, "already gone");
            } else if report.is_complete() {
                tracing::info!(elapsed_ms, signaled = report.signaled.len(), "tree terminated");
            } else {
                tracing::warn!(
                    elapsed_ms,
                    root_gone = report.root_gone,
                    survivors = ?report.survivors,
                    "tree termination incomplete"
                );
            }
            report
        }
        .instrument(tracing::info_span!("process.kill_tree", pid))
        .await
    }

    async fn kill_leftovers(&self, pgid: u32) -> KillReport {
        let report = self.inner.kill_leftovers(pgid).await;
        if !report.signaled.is_empty() {
            tracing::info_span!("process.kill_leftovers", pgid).in_scope(|| {
                tracing::info!(
                    signaled = report.signaled.len(),
                    survivors = ?report.survivors,
                    "killed leftover group members"
                )
            });
        }
        report
    }

    async fn find_by_command(&self, needles: &[String]) -> Vec<u32> {
        let found = self.inner.find_by_command(needles).await;
        tracing::info_span!("process.find", needles = ?needles)
            .in_scope(|| tracing::debug!(found = ?found, "scanned process table"));
        found
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
