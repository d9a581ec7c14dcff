// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Periodic pruning sweep

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::debug;
use vam_adapters::ProcessAdapter;
use vam_core::{Clock, IdGen};

use crate::supervisor::Supervisor;

/// Spawn a task that prunes dead agents and stale files every `interval`.
///
/// The first pass runs one full interval after spawning. Abort the handle to
/// stop the sweeper.
pub fn spawn_sweeper<P, C, G>(supervisor: Supervisor<P, C, G>, interval: Duration) -> JoinHandle<()>
where
    P: ProcessAdapter,
    C: Clock,
    G: IdGen + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // interval() fires immediately; skip that tick
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let report = supervisor.sweep().await;
            debug!(
                pruned = report.pruned,
                orphan_files = report.orphan_files,
                "sweep complete"
            );
        }
    })
}

#[cfg(test)]
#[path = "sweep_tests.rs"]
mod tests;
