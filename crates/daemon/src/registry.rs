// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory registry of tracked agents

use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime};

use vam_adapters::WorkerHandle;
use vam_core::{AgentId, AgentSummary, AgentType, SlotPolicy, UserId};

/// One tracked agent. Owns the worker handle and the open log file.
#[derive(Debug)]
pub struct AgentRecord {
    pub user_id: UserId,
    pub agent_id: AgentId,
    pub agent_type: AgentType,
    pub worker: WorkerHandle,
    pub port: u16,
    pub started_at: Instant,
    pub started_wall: SystemTime,
    pub log_path: PathBuf,
    pub marker_path: PathBuf,
    log: Option<File>,
}

impl AgentRecord {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        user_id: UserId,
        agent_id: AgentId,
        agent_type: AgentType,
        worker: WorkerHandle,
        port: u16,
        started_at: Instant,
        started_wall: SystemTime,
        log_path: PathBuf,
        marker_path: PathBuf,
        log: File,
    ) -> Self {
        Self {
            user_id,
            agent_id,
            agent_type,
            worker,
            port,
            started_at,
            started_wall,
            log_path,
            marker_path,
            log: Some(log),
        }
    }

    pub fn pid(&self) -> u32 {
        self.worker.pid()
    }

    pub fn log_open(&self) -> bool {
        self.log.is_some()
    }

    pub fn summary(&self, now: Instant) -> AgentSummary {
        AgentSummary {
            user_id: self.user_id.clone(),
            agent_type: self.agent_type,
            agent_id: self.agent_id.clone(),
            port: self.port,
            pid: self.pid(),
            running_time: now.saturating_duration_since(self.started_at).as_secs_f64(),
        }
    }

    /// Close the log, reap the child and delete the liveness marker.
    ///
    /// Consumes the record so release happens at most once.
    pub async fn release(mut self, reap_timeout: Duration) -> ReleasedAgent {
        let exit = self.worker.reap(reap_timeout).await;
        drop(self.log.take());
        match std::fs::remove_file(&self.marker_path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(
                path = %self.marker_path.display(),
                error = %e,
                "failed to remove liveness marker"
            ),
        }
        ReleasedAgent {
            user_id: self.user_id,
            agent_id: self.agent_id,
            pid: self.worker.pid(),
            exit_code: exit.and_then(|s| s.code()),
            log_path: self.log_path,
        }
    }
}

/// What remains after an agent's resources are released
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleasedAgent {
    pub user_id: UserId,
    pub agent_id: AgentId,
    pub pid: u32,
    pub exit_code: Option<i32>,
    pub log_path: PathBuf,
}

#[derive(Debug, Default)]
pub struct Registry {
    records: HashMap<UserId, AgentRecord>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, user_id: &str) -> Option<&AgentRecord> {
        self.records.get(user_id)
    }

    pub fn get_mut(&mut self, user_id: &str) -> Option<&mut AgentRecord> {
        self.records.get_mut(user_id)
    }

    /// Record occupying the slot `user_id` would need under `policy`.
    pub fn slot_holder(&self, policy: SlotPolicy, user_id: &str) -> Option<&AgentRecord> {
        match policy {
            SlotPolicy::PerUser => self.records.get(user_id),
            SlotPolicy::Global => self
                .records
                .get(user_id)
                .or_else(|| self.records.values().next()),
        }
    }

    /// Add a record. Hands it back if the user already has one.
    pub fn insert(&mut self, record: AgentRecord) -> Result<(), Box<AgentRecord>> {
        if self.records.contains_key(&record.user_id) {
            return Err(Box::new(record));
        }
        self.records.insert(record.user_id.clone(), record);
        Ok(())
    }

    pub fn remove(&mut self, user_id: &str) -> Option<AgentRecord> {
        self.records.remove(user_id)
    }

    pub fn drain(&mut self) -> Vec<AgentRecord> {
        self.records.drain().map(|(_, r)| r).collect()
    }

    pub fn user_ids(&self) -> Vec<UserId> {
        let mut ids: Vec<UserId> = self.records.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Root pids of every tracked worker.
    pub fn pids(&self) -> Vec<u32> {
        self.records.values().map(AgentRecord::pid).collect()
    }

    pub fn ports_in_use(&self) -> Vec<u16> {
        self.records.values().map(|r| r.port).collect()
    }

    /// True if `path` is the log or marker of a tracked agent.
    pub fn references(&self, path: &Path) -> bool {
        self.records
            .values()
            .any(|r| r.log_path == path || r.marker_path == path)
    }

    /// Summaries sorted by user id.
    pub fn snapshot(&self, now: Instant) -> Vec<AgentSummary> {
        let mut out: Vec<AgentSummary> = self.records.values().map(|r| r.summary(now)).collect();
        out.sort_by(|a, b| a.user_id.cmp(&b.user_id));
        out
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
