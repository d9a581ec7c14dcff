// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lifecycle supervisor: start, stop, list, prune and shutdown of workers
//!
//! Every operation runs with the registry lock held for its full duration,
//! including the bounded waits for startup confirmation and tree
//! termination. Concurrent starts therefore serialize on prune + check +
//! spawn + insert, and a stop is complete before the next start evaluates
//! the slot.
//!
//! Start and stop run on their own task. A caller that gives up, such as a
//! dropped HTTP request, cannot cancel them between spawn and insert or
//! between remove and kill.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::{error, info, warn};
use vam_adapters::{KillReport, ProcessAdapter, WorkerHandle};
use vam_core::{
    AgentCodeGen, AgentId, AgentSummary, AgentType, Clock, IdGen, SlotPolicy, SystemClock,
    UserAgentConfig, UserId,
};

use crate::error::SupervisorError;
use crate::launch::{agent_needle, user_needle, LaunchBuilder, LaunchPlan, LaunchRequest};
use crate::port::{loopback_port_free, PortAllocator};
use crate::registry::{AgentRecord, Registry};

/// How long to wait for a killed child to be collected
const REAP_TIMEOUT: Duration = Duration::from_millis(500);

/// Bytes of worker log quoted when a start fails
const LOG_TAIL_BYTES: u64 = 2048;

#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    pub policy: SlotPolicy,
    /// Root of per-user data; user config lives under `<root>/<user>/config`
    pub storage_root: PathBuf,
    pub startup_grace: Duration,
    pub startup_timeout: Duration,
    /// Also wait for the worker's PID marker before confirming a start
    pub require_marker: bool,
    pub startup_poll: Duration,
    pub orphan_ttl: Duration,
    pub ports: PortAllocator,
}

/// Result of a successful start
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartedAgent {
    pub user_id: UserId,
    pub agent_id: AgentId,
    pub agent_type: AgentType,
    pub port: u16,
    pub pid: u32,
}

/// Result of a successful stop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoppedAgent {
    pub user_id: UserId,
    pub agent_id: AgentId,
    /// The whole tree was confirmed gone
    pub terminated: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub pruned: usize,
    pub orphan_files: usize,
}

/// Point-in-time daemon status
#[derive(Debug, Clone, PartialEq)]
pub struct SupervisorStatus {
    pub policy: SlotPolicy,
    pub uptime: Duration,
    pub agents: usize,
}

pub struct Supervisor<P, C = SystemClock, G = AgentCodeGen> {
    inner: Arc<Inner<P, C, G>>,
}

impl<P, C, G> Clone for Supervisor<P, C, G> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct Inner<P, C, G> {
    config: SupervisorConfig,
    builder: LaunchBuilder,
    process: P,
    clock: C,
    ids: G,
    started_at: Instant,
    registry: Mutex<Registry>,
}

impl<P: ProcessAdapter> Supervisor<P> {
    pub fn new(config: SupervisorConfig, builder: LaunchBuilder, process: P) -> Self {
        Self::with_parts(config, builder, process, SystemClock, AgentCodeGen)
    }
}

impl<P, C, G> Supervisor<P, C, G>
where
    P: ProcessAdapter,
    C: Clock,
    G: IdGen + 'static,
{
    pub fn with_parts(
        config: SupervisorConfig,
        builder: LaunchBuilder,
        process: P,
        clock: C,
        ids: G,
    ) -> Self {
        let started_at = clock.now();
        Self {
            inner: Arc::new(Inner {
                config,
                builder,
                process,
                clock,
                ids,
                started_at,
                registry: Mutex::new(Registry::new()),
            }),
        }
    }

    pub fn policy(&self) -> SlotPolicy {
        self.inner.config.policy
    }

    pub fn config(&self) -> &SupervisorConfig {
        &self.inner.config
    }

    pub async fn status(&self) -> SupervisorStatus {
        let agents = {
            let mut registry = self.inner.registry.lock().await;
            self.prune_locked(&mut registry).await;
            registry.len()
        };
        SupervisorStatus {
            policy: self.inner.config.policy,
            uptime: self.inner.clock.now().saturating_duration_since(self.inner.started_at),
            agents,
        }
    }

    /// Start a worker for `req`.
    pub async fn start(&self, req: LaunchRequest) -> Result<StartedAgent, SupervisorError> {
        let user_id = req.user_id.clone();
        let this = self.clone();
        tokio::spawn(async move { this.start_detached(req).await })
            .await
            .map_err(|e| SupervisorError::aborted("start", &user_id, e))?
    }

    async fn start_detached(&self, req: LaunchRequest) -> Result<StartedAgent, SupervisorError> {
        let mut registry = self.inner.registry.lock().await;
        self.prune_locked(&mut registry).await;

        if let Some(holder) = registry.slot_holder(self.inner.config.policy, req.user_id.as_str()) {
            info!(
                user_id = %req.user_id,
                holder = %holder.user_id,
                agent_id = %holder.agent_id,
                "start rejected, slot occupied"
            );
            return Err(SupervisorError::Conflict {
                requested: req.user_id.clone(),
                holder: holder.user_id.clone(),
                agent_id: holder.agent_id.clone(),
            });
        }

        let user_config =
            UserAgentConfig::load(&self.inner.config.storage_root, req.user_id.as_str())
                .map_err(|e| SupervisorError::launch(&req.user_id, None, e))?;

        let agent_id = AgentId::new(self.inner.ids.next());
        let port = self
            .inner
            .config
            .ports
            .allocate(
                req.user_id.as_str(),
                agent_id.as_str(),
                &registry.ports_in_use(),
                loopback_port_free,
            )
            .ok_or_else(|| {
                SupervisorError::launch(&req.user_id, Some(&agent_id), "no free port in range")
            })?;

        let plan = self
            .inner
            .builder
            .build(&req, &agent_id, port, &user_config)
            .map_err(|e| SupervisorError::from_launch(&req.user_id, Some(&agent_id), e))?;

        let (worker, log) = self.launch(&plan).await?;

        let record = AgentRecord::new(
            plan.user_id.clone(),
            plan.agent_id.clone(),
            plan.agent_type,
            worker,
            plan.port,
            self.inner.clock.now(),
            self.inner.clock.wall(),
            plan.log_path.clone(),
            plan.marker_path.clone(),
            log,
        );
        let pid = record.pid();
        if let Err(record) = registry.insert(record) {
            // Unreachable while the lock is held across the slot check
            self.teardown(record.worker.pid(), &plan).await;
            return Err(SupervisorError::Conflict {
                requested: plan.user_id.clone(),
                holder: plan.user_id.clone(),
                agent_id: plan.agent_id.clone(),
            });
        }

        info!(
            user_id = %plan.user_id,
            agent_id = %plan.agent_id,
            agent_type = %plan.agent_type,
            port = plan.port,
            pid,
            "agent started"
        );
        Ok(StartedAgent {
            user_id: plan.user_id,
            agent_id: plan.agent_id,
            agent_type: plan.agent_type,
            port: plan.port,
            pid,
        })
    }

    /// Open the log, spawn the worker and confirm it stays up.
    async fn launch(&self, plan: &LaunchPlan) -> Result<(WorkerHandle, File), SupervisorError> {
        let fail =
            |reason: String| SupervisorError::launch(&plan.user_id, Some(&plan.agent_id), reason);

        std::fs::create_dir_all(self.inner.builder.agents_dir())
            .map_err(|e| fail(format!("cannot create agents directory: {e}")))?;
        remove_if_exists(&plan.marker_path);
        let log = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&plan.log_path)
            .map_err(|e| fail(format!("cannot open log {}: {e}", plan.log_path.display())))?;
        let child_log = match log.try_clone() {
            Ok(f) => f,
            Err(e) => {
                drop(log);
                remove_if_exists(&plan.log_path);
                return Err(fail(format!("cannot share log handle: {e}")));
            }
        };

        let mut worker = match self.inner.process.spawn(&plan.command, child_log).await {
            Ok(w) => w,
            Err(e) => {
                drop(log);
                remove_if_exists(&plan.log_path);
                return Err(fail(e.to_string()));
            }
        };

        if let Err(reason) = self.confirm_startup(&mut worker, plan).await {
            let tail = read_tail(&plan.log_path, LOG_TAIL_BYTES);
            warn!(
                user_id = %plan.user_id,
                agent_id = %plan.agent_id,
                pid = worker.pid(),
                log_tail = %tail,
                "worker failed startup confirmation"
            );
            self.teardown(worker.pid(), plan).await;
            worker.reap(REAP_TIMEOUT).await;
            drop(log);
            remove_if_exists(&plan.log_path);
            return Err(fail(reason));
        }
        Ok((worker, log))
    }

    /// Poll until the grace period passes with the worker alive and, when
    /// required, the marker file has appeared.
    async fn confirm_startup(
        &self,
        worker: &mut WorkerHandle,
        plan: &LaunchPlan,
    ) -> Result<(), String> {
        let cfg = &self.inner.config;
        let needle = plan.agent_needle();
        let started = tokio::time::Instant::now();
        let grace_deadline = started + cfg.startup_grace;
        let marker_deadline = started + cfg.startup_timeout.max(cfg.startup_grace);

        loop {
            if !self.inner.process.is_alive(worker, &needle).await {
                return Err(match worker.try_exit().and_then(|s| s.code()) {
                    Some(code) => format!("worker exited during startup with status {code}"),
                    None => "worker exited during startup".to_string(),
                });
            }
            let now = tokio::time::Instant::now();
            let marker_ok = !cfg.require_marker || plan.marker_path.exists();
            if now >= grace_deadline && marker_ok {
                return Ok(());
            }
            if now >= marker_deadline {
                return Err(format!(
                    "liveness marker {} did not appear within {}ms",
                    plan.marker_path.display(),
                    cfg.startup_timeout.as_millis()
                ));
            }
            tokio::time::sleep(cfg.startup_poll).await;
        }
    }

    /// Kill everything belonging to a failed launch.
    async fn teardown(&self, pid: u32, plan: &LaunchPlan) {
        let report = self.inner.process.kill_tree(pid).await;
        self.report_kill(&plan.user_id, &plan.agent_id, &report);
        self.sweep_strays(&[plan.agent_needle()], &[]).await;
        remove_if_exists(&plan.marker_path);
    }

    /// Stop the agent tracked for `user_id`.
    ///
    /// The id is trimmed the same way [`LaunchRequest::parse`] trims it.
    pub async fn stop(&self, user_id: &str) -> Result<StoppedAgent, SupervisorError> {
        let user = UserId::new(user_id.trim());
        let this = self.clone();
        let task_user = user.clone();
        tokio::spawn(async move { this.stop_detached(task_user).await })
            .await
            .map_err(|e| SupervisorError::aborted("stop", &user, e))?
    }

    async fn stop_detached(&self, user: UserId) -> Result<StoppedAgent, SupervisorError> {
        let mut registry = self.inner.registry.lock().await;
        self.prune_locked(&mut registry).await;

        let Some(record) = registry.remove(user.as_str()) else {
            // The registry may have lost track of a real worker. Tracked
            // workers of other users are never swept.
            let strays = self
                .sweep_strays(&[user_needle(&user)], &registry.pids())
                .await;
            if strays > 0 {
                warn!(user_id = %user, strays, "killed untracked workers for user");
            }
            return Err(SupervisorError::NotFound { user_id: user });
        };

        let user_id = record.user_id.clone();
        let (agent_id, terminated) = self.terminate(record).await;
        let stopped = StoppedAgent {
            user_id,
            agent_id,
            terminated,
        };
        let user_id = stopped.user_id.as_str();
        info!(
            user_id,
            agent_id = %stopped.agent_id,
            terminated = stopped.terminated,
            "agent stopped"
        );
        Ok(stopped)
    }

    /// Kill a removed record's tree, sweep strays and release it.
    async fn terminate(&self, record: AgentRecord) -> (AgentId, bool) {
        let report = self.inner.process.kill_tree(record.pid()).await;
        self.report_kill(&record.user_id, &record.agent_id, &report);
        self.sweep_strays(&[agent_needle(&record.agent_id)], &[]).await;
        let agent_id = record.agent_id.clone();
        record.release(REAP_TIMEOUT).await;
        (agent_id, report.is_complete())
    }

    fn report_kill(&self, user_id: &UserId, agent_id: &AgentId, report: &KillReport) {
        if !report.is_complete() {
            error!(
                %user_id,
                %agent_id,
                pid = report.pid,
                root_gone = report.root_gone,
                survivors = ?report.survivors,
                "termination incomplete, record removed anyway"
            );
        }
    }

    /// Kill processes whose command line matches every needle, except
    /// `spare`. Returns how many were killed.
    async fn sweep_strays(&self, needles: &[String], spare: &[u32]) -> usize {
        let mut pids = self.inner.process.find_by_command(needles).await;
        pids.retain(|pid| !spare.contains(pid));
        for &pid in &pids {
            let report = self.inner.process.kill_tree(pid).await;
            if !report.root_gone {
                error!(pid, needles = ?needles, "stray worker survived kill");
            }
        }
        pids.len()
    }

    /// Summaries of live agents, after pruning dead ones.
    pub async fn list(&self) -> Vec<AgentSummary> {
        let mut registry = self.inner.registry.lock().await;
        self.prune_locked(&mut registry).await;
        registry.snapshot(self.inner.clock.now())
    }

    /// Remove records whose worker has exited. Returns how many were removed.
    pub async fn prune(&self) -> usize {
        let mut registry = self.inner.registry.lock().await;
        self.prune_locked(&mut registry).await
    }

    async fn prune_locked(&self, registry: &mut Registry) -> usize {
        let mut dead = Vec::new();
        for user_id in registry.user_ids() {
            if let Some(record) = registry.get_mut(user_id.as_str()) {
                let needle = agent_needle(&record.agent_id);
                if !self.inner.process.is_alive(&mut record.worker, &needle).await {
                    dead.push(user_id);
                }
            }
        }

        let count = dead.len();
        for user_id in dead {
            if let Some(record) = registry.remove(user_id.as_str()) {
                // Descendants may outlive the root
                let leftovers = self.inner.process.kill_leftovers(record.pid()).await;
                self.report_kill(&record.user_id, &record.agent_id, &leftovers);
                self.sweep_strays(&[agent_needle(&record.agent_id)], &[]).await;
                let released = record.release(REAP_TIMEOUT).await;
                info!(
                    user_id = %released.user_id,
                    agent_id = %released.agent_id,
                    pid = released.pid,
                    exit_code = ?released.exit_code,
                    "pruned exited agent"
                );
            }
        }
        count
    }

    /// Delete files in the agents directory older than the orphan TTL that
    /// no live record references.
    pub async fn cleanup_orphans(&self) -> usize {
        let registry = self.inner.registry.lock().await;
        let dir = self.inner.builder.agents_dir();
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return 0,
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "cannot scan agents directory");
                return 0;
            }
        };

        let now = self.inner.clock.wall();
        let mut removed = 0;
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_file() || registry.references(&path) {
                continue;
            }
            let age = entry
                .metadata()
                .and_then(|m| m.modified())
                .ok()
                .and_then(|mtime| now.duration_since(mtime).ok());
            if age.is_some_and(|age| age > self.inner.config.orphan_ttl) {
                match std::fs::remove_file(&path) {
                    Ok(()) => removed += 1,
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "failed to remove orphan file")
                    }
                }
            }
        }
        if removed > 0 {
            info!(removed, "removed orphaned agent files");
        }
        removed
    }

    /// One periodic maintenance pass.
    pub async fn sweep(&self) -> SweepReport {
        let pruned = self.prune().await;
        let orphan_files = self.cleanup_orphans().await;
        SweepReport {
            pruned,
            orphan_files,
        }
    }

    /// Stop every tracked agent. Returns how many were stopped.
    pub async fn shutdown_all(&self) -> usize {
        let records = self.inner.registry.lock().await.drain();
        let count = records.len();
        for record in records {
            let user_id = record.user_id.clone();
            let (agent_id, terminated) = self.terminate(record).await;
            info!(%user_id, %agent_id, terminated, "agent stopped at shutdown");
        }
        count
    }
}

fn remove_if_exists(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "failed to remove file"),
    }
}

/// Last `max` bytes of a log file, lossily decoded.
fn read_tail(path: &Path, max: u64) -> String {
    let Ok(mut file) = File::open(path) else {
        return String::new();
    };
    let len = file.metadata().map(|m| m.len()).unwrap_or(0);
    if file.seek(SeekFrom::Start(len.saturating_sub(max))).is_err() {
        return String::new();
    }
    let mut buf = Vec::new();
    if file.read_to_end(&mut buf).is_err() {
        return String::new();
    }
    String::from_utf8_lossy(&buf).trim().to_string()
}

#[cfg(test)]
#[path = "supervisor_tests/mod.rs"]
mod tests;
