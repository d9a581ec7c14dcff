// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Real `sh` workers under the OS process adapter

use super::*;
use crate::launch::WorkerSpec;
use vam_adapters::{KillTimeouts, OsProcessAdapter, PlatformControl, ProcessControl};
use vam_core::SystemClock;

type OsSupervisor = Supervisor<OsProcessAdapter, SystemClock, SequentialIdGen>;

/// Every agent type runs `sh -c <script>`; the supervisor's arguments land
/// in `$1..` so they stay visible in the command line. Each test uses its
/// own id prefix because stray sweeps match on agent id system-wide.
fn os_supervisor(dir: &Path, prefix: &str, script: &str, grace_ms: u64) -> OsSupervisor {
    let spec = WorkerSpec::new("sh", &["-c", script, "sh"]);
    let workers = WorkerSpecs {
        voice: spec.clone(),
        web: spec.clone(),
        dialer: spec,
    };
    let mut config = test_config(dir, SlotPolicy::PerUser);
    config.startup_grace = Duration::from_millis(grace_ms);
    config.startup_timeout = Duration::from_secs(2);
    config.startup_poll = Duration::from_millis(20);
    let timeouts = KillTimeouts {
        term: Duration::from_millis(500),
        kill: Duration::from_millis(500),
        poll: Duration::from_millis(20),
    };
    Supervisor::with_parts(
        config,
        LaunchBuilder::new(workers, dir.join("agents")),
        OsProcessAdapter::new(timeouts),
        SystemClock,
        SequentialIdGen::new(prefix),
    )
}

async fn running(pid: u32) -> bool {
    PlatformControl::default().is_running(pid).await
}

#[tokio::test]
async fn real_worker_starts_and_stops() {
    let dir = TempDir::new().unwrap();
    let sup = os_supervisor(dir.path(), "RSTOP", "echo up; sleep 30; true", 100);

    let started = sup.start(req("alice", "web")).await.unwrap();
    assert!(running(started.pid).await);
    assert_eq!(sup.list().await.len(), 1);

    let stopped = sup.stop("alice").await.unwrap();
    assert!(stopped.terminated);
    assert!(!running(started.pid).await);
    assert!(sup.list().await.is_empty());

    let log = std::fs::read_to_string(dir.path().join("agents/agent_RSTOP0001.log")).unwrap();
    assert!(log.contains("up"), "{log}");
}

#[tokio::test]
async fn real_worker_exit_during_grace_fails_start() {
    let dir = TempDir::new().unwrap();
    let sup = os_supervisor(dir.path(), "RFAIL", "echo broken >&2; exit 7", 500);

    let err = sup.start(req("alice", "web")).await.unwrap_err();

    assert!(err.to_string().contains("status 7"), "{err}");
    assert!(sup.list().await.is_empty());
    assert!(!dir.path().join("agents/agent_RFAIL0001.log").exists());
}

#[tokio::test]
async fn real_worker_exit_after_start_is_pruned() {
    let dir = TempDir::new().unwrap();
    let sup = os_supervisor(dir.path(), "RPRUNE", "sleep 0.3; true", 50);

    sup.start(req("alice", "web")).await.unwrap();
    tokio::time::sleep(Duration::from_millis(800)).await;

    assert!(sup.list().await.is_empty());
    sup.start(req("alice", "web")).await.unwrap();
    sup.shutdown_all().await;
}

#[tokio::test]
async fn real_stop_kills_grandchildren() {
    let dir = TempDir::new().unwrap();
    let sup = os_supervisor(dir.path(), "RTREE", "sleep 30 & sleep 30; true", 100);

    let started = sup.start(req("alice", "web")).await.unwrap();
    let children = child_pids(started.pid);
    assert!(!children.is_empty());

    sup.stop("alice").await.unwrap();

    for pid in children {
        assert!(!running(pid).await, "child {pid} survived");
    }
}

#[tokio::test]
async fn real_stop_of_prefix_user_spares_worker() {
    let dir = TempDir::new().unwrap();
    let sup = os_supervisor(dir.path(), "RPFX", "sleep 30; true", 50);
    let started = sup.start(req("rprefix-owner", "web")).await.unwrap();

    let err = sup.stop("rprefix").await.unwrap_err();

    assert!(matches!(err, SupervisorError::NotFound { .. }));
    assert!(running(started.pid).await);
    assert_eq!(sup.list().await.len(), 1);
    sup.shutdown_all().await;
}

#[tokio::test]
async fn real_abandoned_start_is_tracked_and_stoppable() {
    let dir = TempDir::new().unwrap();
    let sup = os_supervisor(dir.path(), "RCANC", "sleep 30; true", 400);

    let abandoned = tokio::time::timeout(Duration::from_millis(100), sup.start(req("rcancel", "web"))).await;
    assert!(abandoned.is_err());

    let list = sup.list().await;
    assert_eq!(list.len(), 1);
    let pid = list[0].pid;
    assert!(running(pid).await);

    sup.stop("rcancel").await.unwrap();
    assert!(!running(pid).await);
}

#[tokio::test]
async fn real_prune_kills_background_children() {
    let dir = TempDir::new().unwrap();
    let sup = os_supervisor(dir.path(), "RLEFT", "sleep 30 & sleep 0.3; true", 50);

    let started = sup.start(req("rleftover", "web")).await.unwrap();
    let children = child_pids(started.pid);
    assert!(!children.is_empty());
    tokio::time::sleep(Duration::from_millis(800)).await;

    assert!(sup.list().await.is_empty());
    for pid in children {
        assert!(!running(pid).await, "child {pid} survived");
    }
}

fn child_pids(parent: u32) -> Vec<u32> {
    let out = std::process::Command::new("ps")
        .args(["-axo", "pid=,ppid="])
        .output()
        .unwrap();
    String::from_utf8_lossy(&out.stdout)
        .lines()
        .filter_map(|line| {
            let mut cols = line.split_whitespace();
            let pid: u32 = cols.next()?.parse().ok()?;
            let ppid: u32 = cols.next()?.parse().ok()?;
            (ppid == parent).then_some(pid)
        })
        .collect()
}
