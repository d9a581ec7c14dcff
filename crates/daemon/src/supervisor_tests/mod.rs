// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::launch::WorkerSpecs;
use std::time::Duration;
use tempfile::TempDir;
use vam_adapters::{FakeProcessAdapter, ProcessCall};
use vam_core::{FakeClock, SequentialIdGen};

#[cfg(unix)]
mod unix;

type TestSupervisor = Supervisor<FakeProcessAdapter, FakeClock, SequentialIdGen>;

struct Harness {
    sup: TestSupervisor,
    process: FakeProcessAdapter,
    clock: FakeClock,
    dir: TempDir,
}

impl Harness {
    fn agents_dir(&self) -> PathBuf {
        self.dir.path().join("agents")
    }

    fn storage(&self) -> PathBuf {
        self.dir.path().join("users")
    }

    fn write_user_config(&self, user: &str, json: &str) {
        let path = UserAgentConfig::path(&self.storage(), user);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, json).unwrap();
    }

    fn agent_files(&self) -> Vec<String> {
        let mut names: Vec<String> = match std::fs::read_dir(self.agents_dir()) {
            Ok(entries) => entries
                .flatten()
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect(),
            Err(_) => Vec::new(),
        };
        names.sort();
        names
    }
}

fn test_config(root: &Path, policy: SlotPolicy) -> SupervisorConfig {
    SupervisorConfig {
        policy,
        storage_root: root.join("users"),
        startup_grace: Duration::ZERO,
        startup_timeout: Duration::from_millis(100),
        require_marker: false,
        startup_poll: Duration::from_millis(5),
        orphan_ttl: Duration::from_secs(3600),
        ports: PortAllocator::new(20_000, 2_000, vec![]).unwrap(),
    }
}

fn harness_with(policy: SlotPolicy, tweak: impl FnOnce(&mut SupervisorConfig)) -> Harness {
    let dir = TempDir::new().unwrap();
    let mut config = test_config(dir.path(), policy);
    tweak(&mut config);
    let builder = LaunchBuilder::new(WorkerSpecs::default(), dir.path().join("agents"));
    let process = FakeProcessAdapter::new();
    let clock = FakeClock::new();
    let sup = Supervisor::with_parts(
        config,
        builder,
        process.clone(),
        clock.clone(),
        SequentialIdGen::new("AGENT"),
    );
    Harness {
        sup,
        process,
        clock,
        dir,
    }
}

fn harness(policy: SlotPolicy) -> Harness {
    harness_with(policy, |_| {})
}

fn req(user: &str, ty: &str) -> LaunchRequest {
    LaunchRequest::parse(user, Some(ty), None, None).unwrap()
}

#[tokio::test]
async fn start_registers_agent() {
    let h = harness(SlotPolicy::PerUser);

    let started = h.sup.start(req("alice", "web")).await.unwrap();

    assert_eq!(started.user_id, "alice");
    assert_eq!(started.agent_id, "AGENT0001");
    assert_eq!(started.agent_type, AgentType::Web);
    assert!((20_000..22_000).contains(&started.port));

    let spawned = h.process.spawned();
    assert_eq!(spawned.len(), 1);
    assert!(spawned[0].display().contains("--agent-id AGENT0001"));
    assert!(spawned[0].display().contains("--user alice"));

    let list = h.sup.list().await;
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].agent_id, "AGENT0001");
    assert_eq!(list[0].port, started.port);
    assert_eq!(list[0].pid, started.pid);
    assert_eq!(h.agent_files(), vec!["agent_AGENT0001.log"]);
}

#[tokio::test]
async fn per_user_policy_rejects_second_start_for_same_user() {
    let h = harness(SlotPolicy::PerUser);
    h.sup.start(req("alice", "web")).await.unwrap();

    let err = h.sup.start(req("alice", "voice")).await.unwrap_err();
    assert_eq!(
        err,
        SupervisorError::Conflict {
            requested: UserId::new("alice"),
            holder: UserId::new("alice"),
            agent_id: AgentId::new("AGENT0001"),
        }
    );

    h.sup.start(req("bob", "web")).await.unwrap();
    assert_eq!(h.sup.list().await.len(), 2);
    assert_eq!(h.process.spawned().len(), 2);
}

#[tokio::test]
async fn global_policy_rejects_any_second_agent() {
    let h = harness(SlotPolicy::Global);
    h.sup.start(req("alice", "web")).await.unwrap();

    let err = h.sup.start(req("bob", "web")).await.unwrap_err();
    match err {
        SupervisorError::Conflict { requested, holder, .. } => {
            assert_eq!(requested, "bob");
            assert_eq!(holder, "alice");
        }
        other => panic!("expected conflict, got {other:?}"),
    }
    assert_eq!(h.process.spawned().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_starts_for_one_user_admit_exactly_one() {
    let h = harness(SlotPolicy::PerUser);

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let sup = h.sup.clone();
        tasks.push(tokio::spawn(async move { sup.start(req("alice", "web")).await }));
    }
    let mut ok = 0;
    let mut conflicts = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => ok += 1,
            Err(SupervisorError::Conflict { .. }) => conflicts += 1,
            Err(other) => panic!("unexpected error {other:?}"),
        }
    }

    assert_eq!(ok, 1);
    assert_eq!(conflicts, 7);
    assert_eq!(h.process.spawned().len(), 1);
    assert_eq!(h.sup.list().await.len(), 1);
}

#[tokio::test]
async fn stop_then_start_gets_fresh_agent() {
    let h = harness(SlotPolicy::PerUser);
    let first = h.sup.start(req("erin", "web")).await.unwrap();

    let stopped = h.sup.stop("erin").await.unwrap();
    assert_eq!(stopped.user_id, "erin");
    assert_eq!(stopped.agent_id, first.agent_id);
    assert!(stopped.terminated);
    assert!(h.sup.list().await.is_empty());
    assert!(!h.process.is_running(first.pid));

    let second = h.sup.start(req("erin", "web")).await.unwrap();
    assert_ne!(second.agent_id, first.agent_id);
}

#[tokio::test]
async fn stop_unknown_user_is_not_found_but_sweeps() {
    let h = harness(SlotPolicy::PerUser);
    let stray = h
        .process
        .add_stray("python3 run_agent.py --user carol --agent-id LOST0001 --port 9000");
    let bystander = h
        .process
        .add_stray("python3 run_agent.py --user dave --agent-id LOST0002 --port 9001");

    let err = h.sup.stop("carol").await.unwrap_err();

    assert_eq!(
        err,
        SupervisorError::NotFound {
            user_id: UserId::new("carol")
        }
    );
    assert!(!h.process.is_running(stray));
    assert!(h.process.is_running(bystander));
    assert!(h.process.calls().contains(&ProcessCall::FindByCommand {
        needles: vec!["--user carol --agent-id ".to_string()],
    }));
}

#[tokio::test]
async fn stop_of_similar_user_spares_tracked_worker() {
    for (tracked, stopped) in [("alice", "al"), ("al", "alice"), ("a b", "a"), ("a", "a b")] {
        let h = harness(SlotPolicy::PerUser);
        let started = h.sup.start(req(tracked, "web")).await.unwrap();

        let err = h.sup.stop(stopped).await.unwrap_err();

        assert_eq!(
            err,
            SupervisorError::NotFound {
                user_id: UserId::new(stopped)
            }
        );
        assert!(h.process.is_running(started.pid), "{stopped:?} killed {tracked:?}");
        let users: Vec<_> = h.sup.list().await.into_iter().map(|s| s.user_id).collect();
        assert_eq!(users, vec![UserId::new(tracked)]);
    }
}

#[tokio::test]
async fn untracked_sweep_never_kills_a_tracked_worker() {
    let h = harness(SlotPolicy::PerUser);
    // A tracked worker whose command line also names another user
    let mut workers = WorkerSpecs::default();
    workers.web.args = ["run_agent.py", "--user", "ghost", "--agent-id", "X"]
        .map(String::from)
        .to_vec();
    let builder = LaunchBuilder::new(workers, h.agents_dir());
    let sup = Supervisor::with_parts(
        test_config(h.dir.path(), SlotPolicy::PerUser),
        builder,
        h.process.clone(),
        h.clock.clone(),
        SequentialIdGen::new("GHOST"),
    );
    let started = sup.start(req("alice", "web")).await.unwrap();
    let stray = h
        .process
        .add_stray("python3 run_agent.py --user ghost --agent-id LOST0001 --port 9000");

    let err = sup.stop("ghost").await.unwrap_err();

    assert!(matches!(err, SupervisorError::NotFound { .. }));
    assert!(!h.process.is_running(stray));
    assert!(h.process.is_running(started.pid));
    assert_eq!(sup.list().await.len(), 1);
}

#[tokio::test]
async fn stop_trims_user_id_like_start() {
    let h = harness(SlotPolicy::PerUser);
    let started = h.sup.start(req(" alice", "web")).await.unwrap();
    assert_eq!(started.user_id, "alice");

    let stopped = h.sup.stop(" alice ").await.unwrap();

    assert_eq!(stopped.user_id, "alice");
    assert!(h.sup.list().await.is_empty());
}

/// Poll `list` until it has `len` agents.
async fn wait_for_agents(sup: &TestSupervisor, len: usize) -> bool {
    for _ in 0..200 {
        if sup.list().await.len() == len {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    false
}

#[tokio::test]
async fn abandoned_start_still_registers_worker() {
    let h = harness_with(SlotPolicy::PerUser, |c| {
        c.startup_grace = Duration::from_millis(200);
        c.startup_timeout = Duration::from_millis(400);
    });

    let abandoned = tokio::time::timeout(Duration::from_millis(20), h.sup.start(req("bob", "web"))).await;
    assert!(abandoned.is_err());

    assert!(wait_for_agents(&h.sup, 1).await);
    let list = h.sup.list().await;
    assert_eq!(list[0].user_id, "bob");
    assert_eq!(h.process.running_pids(), vec![list[0].pid]);

    h.sup.stop("bob").await.unwrap();
    assert!(h.process.running_pids().is_empty());
}

#[tokio::test]
async fn abandoned_stop_still_kills_worker() {
    let h = harness(SlotPolicy::PerUser);
    let started = h.sup.start(req("bob", "web")).await.unwrap();

    let abandoned = tokio::time::timeout(Duration::ZERO, h.sup.stop("bob")).await;
    assert!(abandoned.is_err());

    assert!(wait_for_agents(&h.sup, 0).await);
    assert!(!h.process.is_running(started.pid));
}

#[tokio::test]
async fn prune_kills_leftover_group_of_exited_worker() {
    let h = harness(SlotPolicy::PerUser);
    let started = h.sup.start(req("alice", "web")).await.unwrap();
    h.process.exit(started.pid);

    assert_eq!(h.sup.prune().await, 1);

    assert!(h
        .process
        .calls()
        .contains(&ProcessCall::KillLeftovers { pgid: started.pid }));
}

#[tokio::test]
async fn stop_sweeps_detached_descendants() {
    let h = harness(SlotPolicy::PerUser);
    let started = h.sup.start(req("alice", "web")).await.unwrap();
    let grandchild = h.process.add_stray("helper --agent-id AGENT0001");

    h.sup.stop("alice").await.unwrap();

    assert!(!h.process.is_running(started.pid));
    assert!(!h.process.is_running(grandchild));
    assert!(h.process.running_pids().is_empty());
}

#[tokio::test]
async fn stop_removes_record_even_when_kill_fails() {
    let h = harness(SlotPolicy::PerUser);
    let started = h.sup.start(req("alice", "web")).await.unwrap();
    h.process.set_unkillable(started.pid);

    let stopped = h.sup.stop("alice").await.unwrap();

    assert!(!stopped.terminated);
    assert!(h.sup.list().await.is_empty());
    // The slot is free even though the process lingers
    h.sup.start(req("alice", "web")).await.unwrap();
}

#[tokio::test]
async fn exited_worker_is_pruned() {
    let h = harness(SlotPolicy::Global);
    let started = h.sup.start(req("dave", "voice")).await.unwrap();

    h.process.exit(started.pid);

    assert!(h.sup.list().await.is_empty());
    assert_eq!(h.agent_files(), vec!["agent_AGENT0001.log"]);
    h.sup.start(req("erin", "voice")).await.unwrap();
}

#[tokio::test]
async fn prune_reports_removed_count() {
    let h = harness(SlotPolicy::PerUser);
    let a = h.sup.start(req("alice", "web")).await.unwrap();
    h.sup.start(req("bob", "web")).await.unwrap();
    h.process.exit(a.pid);

    assert_eq!(h.sup.prune().await, 1);
    assert_eq!(h.sup.prune().await, 0);
    let users: Vec<_> = h.sup.list().await.into_iter().map(|s| s.user_id).collect();
    assert_eq!(users, vec![UserId::new("bob")]);
}

#[tokio::test]
async fn stop_after_worker_died_is_not_found() {
    let h = harness(SlotPolicy::PerUser);
    let started = h.sup.start(req("alice", "web")).await.unwrap();
    h.process.exit(started.pid);

    let err = h.sup.stop("alice").await.unwrap_err();
    assert!(matches!(err, SupervisorError::NotFound { .. }));
}

#[tokio::test]
async fn spawn_failure_leaves_nothing_behind() {
    let h = harness(SlotPolicy::PerUser);
    h.process.set_spawn_error("no such file");

    let err = h.sup.start(req("alice", "web")).await.unwrap_err();

    match &err {
        SupervisorError::LaunchFailure { user_id, agent_id, reason } => {
            assert_eq!(user_id, "alice");
            assert_eq!(agent_id.as_ref().unwrap(), "AGENT0001");
            assert!(reason.contains("no such file"), "{reason}");
        }
        other => panic!("expected launch failure, got {other:?}"),
    }
    assert!(h.sup.list().await.is_empty());
    assert!(h.agent_files().is_empty());
}

#[tokio::test]
async fn worker_dying_during_startup_is_launch_failure() {
    let h = harness(SlotPolicy::PerUser);
    h.process.set_exit_on_spawn(true);

    let err = h.sup.start(req("alice", "web")).await.unwrap_err();

    assert!(err.to_string().contains("exited during startup"), "{err}");
    assert!(h.sup.list().await.is_empty());
    assert!(h.agent_files().is_empty());

    h.process.set_exit_on_spawn(false);
    h.sup.start(req("alice", "web")).await.unwrap();
}

#[tokio::test]
async fn dialer_without_phone_fails_before_spawn() {
    let h = harness(SlotPolicy::PerUser);
    h.write_user_config("frank", r#"{"sip_trunk_id": "ST_1"}"#);

    let err = h.sup.start(req("frank", "dialer")).await.unwrap_err();

    assert!(err.to_string().contains("missing telephony config"), "{err}");
    assert!(h.process.spawned().is_empty());
    assert!(h.sup.list().await.is_empty());
}

#[tokio::test]
async fn dialer_with_telephony_config_starts() {
    let h = harness(SlotPolicy::PerUser);
    h.write_user_config(
        "frank",
        r#"{"sip_trunk_id": "ST_1", "default_phone_number_to_dial": "+15551234", "openai_api_key": "sk-1"}"#,
    );

    h.sup.start(req("frank", "dialer")).await.unwrap();

    let command = &h.process.spawned()[0];
    assert_eq!(command.env_value("SIP_TRUNK_ID"), Some("ST_1"));
    assert_eq!(command.env_value("OPENAI_API_KEY"), Some("sk-1"));
    assert_eq!(command.env_value("USER_AGENT_PHONE"), Some("+15551234"));
}

#[tokio::test]
async fn malformed_user_config_is_launch_failure() {
    let h = harness(SlotPolicy::PerUser);
    h.write_user_config("gina", "{not json");

    let err = h.sup.start(req("gina", "web")).await.unwrap_err();

    assert!(matches!(err, SupervisorError::LaunchFailure { agent_id: None, .. }));
    assert!(h.process.spawned().is_empty());
}

#[tokio::test]
async fn required_marker_must_appear() {
    let h = harness_with(SlotPolicy::PerUser, |c| c.require_marker = true);

    let err = h.sup.start(req("alice", "web")).await.unwrap_err();
    assert!(err.to_string().contains("liveness marker"), "{err}");
    assert_eq!(h.process.killed(), vec![10_000]);
    assert!(h.agent_files().is_empty());

    h.process.set_write_marker(true);
    h.sup.start(req("alice", "web")).await.unwrap();
    assert_eq!(
        h.agent_files(),
        vec!["agent_AGENT0002.log", "agent_AGENT0002.pid"]
    );
}

#[tokio::test]
async fn stop_removes_marker_and_keeps_log() {
    let h = harness(SlotPolicy::PerUser);
    h.process.set_write_marker(true);
    h.sup.start(req("alice", "web")).await.unwrap();
    assert_eq!(h.agent_files().len(), 2);

    h.sup.stop("alice").await.unwrap();

    assert_eq!(h.agent_files(), vec!["agent_AGENT0001.log"]);
}

#[tokio::test]
async fn running_time_follows_clock() {
    let h = harness(SlotPolicy::PerUser);
    h.sup.start(req("alice", "web")).await.unwrap();

    h.clock.advance(Duration::from_secs(42));

    let list = h.sup.list().await;
    assert_eq!(list[0].running_time, 42.0);
}

#[tokio::test]
async fn per_user_agents_get_distinct_ports() {
    let h = harness(SlotPolicy::PerUser);
    let mut ports = Vec::new();
    for user in ["a", "b", "c", "d", "e"] {
        ports.push(h.sup.start(req(user, "web")).await.unwrap().port);
    }
    let mut unique = ports.clone();
    unique.sort_unstable();
    unique.dedup();
    assert_eq!(unique.len(), ports.len());
}

#[tokio::test]
async fn orphan_cleanup_spares_live_records() {
    let h = harness(SlotPolicy::PerUser);
    h.sup.start(req("alice", "web")).await.unwrap();
    std::fs::write(h.agents_dir().join("agent_OLD00001.log"), "old").unwrap();
    std::fs::write(h.agents_dir().join("agent_OLD00001.pid"), "123").unwrap();

    // Nothing is old enough yet
    assert_eq!(h.sup.cleanup_orphans().await, 0);

    h.clock.advance(Duration::from_secs(2 * 3600));
    assert_eq!(h.sup.cleanup_orphans().await, 2);
    assert_eq!(h.agent_files(), vec!["agent_AGENT0001.log"]);
}

#[tokio::test]
async fn orphan_cleanup_without_agents_dir() {
    let h = harness(SlotPolicy::PerUser);
    assert_eq!(h.sup.cleanup_orphans().await, 0);
}

#[tokio::test]
async fn sweep_prunes_and_cleans() {
    let h = harness(SlotPolicy::PerUser);
    let started = h.sup.start(req("alice", "web")).await.unwrap();
    h.process.exit(started.pid);
    h.clock.advance(Duration::from_secs(2 * 3600));

    let report = h.sup.sweep().await;

    assert_eq!(
        report,
        SweepReport {
            pruned: 1,
            orphan_files: 1,
        }
    );
    assert!(h.agent_files().is_empty());
}

#[tokio::test]
async fn shutdown_stops_every_agent() {
    let h = harness(SlotPolicy::PerUser);
    for user in ["alice", "bob", "carol"] {
        h.sup.start(req(user, "web")).await.unwrap();
    }

    assert_eq!(h.sup.shutdown_all().await, 3);

    assert!(h.process.running_pids().is_empty());
    assert!(h.sup.list().await.is_empty());
    assert_eq!(h.sup.shutdown_all().await, 0);
}

#[tokio::test]
async fn status_reports_uptime_and_count() {
    let h = harness(SlotPolicy::Global);
    h.sup.start(req("alice", "voice")).await.unwrap();
    h.clock.advance(Duration::from_secs(90));

    let status = h.sup.status().await;

    assert_eq!(status.policy, SlotPolicy::Global);
    assert_eq!(status.agents, 1);
    assert_eq!(status.uptime, Duration::from_secs(90));
}

#[test]
fn log_tail_keeps_last_bytes() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("w.log");
    std::fs::write(&path, "first line\nsecond line\n").unwrap();

    assert_eq!(read_tail(&path, 12), "second line");
    assert_eq!(read_tail(&path, 1024), "first line\nsecond line");
    assert_eq!(read_tail(&dir.path().join("missing.log"), 10), "");
}
