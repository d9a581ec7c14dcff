// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon startup, single-instance locking and shutdown

use crate::prelude::*;

#[test]
fn startup_writes_state_files() {
    let daemon = Daemon::start();

    let pid = std::fs::read_to_string(daemon.state_path().join("vamd.pid")).unwrap();
    assert_eq!(pid.trim(), daemon.pid().to_string());
    let version = std::fs::read_to_string(daemon.state_path().join("vamd.version")).unwrap();
    assert_eq!(version.trim(), env!("CARGO_PKG_VERSION"));
    assert!(daemon.state_path().join("agents").is_dir());
    assert!(daemon.log().contains("--- vamd: starting (pid: "));
}

#[test]
fn second_daemon_is_refused() {
    let daemon = Daemon::start();

    let output = daemon.command().output().unwrap();

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("vamd is already running"), "{stderr}");
    assert!(stderr.contains(&format!("pid: {}", daemon.pid())), "{stderr}");
}

#[test]
fn status_reports_policy_and_count() {
    let daemon = Daemon::start();

    let status = daemon.vam().args(&["-o", "json", "status"]).passes().json();

    assert_eq!(status["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(status["policy"], "global");
    assert_eq!(status["agents"], 0);
}

#[test]
fn sigterm_stops_agents_and_removes_pid_file() {
    let mut daemon = Daemon::start();
    let started = daemon
        .vam()
        .args(&["-o", "json", "start", "alice"])
        .passes()
        .json();
    let worker = started["pid"].as_u64().unwrap();
    assert!(pid_alive(worker));

    assert!(daemon.stop(), "daemon did not exit cleanly");

    assert!(wait_for(SPEC_WAIT_MAX_MS, || !pid_alive(worker)));
    assert!(!daemon.state_path().join("vamd.pid").exists());
    assert!(!daemon.state_path().join("vamd.version").exists());
}

#[test]
fn invalid_config_file_fails_startup() {
    let state = tempfile::tempdir().unwrap();
    std::fs::write(state.path().join("vamd.toml"), "no_such_key = 1\n").unwrap();

    let output = vamd()
        .env("VAM_STATE_DIR", state.path().display().to_string())
        .command()
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("vamd.toml"), "{stderr}");
}
