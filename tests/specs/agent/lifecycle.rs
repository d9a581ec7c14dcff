// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Start, list and stop through the CLI

use crate::prelude::*;

#[test]
fn start_list_stop() {
    let daemon = Daemon::start();

    daemon
        .vam()
        .args(&["start", "alice"])
        .passes()
        .stdout_has("Started voice agent")
        .stdout_has("for user alice");

    daemon
        .vam()
        .args(&["list"])
        .passes()
        .stdout_has("USER")
        .stdout_has("alice");

    daemon
        .vam()
        .args(&["stop", "alice"])
        .passes()
        .stdout_has("for user alice")
        .stdout_lacks("warning");

    daemon
        .vam()
        .args(&["list"])
        .passes()
        .stdout_eq("No agents running\n");
}

#[test]
fn global_slot_conflict_exits_3() {
    let daemon = Daemon::start();
    daemon.vam().args(&["start", "alice"]).passes();

    daemon
        .vam()
        .args(&["start", "bob"])
        .fails_with(3)
        .stderr_has("already running for user alice");
}

#[test]
fn per_user_policy_allows_two_users() {
    let daemon = Daemon::with_config(r#"slot_policy = "per_user""#);
    daemon.vam().args(&["start", "alice"]).passes();
    daemon.vam().args(&["start", "bob", "-t", "web"]).passes();

    let list = daemon.vam().args(&["-o", "json", "list"]).passes().json();
    let users: Vec<&str> = list["agents"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["user_id"].as_str().unwrap())
        .collect();
    assert_eq!(users, ["alice", "bob"]);

    daemon
        .vam()
        .args(&["start", "alice"])
        .fails_with(3)
        .stderr_has("already running for user alice");
}

#[test]
fn stop_unknown_user_exits_4() {
    let daemon = Daemon::start();

    daemon
        .vam()
        .args(&["stop", "nobody"])
        .fails_with(4)
        .stderr_has("no agent running for user nobody");
}

#[test]
fn restart_gets_fresh_agent_id() {
    let daemon = Daemon::start();

    let first = daemon
        .vam()
        .args(&["-o", "json", "start", "alice"])
        .passes()
        .json();
    daemon.vam().args(&["stop", "alice"]).passes();
    let second = daemon
        .vam()
        .args(&["-o", "json", "start", "alice"])
        .passes()
        .json();

    assert_ne!(first["agent_id"], second["agent_id"]);
    assert_eq!(first["status"], "started");
}

#[test]
fn externally_killed_worker_frees_slot() {
    let daemon = Daemon::start();
    let started = daemon
        .vam()
        .args(&["-o", "json", "start", "alice"])
        .passes()
        .json();
    let worker = started["pid"].as_u64().unwrap();

    let _ = std::process::Command::new("kill")
        .args(["-9", &worker.to_string()])
        .status();

    let freed = wait_for(SPEC_WAIT_MAX_MS, || {
        daemon.vam().args(&["list"]).passes().stdout() == "No agents running\n"
    });
    assert!(freed, "dead worker still listed\nlog:\n{}", daemon.log());
    daemon.vam().args(&["start", "bob"]).passes();
}
