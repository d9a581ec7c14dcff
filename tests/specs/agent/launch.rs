// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! What a worker is started with, and what it leaves behind

use crate::prelude::*;

#[test]
fn worker_output_goes_to_agent_log() {
    let daemon = Daemon::start();
    let started = daemon
        .vam()
        .args(&["-o", "json", "start", "alice"])
        .passes()
        .json();
    let log = daemon.agent_log(started["agent_id"].as_str().unwrap());

    assert!(wait_for(SPEC_WAIT_MAX_MS, || {
        std::fs::read_to_string(&log).is_ok_and(|s| s.contains("up"))
    }));

    daemon.vam().args(&["stop", "alice"]).passes();
    assert!(log.exists(), "log should outlive the agent");
}

#[test]
fn dialer_without_phone_fails() {
    let daemon = Daemon::start();

    daemon
        .vam()
        .args(&["start", "alice", "-t", "dialer"])
        .fails_with(1)
        .stderr_has("no phone number to dial");
    daemon
        .vam()
        .args(&["list"])
        .passes()
        .stdout_eq("No agents running\n");
}

#[test]
fn dialer_uses_phone_from_user_config() {
    let daemon = Daemon::start();
    daemon.user_config(
        "alice",
        r#"{"default_phone_number_to_dial": "+15550100", "sip_trunk_id": "ST_abc"}"#,
    );

    let started = daemon
        .vam()
        .args(&["-o", "json", "start", "alice", "-t", "dialer"])
        .passes()
        .json();

    assert_eq!(started["agent_type"], "dialer");
}

#[test]
fn unknown_agent_type_is_rejected() {
    let daemon = Daemon::start();

    daemon
        .vam()
        .args(&["start", "alice", "-t", "robot"])
        .fails_with(1)
        .stderr_has("unknown agent type");
}

#[test]
fn unsafe_user_id_is_rejected() {
    let daemon = Daemon::start();

    daemon.vam().args(&["start", "../etc"]).fails_with(1);
    daemon
        .vam()
        .args(&["list"])
        .passes()
        .stdout_eq("No agents running\n");
}

#[test]
fn agents_get_distinct_ports_in_range() {
    let daemon = Daemon::with_config(r#"slot_policy = "per_user""#);
    let mut ports = Vec::new();
    for user in ["alice", "bob", "carol"] {
        let started = daemon
            .vam()
            .args(&["-o", "json", "start", user])
            .passes()
            .json();
        ports.push(started["port"].as_u64().unwrap());
    }

    ports.sort();
    ports.dedup();
    assert_eq!(ports.len(), 3);
    assert!(ports.iter().all(|p| (41000..41500).contains(p)), "{ports:?}");
}
