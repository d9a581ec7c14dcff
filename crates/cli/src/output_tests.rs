// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serial_test::serial;
use vam_core::{AgentId, AgentType, SlotPolicy, UserId};
use vam_daemon::protocol::AgentStatus;

fn summary(user: &str, agent: &str, running_time: f64) -> AgentSummary {
    AgentSummary {
        user_id: UserId::new(user),
        agent_type: AgentType::Voice,
        agent_id: AgentId::new(agent),
        port: 9001,
        pid: 4242,
        running_time,
    }
}

#[test]
fn started_line() {
    let started = StartAgentResponse {
        status: AgentStatus::Started,
        user_id: UserId::new("alice"),
        agent_id: AgentId::new("AB12CD34"),
        agent_type: AgentType::Dialer,
        port: 9010,
        pid: 321,
    };
    assert_eq!(
        format_started(&started),
        "Started dialer agent AB12CD34 for user alice (port 9010, pid 321)\n"
    );
}

#[test]
#[serial(color)]
fn stopped_warns_when_termination_incomplete() {
    std::env::set_var("NO_COLOR", "1");
    let mut stopped = StopAgentResponse {
        status: AgentStatus::Stopped,
        user_id: UserId::new("bob"),
        agent_id: AgentId::new("ZZ99YY88"),
        terminated: true,
    };
    assert_eq!(
        format_stopped(&stopped),
        "Stopped agent ZZ99YY88 for user bob\n"
    );

    stopped.terminated = false;
    let text = format_stopped(&stopped);
    std::env::remove_var("NO_COLOR");
    assert!(text.ends_with("warning: some worker processes may still be running\n"));
}

#[test]
fn empty_agent_list() {
    assert_eq!(format_agents(&[], false), "No agents running\n");
}

#[test]
fn agent_table_columns() {
    let agents = vec![
        summary("alice", "AB12CD34", 5.9),
        summary("bartholomew", "QW12ER34", 3725.0),
    ];
    let text = format_agents(&agents, false);
    let lines: Vec<&str> = text.lines().collect();

    assert_eq!(lines.len(), 3);
    assert_eq!(
        lines[0],
        "USER         TYPE   AGENT     PORT   PID  UPTIME"
    );
    assert_eq!(
        lines[1],
        "alice        voice  AB12CD34  9001  4242  5s"
    );
    assert_eq!(
        lines[2],
        "bartholomew  voice  QW12ER34  9001  4242  1h02m"
    );
}

#[test]
fn status_block() {
    let status = StatusResponse {
        version: "0.1.0".into(),
        uptime_secs: 125,
        policy: SlotPolicy::PerUser,
        agents: 2,
    };
    assert_eq!(
        format_status(&status),
        "vamd 0.1.0\n  uptime: 2m05s\n  policy: per_user\n  agents: 2\n"
    );
}
