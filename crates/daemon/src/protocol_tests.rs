// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;
use std::time::Duration;

#[test]
fn start_request_accepts_aliases() {
    let req: StartAgentRequest = serde_json::from_value(json!({
        "user_id": "bob",
        "agent_type": "dialer",
        "collection_name": "faq",
        "phone_number": "+15551234567",
    }))
    .unwrap();

    assert_eq!(req.collection.as_deref(), Some("faq"));
    assert_eq!(req.phone.as_deref(), Some("+15551234567"));

    let launch = req.into_launch().unwrap();
    assert_eq!(launch.agent_type, AgentType::Dialer);
}

#[test]
fn start_request_defaults_to_voice() {
    let req: StartAgentRequest = serde_json::from_value(json!({"user_id": "alice"})).unwrap();
    assert_eq!(req.into_launch().unwrap().agent_type, AgentType::Voice);
}

#[test]
fn start_request_rejects_unknown_type() {
    let req = StartAgentRequest {
        user_id: "alice".into(),
        agent_type: Some("fax".into()),
        ..Default::default()
    };
    assert!(matches!(
        req.into_launch(),
        Err(LaunchError::UnknownAgentType(_))
    ));
}

#[test]
fn start_response_shape() {
    let response = StartAgentResponse::from(StartedAgent {
        user_id: UserId::new("alice"),
        agent_id: AgentId::new("AB12CD34"),
        agent_type: AgentType::Web,
        port: 9123,
        pid: 4242,
    });

    assert_eq!(
        serde_json::to_value(&response).unwrap(),
        json!({
            "status": "started",
            "user_id": "alice",
            "agent_id": "AB12CD34",
            "agent_type": "web",
            "port": 9123,
            "pid": 4242,
        })
    );
}

#[test]
fn stop_response_shape() {
    let response = StopAgentResponse::from(StoppedAgent {
        user_id: UserId::new("erin"),
        agent_id: AgentId::new("ZZ99ZZ99"),
        terminated: true,
    });

    assert_eq!(
        serde_json::to_value(&response).unwrap(),
        json!({
            "status": "stopped",
            "user_id": "erin",
            "agent_id": "ZZ99ZZ99",
            "terminated": true,
        })
    );
}

#[test]
fn agents_response_shape() {
    let response = AgentsResponse {
        agents: vec![AgentSummary {
            user_id: UserId::new("dave"),
            agent_type: AgentType::Voice,
            agent_id: AgentId::new("QW12ER34"),
            port: 9001,
            pid: 77,
            running_time: 12.5,
        }],
    };

    assert_eq!(
        serde_json::to_value(&response).unwrap(),
        json!({"agents": [{
            "user_id": "dave",
            "agent_type": "voice",
            "agent_id": "QW12ER34",
            "port": 9001,
            "pid": 77,
            "running_time": 12.5,
        }]})
    );
}

#[test]
fn status_response_from_supervisor_status() {
    let response = StatusResponse::from(SupervisorStatus {
        policy: SlotPolicy::PerUser,
        uptime: Duration::from_millis(61_900),
        agents: 2,
    });

    assert_eq!(response.uptime_secs, 61);
    assert_eq!(
        serde_json::to_value(&response).unwrap()["policy"],
        json!("per_user")
    );
}
