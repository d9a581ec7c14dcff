// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn builder() -> LaunchBuilder {
    LaunchBuilder::new(WorkerSpecs::default(), "/state/agents")
}

fn request(user: &str, ty: &str) -> LaunchRequest {
    LaunchRequest::parse(user, Some(ty), None, None).unwrap()
}

fn env_map(plan: &LaunchPlan) -> std::collections::BTreeMap<String, String> {
    plan.command.env.iter().cloned().collect()
}

#[test]
fn web_agent_command_line() {
    let plan = builder()
        .build(&request("alice", "web"), &AgentId::new("AB12CD34"), 9123, &UserAgentConfig::default())
        .unwrap();

    assert_eq!(plan.command.program, "python3");
    assert_eq!(
        plan.command.args,
        vec![
            "run_agent.py", "--user", "alice", "--agent-id", "AB12CD34", "--port", "9123"
        ]
    );
    assert_eq!(plan.log_path, PathBuf::from("/state/agents/agent_AB12CD34.log"));
    assert_eq!(plan.marker_path, PathBuf::from("/state/agents/agent_AB12CD34.pid"));
    assert_eq!(plan.agent_needle(), "--agent-id AB12CD34");
}

#[yare::parameterized(
    own_id          = { "alice", "alice", true },
    prefix_of_other = { "al", "alice", false },
    other_is_prefix = { "alice", "al", false },
    space_extended  = { "a", "a b", false },
    space_shortened = { "a b", "a", false },
)]
fn user_needle_matches_whole_id_only(needle_user: &str, running_user: &str, hit: bool) {
    let plan = builder()
        .build(&request(running_user, "web"), &AgentId::new("AB12CD34"), 9123, &UserAgentConfig::default())
        .unwrap();
    let needle = user_needle(&UserId::new(needle_user));
    assert_eq!(plan.command.display().contains(&needle), hit, "{needle:?}");
}

#[test]
fn voice_agent_uses_voice_worker() {
    let plan = builder()
        .build(&request("alice", "voice"), &AgentId::new("A1"), 9000, &UserAgentConfig::default())
        .unwrap();
    assert_eq!(plan.command.args[0], "web-agent-run.py");
}

#[test]
fn environment_overlay() {
    let req = LaunchRequest::parse("alice", Some("web"), Some("manuals".into()), None).unwrap();
    let plan = builder()
        .build(&req, &AgentId::new("AB12CD34"), 9123, &UserAgentConfig::default())
        .unwrap();
    let env = env_map(&plan);

    assert_eq!(env["USER_AGENT_USER_ID"], "alice");
    assert_eq!(env["USER_AGENT_ID"], "AB12CD34");
    assert_eq!(env["USER_AGENT_TYPE"], "web");
    assert_eq!(env["USER_AGENT_PORT"], "9123");
    assert_eq!(env["USER_AGENT_PID_FILE"], "/state/agents/agent_AB12CD34.pid");
    assert_eq!(env["USER_AGENT_COLLECTION"], "manuals");
    assert!(!env.contains_key("USER_AGENT_PHONE"));
    assert!(plan.command.args.ends_with(&["--collection".to_string(), "manuals".to_string()]));
}

#[test]
fn credentials_come_from_user_config() {
    let cfg = UserAgentConfig {
        openai_api_key: Some("sk-test".into()),
        livekit_url: Some("wss://lk.example".into()),
        ..Default::default()
    };
    let plan = builder()
        .build(&request("alice", "voice"), &AgentId::new("A1"), 9000, &cfg)
        .unwrap();
    let env = env_map(&plan);
    assert_eq!(env["OPENAI_API_KEY"], "sk-test");
    assert_eq!(env["LIVEKIT_URL"], "wss://lk.example");
    assert!(!env.contains_key("DEEPGRAM_API_KEY"));
}

#[test]
fn request_values_win_over_config_defaults() {
    let cfg = UserAgentConfig {
        collection_name_preference: Some("from-config".into()),
        default_phone_number_to_dial: Some("+15550000000".into()),
        sip_trunk_id: Some("ST_1".into()),
        ..Default::default()
    };
    let req = LaunchRequest::parse(
        "bob",
        Some("dialer"),
        Some("from-request".into()),
        Some("+15551234567".into()),
    )
    .unwrap();
    let plan = builder().build(&req, &AgentId::new("A1"), 9000, &cfg).unwrap();
    let env = env_map(&plan);
    assert_eq!(env["USER_AGENT_COLLECTION"], "from-request");
    assert_eq!(env["USER_AGENT_PHONE"], "+15551234567");
    assert_eq!(env["SIP_TRUNK_ID"], "ST_1");
}

#[test]
fn config_defaults_fill_missing_request_values() {
    let cfg = UserAgentConfig {
        collection_name_preference: Some("manuals".into()),
        default_phone_number_to_dial: Some("+15550000000".into()),
        ..Default::default()
    };
    let plan = builder()
        .with_fallback_sip_trunk(Some("ST_DAEMON".into()))
        .build(&request("bob", "dialer"), &AgentId::new("A1"), 9000, &cfg)
        .unwrap();
    let env = env_map(&plan);
    assert_eq!(env["USER_AGENT_COLLECTION"], "manuals");
    assert_eq!(env["USER_AGENT_PHONE"], "+15550000000");
    assert_eq!(env["SIP_TRUNK_ID"], "ST_DAEMON");
}

#[test]
fn dialer_without_trunk_is_missing_telephony() {
    let req = LaunchRequest::parse("bob", Some("dialer"), None, Some("+15551234567".into())).unwrap();
    let err = builder()
        .build(&req, &AgentId::new("A1"), 9000, &UserAgentConfig::default())
        .unwrap_err();
    assert_eq!(err, LaunchError::MissingTelephony("SIP_TRUNK_ID is not configured"));
}

#[test]
fn dialer_without_phone_is_missing_telephony() {
    let err = builder()
        .with_fallback_sip_trunk(Some("ST_1".into()))
        .build(&request("bob", "dialer"), &AgentId::new("A1"), 9000, &UserAgentConfig::default())
        .unwrap_err();
    assert_eq!(err, LaunchError::MissingTelephony("no phone number to dial"));
}

#[test]
fn fallback_trunk_not_forwarded_to_non_dialers() {
    let plan = builder()
        .with_fallback_sip_trunk(Some("ST_1".into()))
        .build(&request("alice", "web"), &AgentId::new("A1"), 9000, &UserAgentConfig::default())
        .unwrap();
    assert!(!env_map(&plan).contains_key("SIP_TRUNK_ID"));
}

#[test]
fn same_inputs_differ_only_in_id_derived_fields() {
    let b = builder();
    let req = LaunchRequest::parse("erin", Some("web"), Some("docs".into()), None).unwrap();
    let cfg = UserAgentConfig {
        openai_api_key: Some("sk".into()),
        ..Default::default()
    };

    let first = b.build(&req, &AgentId::new("FIRST001"), 9001, &cfg).unwrap();
    let again = b.build(&req, &AgentId::new("FIRST001"), 9001, &cfg).unwrap();
    assert_eq!(first, again);

    let second = b.build(&req, &AgentId::new("SECOND02"), 9002, &cfg).unwrap();
    assert_eq!(first.command.program, second.command.program);
    assert_eq!(first.command.cwd, second.command.cwd);

    let normalize = |plan: &LaunchPlan, id: &str, port: &str| -> (Vec<String>, Vec<(String, String)>) {
        let scrub = |s: &str| s.replace(id, "<ID>").replace(port, "<PORT>");
        (
            plan.command.args.iter().map(|a| scrub(a)).collect(),
            plan.command
                .env
                .iter()
                .map(|(k, v)| (k.clone(), scrub(v)))
                .collect(),
        )
    };
    assert_eq!(
        normalize(&first, "FIRST001", "9001"),
        normalize(&second, "SECOND02", "9002")
    );
    assert_ne!(first.log_path, second.log_path);
}

#[yare::parameterized(
    empty        = { "" },
    blank        = { "   " },
    slash        = { "../etc" },
    backslash    = { "a\\b" },
    dot_dot      = { ".." },
    newline      = { "a\nb" },
)]
fn rejects_bad_user_ids(user: &str) {
    let err = LaunchRequest::parse(user, Some("web"), None, None).unwrap_err();
    assert!(matches!(err, LaunchError::InvalidRequest(_)), "got {err:?}");
}

#[test]
fn rejects_unknown_agent_type() {
    let err = LaunchRequest::parse("alice", Some("robot"), None, None).unwrap_err();
    assert!(matches!(err, LaunchError::UnknownAgentType(_)));
}

#[test]
fn missing_agent_type_defaults_to_voice() {
    let req = LaunchRequest::parse("alice", None, Some("  ".into()), None).unwrap();
    assert_eq!(req.agent_type, AgentType::Voice);
    assert_eq!(req.collection, None);
}

#[test]
fn program_override_keeps_args() {
    let mut specs = WorkerSpecs::default();
    specs.override_program("/opt/venv/bin/python");
    assert_eq!(specs.get(AgentType::Web).program, "/opt/venv/bin/python");
    assert_eq!(specs.get(AgentType::Voice).args, vec!["web-agent-run.py"]);
}
