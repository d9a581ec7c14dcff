// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::time::Duration;
use vam_core::SlotPolicy;

#[test]
#[serial(env)]
fn defaults_without_file_or_env() {
    clear_env();
    let dir = tempdir().unwrap();

    let config = Config::load_from(dir.path().to_path_buf()).unwrap();

    assert_eq!(config.lock_path, dir.path().join("vamd.pid"));
    assert_eq!(config.log_path, dir.path().join("vamd.log"));
    assert_eq!(config.agents_dir, dir.path().join("agents"));
    assert_eq!(config.bind_addr(), "0.0.0.0:8001");
    assert_eq!(config.policy, SlotPolicy::Global);
    assert_eq!(config.sweep_interval, Duration::from_secs(300));
    assert_eq!(config.orphan_ttl, Duration::from_secs(3600));
    assert_eq!(config.storage_root, std::path::PathBuf::from("./user_data"));
    assert!(!config.require_marker);
    assert_eq!(config.workers.voice.args, vec!["web-agent-run.py"]);
}

#[test]
#[serial(env)]
fn toml_file_overrides_defaults() {
    clear_env();
    let dir = tempdir().unwrap();
    std::fs::write(
        dir.path().join("vamd.toml"),
        r#"
port = 8100
slot_policy = "per_user"
sweep_interval_ms = 1500
port_base = 10000
port_span = 50
sip_trunk_id = "ST_FILE"

[workers.web]
program = "/opt/agents/bin/python"
args = ["-u", "web.py"]
cwd = "/opt/agents"
"#,
    )
    .unwrap();

    let config = Config::load_from(dir.path().to_path_buf()).unwrap();

    assert_eq!(config.port, 8100);
    assert_eq!(config.policy, SlotPolicy::PerUser);
    assert_eq!(config.sweep_interval, Duration::from_millis(1500));
    assert_eq!(config.workers.web.program, "/opt/agents/bin/python");
    assert_eq!(config.workers.web.args, vec!["-u", "web.py"]);
    assert_eq!(
        config.workers.web.cwd,
        Some(std::path::PathBuf::from("/opt/agents"))
    );
    assert_eq!(config.workers.voice.program, "python3");
    assert_eq!(config.sip_trunk_id.as_deref(), Some("ST_FILE"));

    let ports = config.port_allocator().unwrap();
    assert_eq!(ports.base(), 10000);
    assert_eq!(ports.span(), 50);
}

#[test]
#[serial(env)]
fn env_overrides_file() {
    clear_env();
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("vamd.toml"), "slot_policy = \"per_user\"\nport = 8100\n").unwrap();
    std::env::set_var("VAM_SLOT_POLICY", "global");
    std::env::set_var("VAM_PORT", "8200");
    std::env::set_var("STORAGE_PATH", "/data/fallback");
    std::env::set_var("VAM_STORAGE_PATH", "/data/users");
    std::env::set_var("VAM_STARTUP_GRACE_MS", "250");
    std::env::set_var("VAM_WORKER_PROGRAM", "/usr/bin/python3.12");
    std::env::set_var("SIP_TRUNK_ID", "ST_ENV");

    let config = Config::load_from(dir.path().to_path_buf());
    clear_env();
    let config = config.unwrap();

    assert_eq!(config.policy, SlotPolicy::Global);
    assert_eq!(config.port, 8200);
    assert_eq!(config.storage_root, std::path::PathBuf::from("/data/users"));
    assert_eq!(config.startup_grace, Duration::from_millis(250));
    assert_eq!(config.workers.dialer.program, "/usr/bin/python3.12");
    assert_eq!(config.workers.dialer.args, vec!["run_agent.py"]);
    assert_eq!(config.sip_trunk_id.as_deref(), Some("ST_ENV"));
}

#[test]
#[serial(env)]
fn invalid_env_value_is_rejected() {
    clear_env();
    let dir = tempdir().unwrap();
    std::env::set_var("VAM_SLOT_POLICY", "sometimes");

    let result = Config::load_from(dir.path().to_path_buf());
    clear_env();

    match result {
        Err(LifecycleError::InvalidEnv { name, value }) => {
            assert_eq!(name, "VAM_SLOT_POLICY");
            assert_eq!(value, "sometimes");
        }
        other => panic!("expected InvalidEnv, got {other:?}"),
    }
}

#[test]
#[serial(env)]
fn unknown_file_key_is_rejected() {
    clear_env();
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("vamd.toml"), "prot = 1\n").unwrap();

    let err = Config::load_from(dir.path().to_path_buf()).unwrap_err();
    assert!(matches!(err, LifecycleError::ConfigFile { .. }), "{err}");
}

#[test]
#[serial(env)]
fn empty_port_range_is_rejected() {
    clear_env();
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("vamd.toml"), "port_span = 0\n").unwrap();

    let err = Config::load_from(dir.path().to_path_buf()).unwrap_err();
    assert!(matches!(err, LifecycleError::InvalidConfig(_)), "{err}");
}

#[test]
#[serial(env)]
fn own_port_is_reserved() {
    let dir = tempdir().unwrap();
    let mut config = test_config(dir.path());
    config.port = 9000;
    config.port_base = 9000;
    config.port_span = 2;

    let ports = config.port_allocator().unwrap();
    let picked = ports.allocate("u", "a", &[], |_| true).unwrap();
    assert_eq!(picked, 9001);
}

#[test]
#[serial(env)]
fn kill_timeouts_follow_config() {
    let dir = tempdir().unwrap();
    let mut config = test_config(dir.path());
    config.term_timeout = Duration::from_millis(300);
    config.kill_timeout = Duration::from_millis(700);

    let timeouts = config.kill_timeouts();
    assert_eq!(timeouts.term, Duration::from_millis(300));
    assert_eq!(timeouts.kill, Duration::from_millis(700));
}
