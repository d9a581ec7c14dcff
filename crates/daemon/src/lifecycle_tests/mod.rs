// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

use serial_test::serial;
use std::path::Path;
use tempfile::tempdir;

mod config;
mod startup_shutdown;

const ENV_VARS: &[&str] = &[
    "VAM_HOST",
    "VAM_PORT",
    "VAM_STORAGE_PATH",
    "STORAGE_PATH",
    "VAM_SLOT_POLICY",
    "VAM_SWEEP_INTERVAL_MS",
    "VAM_ORPHAN_TTL_MS",
    "VAM_STARTUP_GRACE_MS",
    "VAM_STARTUP_TIMEOUT_MS",
    "VAM_REQUIRE_MARKER",
    "VAM_TERM_TIMEOUT_MS",
    "VAM_KILL_TIMEOUT_MS",
    "VAM_WORKER_PROGRAM",
    "SIP_TRUNK_ID",
];

fn clear_env() {
    for name in ENV_VARS {
        std::env::remove_var(name);
    }
}

/// Defaults rooted at `dir`, bound to an ephemeral loopback port.
fn test_config(dir: &Path) -> Config {
    clear_env();
    let mut config = Config::load_from(dir.to_path_buf()).unwrap();
    config.host = "127.0.0.1".to_string();
    config.port = 0;
    config
}
