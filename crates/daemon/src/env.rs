// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use vam_core::SlotPolicy;

use crate::lifecycle::LifecycleError;

/// Resolve state directory: VAM_STATE_DIR > XDG_STATE_HOME/vam > ~/.local/state/vam
pub fn state_dir() -> Result<PathBuf, LifecycleError> {
    if let Ok(dir) = std::env::var("VAM_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("vam"));
    }
    let home = std::env::var("HOME").map_err(|_| LifecycleError::NoStateDir)?;
    Ok(PathBuf::from(home).join(".local/state/vam"))
}

/// Non-empty value of `name`
fn var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse<T: FromStr>(name: &'static str) -> Result<Option<T>, LifecycleError> {
    match var(name) {
        None => Ok(None),
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|_| LifecycleError::InvalidEnv { name, value }),
    }
}

fn millis(name: &'static str) -> Result<Option<Duration>, LifecycleError> {
    Ok(parse::<u64>(name)?.map(Duration::from_millis))
}

pub fn host() -> Option<String> {
    var("VAM_HOST")
}

pub fn port() -> Result<Option<u16>, LifecycleError> {
    parse("VAM_PORT")
}

/// Per-user data root: VAM_STORAGE_PATH > STORAGE_PATH
pub fn storage_path() -> Option<PathBuf> {
    var("VAM_STORAGE_PATH")
        .or_else(|| var("STORAGE_PATH"))
        .map(PathBuf::from)
}

pub fn slot_policy() -> Result<Option<SlotPolicy>, LifecycleError> {
    parse("VAM_SLOT_POLICY")
}

pub fn sweep_interval() -> Result<Option<Duration>, LifecycleError> {
    millis("VAM_SWEEP_INTERVAL_MS")
}

pub fn orphan_ttl() -> Result<Option<Duration>, LifecycleError> {
    millis("VAM_ORPHAN_TTL_MS")
}

pub fn startup_grace() -> Result<Option<Duration>, LifecycleError> {
    millis("VAM_STARTUP_GRACE_MS")
}

pub fn startup_timeout() -> Result<Option<Duration>, LifecycleError> {
    millis("VAM_STARTUP_TIMEOUT_MS")
}

pub fn term_timeout() -> Result<Option<Duration>, LifecycleError> {
    millis("VAM_TERM_TIMEOUT_MS")
}

pub fn kill_timeout() -> Result<Option<Duration>, LifecycleError> {
    millis("VAM_KILL_TIMEOUT_MS")
}

pub fn require_marker() -> Result<Option<bool>, LifecycleError> {
    parse("VAM_REQUIRE_MARKER")
}

/// Program used for every agent type
pub fn worker_program() -> Option<String> {
    var("VAM_WORKER_PROGRAM")
}

/// Fallback telephony trunk for dialers
pub fn sip_trunk_id() -> Option<String> {
    var("SIP_TRUNK_ID")
}
