// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the CLI crate.

use std::time::Duration;

pub const DEFAULT_URL: &str = "http://127.0.0.1:8001";

fn parse_duration_ms(var: &str) -> Option<Duration> {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
}

/// Daemon base URL: VAM_URL > http://127.0.0.1:8001
pub fn url() -> String {
    std::env::var("VAM_URL")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_URL.to_string())
}

/// Per-request timeout: VAM_TIMEOUT_MS > 10s
pub fn timeout() -> Duration {
    parse_duration_ms("VAM_TIMEOUT_MS").unwrap_or(Duration::from_secs(10))
}

pub fn no_color() -> bool {
    std::env::var("NO_COLOR").is_ok_and(|v| v == "1")
}

pub fn force_color() -> bool {
    std::env::var("COLOR").is_ok_and(|v| v == "1")
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
