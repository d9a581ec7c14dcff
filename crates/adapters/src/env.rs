// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the adapters crate.

use std::time::Duration;

fn parse_duration_ms(var: &str) -> Option<Duration> {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
}

/// Interval between liveness polls while waiting for a tree to exit (default: 50ms).
pub fn kill_poll_ms() -> Duration {
    parse_duration_ms("VAM_KILL_POLL_MS").unwrap_or(Duration::from_millis(50))
}

/// Timeout for one process table query (default: 5000ms).
pub fn process_query_timeout() -> Duration {
    parse_duration_ms("VAM_PROCESS_QUERY_TIMEOUT_MS").unwrap_or(Duration::from_secs(5))
}
