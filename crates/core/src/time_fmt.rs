// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Human-readable uptime formatting

use std::time::Duration;

/// Format whole seconds as a compact uptime: `"5s"`, `"2m05s"`, `"1h30m"`, `"3d4h"`.
///
/// Only the two most significant units are shown.
pub fn format_uptime_secs(secs: u64) -> String {
    let days = secs / 86_400;
    let hours = (secs % 86_400) / 3600;
    let mins = (secs % 3600) / 60;
    let s = secs % 60;
    if days > 0 {
        format!("{days}d{hours}h")
    } else if hours > 0 {
        format!("{hours}h{mins:02}m")
    } else if mins > 0 {
        format!("{mins}m{s:02}s")
    } else {
        format!("{s}s")
    }
}

pub fn format_uptime(elapsed: Duration) -> String {
    format_uptime_secs(elapsed.as_secs())
}

#[cfg(test)]
#[path = "time_fmt_tests.rs"]
mod tests;
