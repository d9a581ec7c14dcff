// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scope of the single-agent invariant

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which slot a running agent occupies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotPolicy {
    /// One agent at a time across all users
    #[default]
    Global,
    /// One agent per user
    PerUser,
}

impl SlotPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SlotPolicy::Global => "global",
            SlotPolicy::PerUser => "per_user",
        }
    }

    /// Whether a running agent owned by `holder` blocks a start for `requester`.
    pub fn blocks(&self, holder: &str, requester: &str) -> bool {
        match self {
            SlotPolicy::Global => true,
            SlotPolicy::PerUser => holder == requester,
        }
    }
}

impl fmt::Display for SlotPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown slot policy: {0:?} (expected global or per_user)")]
pub struct UnknownSlotPolicy(pub String);

impl FromStr for SlotPolicy {
    type Err = UnknownSlotPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "global" => Ok(SlotPolicy::Global),
            "per_user" | "user" => Ok(SlotPolicy::PerUser),
            _ => Err(UnknownSlotPolicy(s.to_string())),
        }
    }
}

#[cfg(test)]
#[path = "policy_tests.rs"]
mod tests;
