// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! User and agent identity

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

crate::define_id! {
    /// Stable external identifier of the user an agent serves.
    ///
    /// Unique key of the agent registry.
    pub struct UserId;
}

crate::define_id! {
    /// Token generated per start, distinguishing processes and log files
    /// of the same user across restarts.
    pub struct AgentId;
}

/// Which worker behavior to launch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentType {
    /// Voice assistant answering from the user's documents
    #[default]
    Voice,
    /// Browser chat agent
    Web,
    /// Outbound telephony agent, needs a phone number and a SIP trunk
    Dialer,
}

impl AgentType {
    pub const ALL: [AgentType; 3] = [AgentType::Voice, AgentType::Web, AgentType::Dialer];

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentType::Voice => "voice",
            AgentType::Web => "web",
            AgentType::Dialer => "dialer",
        }
    }

    pub fn needs_telephony(&self) -> bool {
        matches!(self, AgentType::Dialer)
    }
}

impl fmt::Display for AgentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse failure for [`AgentType`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown agent type: {0:?} (expected voice, web or dialer)")]
pub struct UnknownAgentType(pub String);

impl FromStr for AgentType {
    type Err = UnknownAgentType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "voice" => Ok(AgentType::Voice),
            "web" => Ok(AgentType::Web),
            "dialer" => Ok(AgentType::Dialer),
            _ => Err(UnknownAgentType(s.to_string())),
        }
    }
}

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;
