// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::agent::{AgentId, AgentType, UserId};
use serde::{Deserialize, Serialize};

/// Read-only snapshot of one tracked agent, as reported by list operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSummary {
    pub user_id: UserId,
    pub agent_type: AgentType,
    pub agent_id: AgentId,
    pub port: u16,
    pub pid: u32,
    /// Seconds since the agent was started
    pub running_time: f64,
}

impl AgentSummary {
    pub fn running_secs(&self) -> u64 {
        self.running_time.max(0.0) as u64
    }
}
