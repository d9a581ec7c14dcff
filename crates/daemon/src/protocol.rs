// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP request and response bodies shared by the daemon and the CLI

use serde::{Deserialize, Serialize};
use vam_core::{AgentId, AgentSummary, AgentType, SlotPolicy, UserId};

use crate::error::LaunchError;
use crate::launch::LaunchRequest;
use crate::supervisor::{StartedAgent, StoppedAgent, SupervisorStatus};

pub const START_PATH: &str = "/start-agent";
pub const STOP_PATH: &str = "/stop-agent";
pub const AGENTS_PATH: &str = "/agents";
pub const STATUS_PATH: &str = "/status";

/// Daemon version reported by `/status`
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartAgentRequest {
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_type: Option<String>,
    #[serde(default, alias = "collection_name", skip_serializing_if = "Option::is_none")]
    pub collection: Option<String>,
    #[serde(default, alias = "phone_number", skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl StartAgentRequest {
    pub fn into_launch(self) -> Result<LaunchRequest, LaunchError> {
        LaunchRequest::parse(
            &self.user_id,
            self.agent_type.as_deref(),
            self.collection,
            self.phone,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    Started,
    Stopped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartAgentResponse {
    pub status: AgentStatus,
    pub user_id: UserId,
    pub agent_id: AgentId,
    pub agent_type: AgentType,
    pub port: u16,
    pub pid: u32,
}

impl From<StartedAgent> for StartAgentResponse {
    fn from(started: StartedAgent) -> Self {
        Self {
            status: AgentStatus::Started,
            user_id: started.user_id,
            agent_id: started.agent_id,
            agent_type: started.agent_type,
            port: started.port,
            pid: started.pid,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopAgentResponse {
    pub status: AgentStatus,
    pub user_id: UserId,
    pub agent_id: AgentId,
    /// False when some process in the tree could not be confirmed dead
    pub terminated: bool,
}

impl From<StoppedAgent> for StopAgentResponse {
    fn from(stopped: StoppedAgent) -> Self {
        Self {
            status: AgentStatus::Stopped,
            user_id: stopped.user_id,
            agent_id: stopped.agent_id,
            terminated: stopped.terminated,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentsResponse {
    pub agents: Vec<AgentSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub version: String,
    pub uptime_secs: u64,
    pub policy: SlotPolicy,
    pub agents: usize,
}

impl From<SupervisorStatus> for StatusResponse {
    fn from(status: SupervisorStatus) -> Self {
        Self {
            version: VERSION.to_string(),
            uptime_secs: status.uptime.as_secs(),
            policy: status.policy,
            agents: status.agents,
        }
    }
}

/// Body of every non-2xx response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
