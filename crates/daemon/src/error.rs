// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Errors surfaced by the supervisor and the launch builder

use thiserror::Error;
use vam_core::{AgentId, UnknownAgentType, UserId};

/// Failure to turn a request into a launchable command
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LaunchError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error(transparent)]
    UnknownAgentType(#[from] UnknownAgentType),

    #[error("missing telephony config: {0}")]
    MissingTelephony(&'static str),
}

/// User-visible outcome of a failed supervisor operation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SupervisorError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("agent {agent_id} is already running for user {holder}")]
    Conflict {
        requested: UserId,
        holder: UserId,
        agent_id: AgentId,
    },

    #[error("failed to start agent for user {user_id}{}: {reason}", agent_suffix(.agent_id))]
    LaunchFailure {
        user_id: UserId,
        agent_id: Option<AgentId>,
        reason: String,
    },

    #[error("no agent running for user {user_id}")]
    NotFound { user_id: UserId },

    #[error("{operation} for user {user_id} did not complete: {reason}")]
    Aborted {
        operation: &'static str,
        user_id: UserId,
        reason: String,
    },
}

fn agent_suffix(agent_id: &Option<AgentId>) -> String {
    agent_id
        .as_ref()
        .map(|id| format!(" (agent {id})"))
        .unwrap_or_default()
}

impl SupervisorError {
    pub fn launch(user_id: &UserId, agent_id: Option<&AgentId>, reason: impl ToString) -> Self {
        SupervisorError::LaunchFailure {
            user_id: user_id.clone(),
            agent_id: agent_id.cloned(),
            reason: reason.to_string(),
        }
    }

    pub fn aborted(operation: &'static str, user_id: &UserId, reason: impl ToString) -> Self {
        SupervisorError::Aborted {
            operation,
            user_id: user_id.clone(),
            reason: reason.to_string(),
        }
    }

    /// Map a builder failure for `user_id`.
    pub fn from_launch(user_id: &UserId, agent_id: Option<&AgentId>, err: LaunchError) -> Self {
        match err {
            LaunchError::InvalidRequest(msg) => SupervisorError::InvalidRequest(msg),
            LaunchError::UnknownAgentType(e) => SupervisorError::InvalidRequest(e.to_string()),
            e @ LaunchError::MissingTelephony(_) => Self::launch(user_id, agent_id, e),
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
