// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Launch builder: turns a start request into a worker command line and
//! environment without touching the filesystem or the process table.

use crate::error::LaunchError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use vam_adapters::LaunchCommand;
use vam_core::{AgentId, AgentType, UserAgentConfig, UserId};

/// Environment variables handed to every worker
pub mod env_keys {
    pub const USER_ID: &str = "USER_AGENT_USER_ID";
    pub const AGENT_ID: &str = "USER_AGENT_ID";
    pub const AGENT_TYPE: &str = "USER_AGENT_TYPE";
    pub const PORT: &str = "USER_AGENT_PORT";
    pub const PID_FILE: &str = "USER_AGENT_PID_FILE";
    pub const COLLECTION: &str = "USER_AGENT_COLLECTION";
    pub const PHONE: &str = "USER_AGENT_PHONE";
    pub const SIP_TRUNK_ID: &str = "SIP_TRUNK_ID";
}

/// Validated start request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchRequest {
    pub user_id: UserId,
    pub agent_type: AgentType,
    pub collection: Option<String>,
    pub phone: Option<String>,
}

impl LaunchRequest {
    /// Validate raw request fields. A missing agent type means `voice`.
    pub fn parse(
        user_id: &str,
        agent_type: Option<&str>,
        collection: Option<String>,
        phone: Option<String>,
    ) -> Result<Self, LaunchError> {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Err(LaunchError::InvalidRequest("user_id must not be empty".into()));
        }
        if !is_safe_user_id(user_id) {
            return Err(LaunchError::InvalidRequest(format!(
                "user_id {user_id:?} contains path separators or control characters"
            )));
        }
        let agent_type = match agent_type.map(str::trim).filter(|s| !s.is_empty()) {
            Some(ty) => ty.parse::<AgentType>()?,
            None => AgentType::default(),
        };
        Ok(Self {
            user_id: UserId::new(user_id),
            agent_type,
            collection: non_blank(collection),
            phone: non_blank(phone),
        })
    }
}

/// User ids become directory names under the storage root.
pub fn is_safe_user_id(user_id: &str) -> bool {
    user_id != "."
        && user_id != ".."
        && !user_id
            .chars()
            .any(|c| c == '/' || c == '\\' || c.is_control())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Program, fixed arguments and working directory for one agent type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerSpec {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub cwd: Option<PathBuf>,
}

impl WorkerSpec {
    pub fn new(program: impl Into<String>, args: &[&str]) -> Self {
        Self {
            program: program.into(),
            args: args.iter().map(|a| a.to_string()).collect(),
            cwd: None,
        }
    }
}

/// Worker command per agent type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerSpecs {
    pub voice: WorkerSpec,
    pub web: WorkerSpec,
    pub dialer: WorkerSpec,
}

impl Default for WorkerSpecs {
    fn default() -> Self {
        Self {
            voice: WorkerSpec::new("python3", &["web-agent-run.py"]),
            web: WorkerSpec::new("python3", &["run_agent.py"]),
            dialer: WorkerSpec::new("python3", &["run_agent.py"]),
        }
    }
}

impl WorkerSpecs {
    pub fn get(&self, agent_type: AgentType) -> &WorkerSpec {
        match agent_type {
            AgentType::Voice => &self.voice,
            AgentType::Web => &self.web,
            AgentType::Dialer => &self.dialer,
        }
    }

    /// Replace the program of every type, keeping the arguments.
    pub fn override_program(&mut self, program: &str) {
        for spec in [&mut self.voice, &mut self.web, &mut self.dialer] {
            spec.program = program.to_string();
        }
    }
}

/// Everything needed to start one worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchPlan {
    pub user_id: UserId,
    pub agent_id: AgentId,
    pub agent_type: AgentType,
    pub port: u16,
    pub command: LaunchCommand,
    pub log_path: PathBuf,
    pub marker_path: PathBuf,
}

impl LaunchPlan {
    /// Command-line fragment identifying this worker (and its descendants
    /// that keep the arguments).
    pub fn agent_needle(&self) -> String {
        agent_needle(&self.agent_id)
    }
}

pub fn agent_needle(agent_id: &AgentId) -> String {
    format!("--agent-id {agent_id}")
}

/// Matches `--user <id>` only when the id is followed directly by the
/// `--agent-id` flag, so `al` does not match `alice` or `a` match `a b`.
pub fn user_needle(user_id: &UserId) -> String {
    format!("--user {user_id} --agent-id ")
}

#[derive(Debug, Clone)]
pub struct LaunchBuilder {
    workers: WorkerSpecs,
    agents_dir: PathBuf,
    /// Used for dialers when the user config has no trunk
    fallback_sip_trunk: Option<String>,
}

impl LaunchBuilder {
    pub fn new(workers: WorkerSpecs, agents_dir: impl Into<PathBuf>) -> Self {
        Self {
            workers,
            agents_dir: agents_dir.into(),
            fallback_sip_trunk: None,
        }
    }

    pub fn with_fallback_sip_trunk(mut self, trunk: Option<String>) -> Self {
        self.fallback_sip_trunk = non_blank(trunk);
        self
    }

    pub fn agents_dir(&self) -> &Path {
        &self.agents_dir
    }

    pub fn log_path(&self, agent_id: &AgentId) -> PathBuf {
        self.agents_dir.join(format!("agent_{agent_id}.log"))
    }

    pub fn marker_path(&self, agent_id: &AgentId) -> PathBuf {
        self.agents_dir.join(format!("agent_{agent_id}.pid"))
    }

    pub fn build(
        &self,
        req: &LaunchRequest,
        agent_id: &AgentId,
        port: u16,
        user_config: &UserAgentConfig,
    ) -> Result<LaunchPlan, LaunchError> {
        let collection = req
            .collection
            .clone()
            .or_else(|| non_blank(user_config.collection_name_preference.clone()));
        let phone = req
            .phone
            .clone()
            .or_else(|| non_blank(user_config.default_phone_number_to_dial.clone()));

        let sip_trunk = non_blank(user_config.sip_trunk_id.clone())
            .or_else(|| self.fallback_sip_trunk.clone());
        if req.agent_type.needs_telephony() {
            if phone.is_none() {
                return Err(LaunchError::MissingTelephony("no phone number to dial"));
            }
            if sip_trunk.is_none() {
                return Err(LaunchError::MissingTelephony("SIP_TRUNK_ID is not configured"));
            }
        }

        let log_path = self.log_path(agent_id);
        let marker_path = self.marker_path(agent_id);
        let spec = self.workers.get(req.agent_type);

        let mut args = spec.args.clone();
        args.extend([
            "--user".to_string(),
            req.user_id.to_string(),
            "--agent-id".to_string(),
            agent_id.to_string(),
            "--port".to_string(),
            port.to_string(),
        ]);
        if let Some(c) = &collection {
            args.extend(["--collection".to_string(), c.clone()]);
        }
        if let Some(p) = &phone {
            args.extend(["--phone".to_string(), p.clone()]);
        }

        let mut env = vec![
            (env_keys::USER_ID.to_string(), req.user_id.to_string()),
            (env_keys::AGENT_ID.to_string(), agent_id.to_string()),
            (env_keys::AGENT_TYPE.to_string(), req.agent_type.to_string()),
            (env_keys::PORT.to_string(), port.to_string()),
            (env_keys::PID_FILE.to_string(), marker_path.display().to_string()),
        ];
        if let Some(c) = collection {
            env.push((env_keys::COLLECTION.to_string(), c));
        }
        if let Some(p) = phone {
            env.push((env_keys::PHONE.to_string(), p));
        }
        let credentials = user_config.credential_env();
        let has_trunk = credentials.iter().any(|(k, _)| *k == env_keys::SIP_TRUNK_ID);
        env.extend(credentials.into_iter().map(|(k, v)| (k.to_string(), v)));
        if !has_trunk {
            if let Some(trunk) = sip_trunk.filter(|_| req.agent_type.needs_telephony()) {
                env.push((env_keys::SIP_TRUNK_ID.to_string(), trunk));
            }
        }

        Ok(LaunchPlan {
            user_id: req.user_id.clone(),
            agent_id: agent_id.clone(),
            agent_type: req.agent_type,
            port,
            command: LaunchCommand {
                program: spec.program.clone(),
                args,
                env,
                cwd: spec.cwd.clone(),
            },
            log_path,
            marker_path,
        })
    }
}

#[cfg(test)]
#[path = "launch_tests.rs"]
mod tests;
