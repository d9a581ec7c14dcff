// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::ValueEnum;
use serde::Serialize;
use vam_core::{format_uptime_secs, AgentSummary};
use vam_daemon::protocol::{StartAgentResponse, StatusResponse, StopAgentResponse};

use crate::color;
use crate::table::{Column, Table};

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;

#[derive(Clone, Copy, Debug, Default, PartialEq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Print `value` as pretty JSON, or the text produced by `text`.
pub fn emit<T: Serialize>(
    format: OutputFormat,
    value: &T,
    text: impl FnOnce(&T) -> String,
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => print!("{}", text(value)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
    }
    Ok(())
}

pub fn format_started(started: &StartAgentResponse) -> String {
    format!(
        "Started {} agent {} for user {} (port {}, pid {})\n",
        started.agent_type, started.agent_id, started.user_id, started.port, started.pid
    )
}

pub fn format_stopped(stopped: &StopAgentResponse) -> String {
    let mut out = format!(
        "Stopped agent {} for user {}\n",
        stopped.agent_id, stopped.user_id
    );
    if !stopped.terminated {
        out.push_str(&color::yellow(
            "warning: some worker processes may still be running\n",
        ));
    }
    out
}

/// Running agents as a table. `colorize` is false in tests.
pub fn format_agents(agents: &[AgentSummary], colorize: bool) -> String {
    if agents.is_empty() {
        return "No agents running\n".to_string();
    }
    let columns = vec![
        Column::left("USER"),
        Column::left("TYPE"),
        Column::muted("AGENT"),
        Column::right("PORT"),
        Column::right("PID"),
        Column::left("UPTIME"),
    ];
    let mut table = if colorize {
        Table::new(columns)
    } else {
        Table::plain(columns)
    };
    for agent in agents {
        table.row(vec![
            agent.user_id.to_string(),
            agent.agent_type.to_string(),
            agent.agent_id.to_string(),
            agent.port.to_string(),
            agent.pid.to_string(),
            format_uptime_secs(agent.running_time as u64),
        ]);
    }
    let mut buf = Vec::new();
    table.render(&mut buf);
    String::from_utf8_lossy(&buf).into_owned()
}

pub fn format_status(status: &StatusResponse) -> String {
    format!(
        "vamd {}\n  uptime: {}\n  policy: {}\n  agents: {}\n",
        status.version,
        format_uptime_secs(status.uptime_secs),
        status.policy,
        status.agents
    )
}
