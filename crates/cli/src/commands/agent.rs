// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `vam start`, `vam stop` and `vam list`

use anyhow::Result;
use clap::Args;
use vam_daemon::protocol::StartAgentRequest;

use crate::client::AgentClient;
use crate::color;
use crate::exit_error::ExitError;
use crate::output::{self, OutputFormat};

#[derive(Args, Debug)]
pub struct StartArgs {
    /// User the agent serves
    pub user_id: String,

    /// Agent type: voice, web or dialer
    #[arg(short = 't', long = "type", default_value = "voice")]
    pub agent_type: String,

    /// Document collection the agent answers from
    #[arg(long)]
    pub collection: Option<String>,

    /// Number to call (dialer agents)
    #[arg(long)]
    pub phone: Option<String>,
}

impl StartArgs {
    pub fn into_request(self) -> StartAgentRequest {
        StartAgentRequest {
            user_id: self.user_id,
            agent_type: Some(self.agent_type),
            collection: self.collection,
            phone: self.phone,
        }
    }
}

#[derive(Args, Debug)]
pub struct StopArgs {
    /// User whose agent to stop
    pub user_id: String,
}

pub async fn start(args: StartArgs, client: &AgentClient, format: OutputFormat) -> Result<()> {
    let started = client
        .start(&args.into_request())
        .await
        .map_err(ExitError::from)?;
    output::emit(format, &started, output::format_started)
}

pub async fn stop(args: StopArgs, client: &AgentClient, format: OutputFormat) -> Result<()> {
    let stopped = client
        .stop(&args.user_id)
        .await
        .map_err(ExitError::from)?;
    output::emit(format, &stopped, output::format_stopped)
}

pub async fn list(client: &AgentClient, format: OutputFormat) -> Result<()> {
    let agents = client.agents().await.map_err(ExitError::from)?;
    output::emit(format, &agents, |a| {
        output::format_agents(&a.agents, color::should_colorize())
    })
}
