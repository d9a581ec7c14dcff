// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! vam - voice agent manager CLI

mod client;
mod color;
mod commands;
mod env;
mod exit_error;
mod output;
mod table;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use commands::{agent, status};
use output::OutputFormat;

use crate::client::AgentClient;
use crate::exit_error::ExitError;

#[derive(Parser, Debug)]
#[command(name = "vam", version, about = "Voice agent manager")]
struct Cli {
    /// Output format
    #[arg(
        short = 'o',
        long = "output",
        value_enum,
        default_value_t,
        global = true
    )]
    output: OutputFormat,

    /// Daemon URL [default: $VAM_URL or http://127.0.0.1:8001]
    #[arg(long, global = true)]
    url: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start an agent for a user
    Start(agent::StartArgs),
    /// Stop a user's agent
    Stop(agent::StopArgs),
    /// List running agents
    #[command(alias = "ls")]
    List,
    /// Show daemon status
    Status,
}

pub(crate) fn cli_command() -> clap::Command {
    Cli::command()
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        let code = e.downcast_ref::<ExitError>().map_or(1, |c| c.code);
        let msg = format_error(&e);
        if !msg.is_empty() {
            eprintln!("Error: {}", msg);
        }
        std::process::exit(code);
    }
}

/// Format an anyhow error, skipping causes already present in the top-level message.
fn format_error(err: &anyhow::Error) -> String {
    let top = err.to_string();
    let chain_redundant = err
        .chain()
        .skip(1)
        .all(|cause| top.contains(&cause.to_string()));
    if chain_redundant {
        return top;
    }

    let mut buf = top;
    for (i, cause) in err.chain().skip(1).enumerate() {
        buf.push_str(&format!("\n\nCaused by:\n    {}: {}", i, cause));
    }
    buf
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let format = cli.output;

    let Some(command) = cli.command else {
        cli_command().print_help()?;
        println!();
        return Ok(());
    };

    let client = match cli.url {
        Some(url) => AgentClient::new(&url, env::timeout()),
        None => AgentClient::from_env(),
    }
    .map_err(ExitError::from)?;

    match command {
        Commands::Start(args) => agent::start(args, &client, format).await,
        Commands::Stop(args) => agent::stop(args, &client, format).await,
        Commands::List => agent::list(&client, format).await,
        Commands::Status => status::handle(&client, format).await,
    }
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
