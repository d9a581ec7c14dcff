// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `vam status`: daemon overview

use anyhow::Result;

use crate::client::{AgentClient, ClientError};
use crate::color;
use crate::exit_error::ExitError;
use crate::output::{self, OutputFormat};

pub async fn handle(client: &AgentClient, format: OutputFormat) -> Result<()> {
    match client.status().await {
        Ok(status) => output::emit(format, &status, output::format_status),
        Err(ClientError::Unreachable { .. }) => {
            print!("{}", format_not_running(format, client.base().as_str()));
            Ok(())
        }
        Err(e) => Err(ExitError::from(e).into()),
    }
}

fn format_not_running(format: OutputFormat, url: &str) -> String {
    match format {
        OutputFormat::Text => format!("{} not running at {url}\n", color::yellow("vamd:")),
        OutputFormat::Json => format!(
            "{}\n",
            serde_json::json!({ "status": "not_running", "url": url })
        ),
    }
}
