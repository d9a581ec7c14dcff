// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Windows strategy: CIM process queries and taskkill

use super::{ProcessControl, ProcessError, ProcessInfo, ProcessTable};
use crate::subprocess::run_with_timeout;
use async_trait::async_trait;
use tokio::process::Command;

const CREATE_NO_WINDOW: u32 = 0x0800_0000;

#[derive(Debug, Clone, Copy, Default)]
pub struct WindowsControl;

async fn powershell(script: &str) -> Result<String, ProcessError> {
    let mut cmd = Command::new("powershell");
    cmd.args(["-NoProfile", "-NonInteractive", "-Command", script])
        .creation_flags(CREATE_NO_WINDOW);
    let output = run_with_timeout(cmd, crate::env::process_query_timeout(), "process query")
        .await
        .map_err(ProcessError::Query)?;
    if !output.status.success() {
        return Err(ProcessError::Query(
            String::from_utf8_lossy(&output.stderr).trim().to_string(),
        ));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

fn cim_query(filter: Option<u32>) -> String {
    let filter = filter
        .map(|pid| format!(" -Filter \"ProcessId={pid}\""))
        .unwrap_or_default();
    format!(
        "Get-CimInstance Win32_Process{filter} | \
         Select-Object ProcessId,ParentProcessId,CommandLine | ConvertTo-Json -Compress"
    )
}

async fn taskkill(pid: u32, force: bool) -> Result<(), ProcessError> {
    if pid == 0 || pid == std::process::id() {
        return Err(ProcessError::Forbidden(pid));
    }
    let mut cmd = Command::new("taskkill");
    if force {
        cmd.arg("/F");
    }
    let pid_arg = pid.to_string();
    cmd.args(["/PID", pid_arg.as_str()])
        .creation_flags(CREATE_NO_WINDOW);
    let output = run_with_timeout(cmd, crate::env::process_query_timeout(), "taskkill")
        .await
        .map_err(|message| ProcessError::Signal { pid, message })?;
    // Exit code 128 means the process was not found
    match output.status.code() {
        Some(0) | Some(128) => Ok(()),
        _ => Err(ProcessError::Signal {
            pid,
            message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        }),
    }
}

#[async_trait]
impl ProcessControl for WindowsControl {
    async fn snapshot(&self) -> Result<ProcessTable, ProcessError> {
        let out = powershell(&cim_query(None)).await?;
        ProcessTable::parse_cim_json(&out).map_err(|e| ProcessError::Query(e.to_string()))
    }

    async fn probe(&self, pid: u32) -> Option<ProcessInfo> {
        if pid == 0 {
            return None;
        }
        match powershell(&cim_query(Some(pid))).await {
            Ok(out) => ProcessTable::parse_cim_json(&out).ok()?.get(pid).cloned(),
            Err(e) => {
                tracing::debug!(pid, error = %e, "process probe failed");
                None
            }
        }
    }

    async fn terminate(&self, pid: u32) -> Result<(), ProcessError> {
        taskkill(pid, false).await
    }

    async fn force_kill(&self, pid: u32) -> Result<(), ProcessError> {
        taskkill(pid, true).await
    }

    async fn terminate_group(&self, _pgid: u32) -> Result<(), ProcessError> {
        Err(ProcessError::Unsupported("process group signals"))
    }

    async fn force_kill_group(&self, _pgid: u32) -> Result<(), ProcessError> {
        Err(ProcessError::Unsupported("process group signals"))
    }
}
