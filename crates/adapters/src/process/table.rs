// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process table snapshots and their parsers

use serde::Deserialize;
use std::collections::{HashMap, VecDeque};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessInfo {
    pub pid: u32,
    pub ppid: u32,
    /// Process group, where the platform has them
    pub pgid: Option<u32>,
    pub zombie: bool,
    /// Full command line; empty when the OS does not expose it
    pub command: String,
}

impl ProcessInfo {
    pub fn is_group_leader(&self) -> bool {
        self.pgid == Some(self.pid)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProcessTable {
    procs: Vec<ProcessInfo>,
}

impl ProcessTable {
    pub fn new(procs: Vec<ProcessInfo>) -> Self {
        Self { procs }
    }

    pub fn get(&self, pid: u32) -> Option<&ProcessInfo> {
        self.procs.iter().find(|p| p.pid == pid)
    }

    pub fn len(&self) -> usize {
        self.procs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.procs.is_empty()
    }

    /// Transitive children of `root`, deepest first.
    ///
    /// Children of a pid already visited are not revisited, so ppid cycles
    /// from pid reuse cannot loop.
    pub fn descendants(&self, root: u32) -> Vec<u32> {
        let mut children: HashMap<u32, Vec<u32>> = HashMap::new();
        for p in &self.procs {
            if p.pid != p.ppid {
                children.entry(p.ppid).or_default().push(p.pid);
            }
        }

        let mut order = Vec::new();
        let mut queue = VecDeque::from([root]);
        while let Some(pid) = queue.pop_front() {
            for &child in children.get(&pid).map(Vec::as_slice).unwrap_or_default() {
                if child != root && !order.contains(&child) {
                    order.push(child);
                    queue.push_back(child);
                }
            }
        }
        order.reverse();
        order
    }

    /// Members of the process group `pgid` other than its leader.
    pub fn group_members(&self, pgid: u32) -> Vec<u32> {
        self.procs
            .iter()
            .filter(|p| p.pgid == Some(pgid) && p.pid != pgid)
            .map(|p| p.pid)
            .collect()
    }

    /// Non-zombie processes whose command line contains every needle.
    pub fn matching(&self, needles: &[String], exclude: u32) -> Vec<u32> {
        if needles.is_empty() {
            return Vec::new();
        }
        self.procs
            .iter()
            .filter(|p| p.pid != exclude && !p.zombie)
            .filter(|p| needles.iter().all(|n| p.command.contains(n.as_str())))
            .map(|p| p.pid)
            .collect()
    }

    /// Parse output of `ps -axo pid=,ppid=,pgid=,stat=,args=`.
    ///
    /// Lines that do not start with three numbers and a state are skipped.
    pub fn parse_ps(output: &str) -> Self {
        Self::new(output.lines().filter_map(parse_ps_line).collect())
    }

    /// Parse the JSON emitted by
    /// `Get-CimInstance Win32_Process | Select-Object ProcessId,ParentProcessId,CommandLine | ConvertTo-Json`.
    ///
    /// PowerShell emits a bare object instead of an array for a single row.
    pub fn parse_cim_json(output: &str) -> Result<Self, serde_json::Error> {
        let trimmed = output.trim();
        if trimmed.is_empty() {
            return Ok(Self::default());
        }
        let rows: Vec<CimProcess> = if trimmed.starts_with('[') {
            serde_json::from_str(trimmed)?
        } else {
            vec![serde_json::from_str(trimmed)?]
        };
        Ok(Self::new(
            rows.into_iter()
                .map(|row| ProcessInfo {
                    pid: row.process_id,
                    ppid: row.parent_process_id.unwrap_or(0),
                    pgid: None,
                    zombie: false,
                    command: row.command_line.unwrap_or_default(),
                })
                .collect(),
        ))
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CimProcess {
    process_id: u32,
    parent_process_id: Option<u32>,
    command_line: Option<String>,
}

/// Split one leading whitespace-delimited token off `s`.
fn take_field(s: &str) -> Option<(&str, &str)> {
    let s = s.trim_start();
    if s.is_empty() {
        return None;
    }
    let end = s.find(char::is_whitespace).unwrap_or(s.len());
    Some((&s[..end], &s[end..]))
}

fn parse_ps_line(line: &str) -> Option<ProcessInfo> {
    let (pid, rest) = take_field(line)?;
    let (ppid, rest) = take_field(rest)?;
    let (pgid, rest) = take_field(rest)?;
    let (stat, rest) = take_field(rest)?;
    Some(ProcessInfo {
        pid: pid.parse().ok()?,
        ppid: ppid.parse().ok()?,
        pgid: Some(pgid.parse().ok()?),
        zombie: stat.starts_with('Z'),
        command: rest.trim().to_string(),
    })
}

#[cfg(test)]
#[path = "table_tests.rs"]
mod tests;
