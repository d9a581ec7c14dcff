// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Test helpers for behavioral specifications.
//!
//! Provides a small DSL for driving the `vam` CLI against a real `vamd`.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, dead_code)]

use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Output, Stdio};
use std::time::{Duration, Instant};

// Spec polling timeouts
pub const SPEC_POLL_INTERVAL_MS: u64 = 10;
pub const SPEC_WAIT_MAX_MS: u64 = 3000;

/// Variables that would leak the developer's daemon settings into a spec run.
const SCRUBBED_ENV: &[&str] = &[
    "VAM_URL",
    "VAM_TIMEOUT_MS",
    "VAM_STATE_DIR",
    "VAM_HOST",
    "VAM_PORT",
    "VAM_STORAGE_PATH",
    "STORAGE_PATH",
    "VAM_SLOT_POLICY",
    "VAM_SWEEP_INTERVAL_MS",
    "VAM_ORPHAN_TTL_MS",
    "VAM_STARTUP_GRACE_MS",
    "VAM_STARTUP_TIMEOUT_MS",
    "VAM_TERM_TIMEOUT_MS",
    "VAM_KILL_TIMEOUT_MS",
    "VAM_REQUIRE_MARKER",
    "VAM_WORKER_PROGRAM",
    "SIP_TRUNK_ID",
    "COLOR",
];

/// Returns the path to a binary, checking llvm-cov target directory first.
/// Falls back to resolving relative to the test binary itself.
fn binary_path(name: &str) -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));

    let llvm_cov_path = manifest_dir.join("target/llvm-cov-target/debug").join(name);
    if llvm_cov_path.exists() {
        return llvm_cov_path;
    }

    let standard = manifest_dir.join("target/debug").join(name);
    if standard.exists() {
        return standard;
    }

    // The test binary lives at target/debug/deps/specs-<hash>
    if let Ok(exe) = std::env::current_exe() {
        if let Some(debug_dir) = exe.parent().and_then(|d| d.parent()) {
            let fallback = debug_dir.join(name);
            if fallback.exists() {
                return fallback;
            }
        }
    }

    standard
}

pub fn vamd_binary() -> PathBuf {
    binary_path("vamd")
}

fn scrubbed(program: PathBuf) -> Command {
    let mut cmd = Command::new(program);
    for key in SCRUBBED_ENV {
        cmd.env_remove(key);
    }
    cmd.env("NO_COLOR", "1");
    cmd
}

/// Create a CLI builder for vam commands
pub fn cli() -> CliBuilder {
    CliBuilder::new(binary_path("vam"))
}

/// Create a CLI builder for the daemon binary (info flags only)
pub fn vamd() -> CliBuilder {
    CliBuilder::new(vamd_binary())
}

/// An http URL nothing is listening on
pub fn dead_url() -> String {
    format!("http://127.0.0.1:{}", free_port())
}

pub fn free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

/// High-level CLI builder for fluent test assertions
pub struct CliBuilder {
    program: PathBuf,
    args: Vec<String>,
    envs: Vec<(String, String)>,
}

impl CliBuilder {
    fn new(program: PathBuf) -> Self {
        Self {
            program,
            args: Vec::new(),
            envs: vec![("VAM_TIMEOUT_MS".into(), "5000".into())],
        }
    }

    pub fn args(mut self, args: &[&str]) -> Self {
        self.args.extend(args.iter().map(|s| s.to_string()));
        self
    }

    pub fn env(mut self, key: &str, value: impl AsRef<str>) -> Self {
        self.envs.push((key.to_string(), value.as_ref().to_string()));
        self
    }

    pub fn command(self) -> Command {
        let mut cmd = scrubbed(self.program);
        cmd.args(&self.args);
        for (key, value) in self.envs {
            cmd.env(key, value);
        }
        cmd
    }

    /// Run and expect success (exit code 0)
    pub fn passes(self) -> RunAssert {
        let output = self.command().output().expect("command should run");
        assert!(
            output.status.success(),
            "expected command to pass, got exit code {:?}\nstdout: {}\nstderr: {}",
            output.status.code(),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        RunAssert { output }
    }

    /// Run and expect failure with exactly `code`
    pub fn fails_with(self, code: i32) -> RunAssert {
        let output = self.command().output().expect("command should run");
        assert_eq!(
            output.status.code(),
            Some(code),
            "unexpected exit code\nstdout: {}\nstderr: {}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        RunAssert { output }
    }
}

/// Result of a CLI run for chaining assertions
pub struct RunAssert {
    output: Output,
}

impl RunAssert {
    pub fn stdout(&self) -> String {
        String::from_utf8_lossy(&self.output.stdout).into_owned()
    }

    pub fn stderr(&self) -> String {
        String::from_utf8_lossy(&self.output.stderr).into_owned()
    }

    /// Parse stdout as JSON (for `-o json` runs)
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.stdout())
            .unwrap_or_else(|e| panic!("stdout is not JSON ({e}):\n{}", self.stdout()))
    }

    /// Assert stdout equals expected exactly (with diff on failure).
    pub fn stdout_eq(self, expected: &str) -> Self {
        similar_asserts::assert_eq!(self.stdout(), expected);
        self
    }

    pub fn stdout_has(self, expected: &str) -> Self {
        let stdout = self.stdout();
        assert!(
            stdout.contains(expected),
            "stdout does not contain '{}'\nstdout: {}",
            expected,
            stdout
        );
        self
    }

    pub fn stdout_lacks(self, unexpected: &str) -> Self {
        let stdout = self.stdout();
        assert!(
            !stdout.contains(unexpected),
            "stdout should not contain '{}'\nstdout: {}",
            unexpected,
            stdout
        );
        self
    }

    pub fn stderr_has(self, expected: &str) -> Self {
        let stderr = self.stderr();
        assert!(
            stderr.contains(expected),
            "stderr does not contain '{}'\nstderr: {}",
            expected,
            stderr
        );
        self
    }
}

// =============================================================================
// Polling
// =============================================================================

/// Poll a condition until it returns true or timeout is reached.
pub fn wait_for<F>(timeout_ms: u64, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let start = Instant::now();
    let timeout = Duration::from_millis(timeout_ms);
    let poll_interval = Duration::from_millis(SPEC_POLL_INTERVAL_MS);

    while start.elapsed() < timeout {
        if condition() {
            return true;
        }
        std::thread::sleep(poll_interval);
    }
    false
}

/// True while `pid` names a live process
pub fn pid_alive(pid: u64) -> bool {
    Command::new("kill")
        .args(["-0", &pid.to_string()])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

fn signal(pid: u32, sig: &str) {
    let _ = Command::new("kill")
        .args([sig, &pid.to_string()])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();
}

// =============================================================================
// Daemon
// =============================================================================

/// Worker that prints a line and stays up until killed.
///
/// The trailing `true` keeps `sh` from exec'ing `sleep`, so the shell's
/// command line (with the supervisor's `--agent-id`) stays visible.
pub const IDLE_WORKER: &str = "echo up; sleep 60; true";

/// A running `vamd` with an isolated state directory.
///
/// Stopped with SIGTERM on drop.
pub struct Daemon {
    child: Option<Child>,
    state_dir: tempfile::TempDir,
    storage_dir: tempfile::TempDir,
    port: u16,
}

impl Daemon {
    /// Start a daemon whose workers all run `sh -c IDLE_WORKER`
    pub fn start() -> Self {
        Self::with_config("")
    }

    /// Start a daemon with `extra` appended to the top level of vamd.toml
    pub fn with_config(extra: &str) -> Self {
        let state_dir = tempfile::tempdir().unwrap();
        let storage_dir = tempfile::tempdir().unwrap();
        let port = free_port();
        let toml = format!(
            r#"host = "127.0.0.1"
port = {port}
storage_path = "{storage}"
startup_grace_ms = 150
startup_timeout_ms = 1000
term_timeout_ms = 500
kill_timeout_ms = 500
port_base = 41000
port_span = 500
{extra}

[workers.voice]
program = "sh"
args = ["-c", "{IDLE_WORKER}", "sh"]

[workers.web]
program = "sh"
args = ["-c", "{IDLE_WORKER}", "sh"]

[workers.dialer]
program = "sh"
args = ["-c", "{IDLE_WORKER}", "sh"]
"#,
            storage = storage_dir.path().display(),
        );
        std::fs::write(state_dir.path().join("vamd.toml"), toml).unwrap();

        let mut daemon = Self {
            child: None,
            state_dir,
            storage_dir,
            port,
        };
        let mut child = daemon
            .command()
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .expect("vamd should spawn");

        let mut line = String::new();
        let stdout = child.stdout.take().expect("piped stdout");
        BufReader::new(stdout).read_line(&mut line).unwrap();
        daemon.child = Some(child);
        assert_eq!(
            line.trim(),
            "READY",
            "vamd did not become ready\nlog:\n{}",
            daemon.log()
        );
        daemon
    }

    /// A `vamd` command sharing this daemon's state directory
    pub fn command(&self) -> Command {
        let mut cmd = scrubbed(vamd_binary());
        cmd.env("VAM_STATE_DIR", self.state_dir.path());
        cmd
    }

    pub fn url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    pub fn pid(&self) -> u32 {
        self.child.as_ref().map(|c| c.id()).unwrap_or_default()
    }

    pub fn state_path(&self) -> &Path {
        self.state_dir.path()
    }

    pub fn storage_path(&self) -> &Path {
        self.storage_dir.path()
    }

    /// Write `<storage>/<user>/config/agent_config.json`
    pub fn user_config(&self, user_id: &str, json: &str) {
        let dir = self.storage_path().join(user_id).join("config");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("agent_config.json"), json).unwrap();
    }

    /// Run vam against this daemon
    pub fn vam(&self) -> CliBuilder {
        cli().env("VAM_URL", self.url())
    }

    pub fn log(&self) -> String {
        std::fs::read_to_string(self.state_path().join("vamd.log"))
            .unwrap_or_else(|_| "(no daemon log)".to_string())
    }

    pub fn agent_log(&self, agent_id: &str) -> PathBuf {
        self.state_path()
            .join("agents")
            .join(format!("agent_{agent_id}.log"))
    }

    /// Send SIGTERM and wait for the daemon to exit. Returns true on a clean exit.
    pub fn stop(&mut self) -> bool {
        let Some(mut child) = self.child.take() else {
            return true;
        };
        signal(child.id(), "-TERM");
        let exited = wait_for(SPEC_WAIT_MAX_MS, || matches!(child.try_wait(), Ok(Some(_))));
        if !exited {
            let _ = child.kill();
            let _ = child.wait();
            return false;
        }
        child.wait().map(|s| s.success()).unwrap_or(false)
    }
}

impl Drop for Daemon {
    fn drop(&mut self) {
        self.stop();
    }
}
