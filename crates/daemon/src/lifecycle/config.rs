// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon configuration: defaults, then `vamd.toml`, then environment

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use vam_adapters::KillTimeouts;
use vam_core::SlotPolicy;

use super::LifecycleError;
use crate::env;
use crate::launch::{LaunchBuilder, WorkerSpec, WorkerSpecs};
use crate::port::PortAllocator;
use crate::supervisor::SupervisorConfig;

/// Poll interval while confirming a worker started
const STARTUP_POLL: Duration = Duration::from_millis(50);

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Root state directory (e.g. ~/.local/state/vam)
    pub state_dir: PathBuf,
    /// Path to lock/PID file
    pub lock_path: PathBuf,
    /// Path to version file
    pub version_path: PathBuf,
    /// Path to daemon log file
    pub log_path: PathBuf,
    /// Per-agent logs and liveness markers
    pub agents_dir: PathBuf,
    /// Optional TOML overrides
    pub config_path: PathBuf,
    pub host: String,
    pub port: u16,
    pub storage_root: PathBuf,
    pub policy: SlotPolicy,
    pub sweep_interval: Duration,
    pub orphan_ttl: Duration,
    pub startup_grace: Duration,
    pub startup_timeout: Duration,
    pub require_marker: bool,
    pub term_timeout: Duration,
    pub kill_timeout: Duration,
    pub port_base: u16,
    pub port_span: u16,
    pub reserved_ports: Vec<u16>,
    pub workers: WorkerSpecs,
    pub sip_trunk_id: Option<String>,
}

/// Shape of `vamd.toml`; every key is optional
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    host: Option<String>,
    port: Option<u16>,
    storage_path: Option<PathBuf>,
    slot_policy: Option<SlotPolicy>,
    sweep_interval_ms: Option<u64>,
    orphan_ttl_ms: Option<u64>,
    startup_grace_ms: Option<u64>,
    startup_timeout_ms: Option<u64>,
    require_marker: Option<bool>,
    term_timeout_ms: Option<u64>,
    kill_timeout_ms: Option<u64>,
    port_base: Option<u16>,
    port_span: Option<u16>,
    reserved_ports: Option<Vec<u16>>,
    sip_trunk_id: Option<String>,
    workers: FileWorkers,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileWorkers {
    voice: Option<WorkerSpec>,
    web: Option<WorkerSpec>,
    dialer: Option<WorkerSpec>,
}

impl Config {
    /// Load configuration for the daemon from the resolved state directory.
    pub fn load() -> Result<Self, LifecycleError> {
        Self::load_from(env::state_dir()?)
    }

    /// Built-in defaults rooted at `state_dir`, then the TOML file, then env.
    pub fn load_from(state_dir: PathBuf) -> Result<Self, LifecycleError> {
        let mut config = Self::defaults(state_dir);
        if let Some(file) = read_file(&config.config_path)? {
            config.apply_file(file);
        }
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    fn defaults(state_dir: PathBuf) -> Self {
        Self {
            lock_path: state_dir.join("vamd.pid"),
            version_path: state_dir.join("vamd.version"),
            log_path: state_dir.join("vamd.log"),
            agents_dir: state_dir.join("agents"),
            config_path: state_dir.join("vamd.toml"),
            state_dir,
            host: "0.0.0.0".to_string(),
            port: 8001,
            storage_root: PathBuf::from("./user_data"),
            policy: SlotPolicy::default(),
            sweep_interval: Duration::from_secs(300),
            orphan_ttl: Duration::from_secs(3600),
            startup_grace: Duration::from_secs(1),
            startup_timeout: Duration::from_secs(2),
            require_marker: false,
            term_timeout: Duration::from_secs(1),
            kill_timeout: Duration::from_secs(1),
            port_base: 9000,
            port_span: 1000,
            reserved_ports: vec![8000, 8001],
            workers: WorkerSpecs::default(),
            sip_trunk_id: None,
        }
    }

    fn apply_file(&mut self, file: FileConfig) {
        let ms = Duration::from_millis;
        if let Some(v) = file.host {
            self.host = v;
        }
        if let Some(v) = file.port {
            self.port = v;
        }
        if let Some(v) = file.storage_path {
            self.storage_root = v;
        }
        if let Some(v) = file.slot_policy {
            self.policy = v;
        }
        if let Some(v) = file.sweep_interval_ms {
            self.sweep_interval = ms(v);
        }
        if let Some(v) = file.orphan_ttl_ms {
            self.orphan_ttl = ms(v);
        }
        if let Some(v) = file.startup_grace_ms {
            self.startup_grace = ms(v);
        }
        if let Some(v) = file.startup_timeout_ms {
            self.startup_timeout = ms(v);
        }
        if let Some(v) = file.require_marker {
            self.require_marker = v;
        }
        if let Some(v) = file.term_timeout_ms {
            self.term_timeout = ms(v);
        }
        if let Some(v) = file.kill_timeout_ms {
            self.kill_timeout = ms(v);
        }
        if let Some(v) = file.port_base {
            self.port_base = v;
        }
        if let Some(v) = file.port_span {
            self.port_span = v;
        }
        if let Some(v) = file.reserved_ports {
            self.reserved_ports = v;
        }
        if let Some(v) = file.sip_trunk_id {
            self.sip_trunk_id = Some(v);
        }
        if let Some(v) = file.workers.voice {
            self.workers.voice = v;
        }
        if let Some(v) = file.workers.web {
            self.workers.web = v;
        }
        if let Some(v) = file.workers.dialer {
            self.workers.dialer = v;
        }
    }

    fn apply_env(&mut self) -> Result<(), LifecycleError> {
        if let Some(v) = env::host() {
            self.host = v;
        }
        if let Some(v) = env::port()? {
            self.port = v;
        }
        if let Some(v) = env::storage_path() {
            self.storage_root = v;
        }
        if let Some(v) = env::slot_policy()? {
            self.policy = v;
        }
        if let Some(v) = env::sweep_interval()? {
            self.sweep_interval = v;
        }
        if let Some(v) = env::orphan_ttl()? {
            self.orphan_ttl = v;
        }
        if let Some(v) = env::startup_grace()? {
            self.startup_grace = v;
        }
        if let Some(v) = env::startup_timeout()? {
            self.startup_timeout = v;
        }
        if let Some(v) = env::require_marker()? {
            self.require_marker = v;
        }
        if let Some(v) = env::term_timeout()? {
            self.term_timeout = v;
        }
        if let Some(v) = env::kill_timeout()? {
            self.kill_timeout = v;
        }
        if let Some(program) = env::worker_program() {
            self.workers.override_program(&program);
        }
        if let Some(v) = env::sip_trunk_id() {
            self.sip_trunk_id = Some(v);
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), LifecycleError> {
        if self.sweep_interval.is_zero() {
            return Err(LifecycleError::InvalidConfig(
                "sweep interval must be greater than zero".into(),
            ));
        }
        self.port_allocator()?;
        Ok(())
    }

    /// Derived-port range, with the daemon's own port always reserved
    pub fn port_allocator(&self) -> Result<PortAllocator, LifecycleError> {
        let mut reserved = self.reserved_ports.clone();
        reserved.push(self.port);
        PortAllocator::new(self.port_base, self.port_span, reserved).ok_or_else(|| {
            LifecycleError::InvalidConfig(format!(
                "port range {}+{} is empty or exceeds 65535",
                self.port_base, self.port_span
            ))
        })
    }

    pub fn supervisor_config(&self) -> Result<SupervisorConfig, LifecycleError> {
        Ok(SupervisorConfig {
            policy: self.policy,
            storage_root: self.storage_root.clone(),
            startup_grace: self.startup_grace,
            startup_timeout: self.startup_timeout,
            require_marker: self.require_marker,
            startup_poll: STARTUP_POLL,
            orphan_ttl: self.orphan_ttl,
            ports: self.port_allocator()?,
        })
    }

    pub fn launch_builder(&self) -> LaunchBuilder {
        LaunchBuilder::new(self.workers.clone(), self.agents_dir.clone())
            .with_fallback_sip_trunk(self.sip_trunk_id.clone())
    }

    pub fn kill_timeouts(&self) -> KillTimeouts {
        KillTimeouts {
            term: self.term_timeout,
            kill: self.kill_timeout,
            ..KillTimeouts::default()
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn read_file(path: &Path) -> Result<Option<FileConfig>, LifecycleError> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    toml::from_str(&text)
        .map(Some)
        .map_err(|source| LifecycleError::ConfigFile {
            path: path.to_path_buf(),
            source,
        })
}
