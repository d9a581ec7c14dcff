// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Voice agent manager daemon library
//!
//! The supervisor, its HTTP surface and the protocol types used by CLI
//! clients.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod api;
pub mod env;
pub mod error;
pub mod launch;
pub mod lifecycle;
pub mod port;
pub mod protocol;
pub mod registry;
pub mod supervisor;
pub mod sweep;

pub use error::{LaunchError, SupervisorError};
pub use launch::{LaunchBuilder, LaunchPlan, LaunchRequest, WorkerSpec, WorkerSpecs};
pub use lifecycle::{Config, DaemonState, LifecycleError, StartupResult};
pub use protocol::{
    AgentStatus, AgentsResponse, ErrorBody, StartAgentRequest, StartAgentResponse,
    StatusResponse, StopAgentResponse,
};
pub use supervisor::{
    StartedAgent, StoppedAgent, Supervisor, SupervisorConfig, SupervisorStatus, SweepReport,
};
