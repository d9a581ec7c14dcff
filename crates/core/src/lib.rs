// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! vam-core: shared types for the voice agent manager

pub mod agent;
pub mod clock;
pub mod id;
pub mod policy;
pub mod summary;
pub mod time_fmt;
pub mod user_config;

pub use agent::{AgentId, AgentType, UnknownAgentType, UserId};
pub use clock::{Clock, FakeClock, SystemClock};
pub use id::{AgentCodeGen, IdGen, SequentialIdGen, AGENT_CODE_LEN};
pub use policy::{SlotPolicy, UnknownSlotPolicy};
pub use summary::AgentSummary;
pub use time_fmt::{format_uptime, format_uptime_secs};
pub use user_config::{ConfigError, UserAgentConfig};
