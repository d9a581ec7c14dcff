// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker port allocation: hash-derived start, probe and retry

use sha2::{Digest, Sha256};
use std::net::{Ipv4Addr, TcpListener};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortAllocator {
    base: u16,
    span: u16,
    reserved: Vec<u16>,
}

impl PortAllocator {
    /// `base + span` must not exceed 65536 and `span` must be non-zero.
    pub fn new(base: u16, span: u16, reserved: Vec<u16>) -> Option<Self> {
        if span == 0 || u32::from(base) + u32::from(span) > 65_536 {
            return None;
        }
        Some(Self {
            base,
            span,
            reserved,
        })
    }

    pub fn base(&self) -> u16 {
        self.base
    }

    pub fn span(&self) -> u16 {
        self.span
    }

    /// First candidate for this user/agent pair.
    pub fn derive(&self, user_id: &str, agent_id: &str) -> u16 {
        let mut hasher = Sha256::new();
        hasher.update(user_id.as_bytes());
        hasher.update([0u8]);
        hasher.update(agent_id.as_bytes());
        let digest = hasher.finalize();
        let mut head = [0u8; 8];
        head.copy_from_slice(&digest[..8]);
        let offset = u64::from_be_bytes(head) % u64::from(self.span);
        self.base + offset as u16
    }

    /// Walk the range from the derived candidate, wrapping, and return the
    /// first port that is not reserved, not in use and accepted by `is_free`.
    pub fn allocate(
        &self,
        user_id: &str,
        agent_id: &str,
        in_use: &[u16],
        mut is_free: impl FnMut(u16) -> bool,
    ) -> Option<u16> {
        let start = u32::from(self.derive(user_id, agent_id) - self.base);
        let span = u32::from(self.span);
        (0..span)
            .map(|i| self.base + ((start + i) % span) as u16)
            .filter(|p| !self.reserved.contains(p) && !in_use.contains(p))
            .find(|&p| is_free(p))
    }
}

/// True if nothing is listening on `port` on the loopback interface.
pub fn loopback_port_free(port: u16) -> bool {
    TcpListener::bind((Ipv4Addr::LOCALHOST, port)).is_ok()
}

#[cfg(test)]
#[path = "port_tests.rs"]
mod tests;
