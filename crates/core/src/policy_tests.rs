// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    global      = { "global",   SlotPolicy::Global },
    per_user    = { "per_user", SlotPolicy::PerUser },
    dashed      = { "per-user", SlotPolicy::PerUser },
    short       = { "user",     SlotPolicy::PerUser },
    upper       = { "GLOBAL",   SlotPolicy::Global },
)]
fn parses(input: &str, expected: SlotPolicy) {
    assert_eq!(input.parse::<SlotPolicy>().unwrap(), expected);
}

#[test]
fn rejects_unknown() {
    assert!("everyone".parse::<SlotPolicy>().is_err());
}

#[yare::parameterized(
    global_same_user     = { SlotPolicy::Global,  "alice", "alice", true },
    global_other_user    = { SlotPolicy::Global,  "alice", "bob",   true },
    per_user_same_user   = { SlotPolicy::PerUser, "alice", "alice", true },
    per_user_other_user  = { SlotPolicy::PerUser, "alice", "bob",   false },
)]
fn blocking(policy: SlotPolicy, holder: &str, requester: &str, expected: bool) {
    assert_eq!(policy.blocks(holder, requester), expected);
}

#[test]
fn default_is_global() {
    assert_eq!(SlotPolicy::default(), SlotPolicy::Global);
}

#[test]
fn serde_uses_snake_case() {
    assert_eq!(serde_json::to_string(&SlotPolicy::PerUser).unwrap(), "\"per_user\"");
    let p: SlotPolicy = serde_json::from_str("\"global\"").unwrap();
    assert_eq!(p, SlotPolicy::Global);
}
