// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use vam_core::{AgentId, UserId};
use yare::parameterized;

#[parameterized(
    invalid = { SupervisorError::InvalidRequest("user_id must not be empty".into()), StatusCode::BAD_REQUEST },
    conflict = {
        SupervisorError::Conflict {
            requested: UserId::new("bob"),
            holder: UserId::new("alice"),
            agent_id: AgentId::new("AB12CD34"),
        },
        StatusCode::CONFLICT
    },
    launch = {
        SupervisorError::LaunchFailure {
            user_id: UserId::new("bob"),
            agent_id: None,
            reason: "boom".into(),
        },
        StatusCode::INTERNAL_SERVER_ERROR
    },
    not_found = { SupervisorError::NotFound { user_id: UserId::new("carol") }, StatusCode::NOT_FOUND },
    aborted = { SupervisorError::aborted("stop", &UserId::new("dave"), "task panicked"), StatusCode::INTERNAL_SERVER_ERROR },
)]
fn status_mapping(err: SupervisorError, expected: StatusCode) {
    let detail = err.to_string();
    let api = ApiError::from(err);
    assert_eq!(api.status, expected);
    assert_eq!(api.detail, detail);
}

#[test]
fn conflict_detail_names_holder() {
    let api = ApiError::from(SupervisorError::Conflict {
        requested: UserId::new("bob"),
        holder: UserId::new("alice"),
        agent_id: AgentId::new("AB12CD34"),
    });
    assert_eq!(api.detail, "agent AB12CD34 is already running for user alice");
}
