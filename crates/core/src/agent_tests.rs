// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    voice        = { "voice",   AgentType::Voice },
    web          = { "web",     AgentType::Web },
    dialer       = { "dialer",  AgentType::Dialer },
    mixed_case   = { "Dialer",  AgentType::Dialer },
    padded       = { " web ",   AgentType::Web },
)]
fn parses_known_types(input: &str, expected: AgentType) {
    assert_eq!(input.parse::<AgentType>().unwrap(), expected);
}

#[yare::parameterized(
    empty   = { "" },
    unknown = { "robot" },
    plural  = { "voices" },
)]
fn rejects_unknown_types(input: &str) {
    let err = input.parse::<AgentType>().unwrap_err();
    assert_eq!(err, UnknownAgentType(input.to_string()));
}

#[test]
fn display_matches_wire_name() {
    for ty in AgentType::ALL {
        assert_eq!(ty.to_string(), ty.as_str());
        let json = serde_json::to_string(&ty).unwrap();
        assert_eq!(json, format!("\"{}\"", ty.as_str()));
    }
}

#[test]
fn default_type_is_voice() {
    assert_eq!(AgentType::default(), AgentType::Voice);
}

#[test]
fn only_dialer_needs_telephony() {
    assert!(AgentType::Dialer.needs_telephony());
    assert!(!AgentType::Voice.needs_telephony());
    assert!(!AgentType::Web.needs_telephony());
}

#[test]
fn user_and_agent_ids_are_distinct_types() {
    let user = UserId::new("alice");
    let agent = AgentId::new("AB12CD34");
    assert_eq!(user, "alice");
    assert_eq!(agent.as_str(), "AB12CD34");
}
