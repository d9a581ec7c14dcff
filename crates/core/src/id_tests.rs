// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::collections::HashSet;

define_id! {
    pub struct TestId;
}

#[test]
fn agent_codes_are_uppercase_alphanumeric() {
    let gen = AgentCodeGen;
    for _ in 0..100 {
        let code = gen.next();
        assert_eq!(code.len(), AGENT_CODE_LEN);
        assert!(
            code.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()),
            "unexpected character in {code}"
        );
    }
}

#[test]
fn agent_codes_rarely_repeat() {
    let gen = AgentCodeGen;
    let codes: HashSet<String> = (0..200).map(|_| gen.next()).collect();
    assert!(codes.len() > 195);
}

#[test]
fn sequential_ids_count_up() {
    let gen = SequentialIdGen::new("T");
    assert_eq!(gen.next(), "T0001");
    assert_eq!(gen.next(), "T0002");
}

#[test]
fn sequential_clones_share_counter() {
    let a = SequentialIdGen::default();
    let b = a.clone();
    assert_eq!(a.next(), "AGENT0001");
    assert_eq!(b.next(), "AGENT0002");
}

#[test]
fn defined_id_compares_with_str() {
    let id = TestId::new("alice");
    assert_eq!(id, "alice");
    assert_eq!(id.as_str(), "alice");
    assert_eq!(id.to_string(), "alice");
}

#[test]
fn defined_id_blank_is_empty() {
    assert!(TestId::new("").is_empty());
    assert!(TestId::new("  ").is_empty());
    assert!(!TestId::from("bob").is_empty());
}

#[test]
fn defined_id_serializes_as_plain_string() {
    let id = TestId::from("carol".to_string());
    assert_eq!(serde_json::to_string(&id).unwrap(), "\"carol\"");
    let back: TestId = serde_json::from_str("\"carol\"").unwrap();
    assert_eq!(back, id);
}

#[test]
fn defined_id_borrows_as_str_for_map_lookup() {
    let mut map = std::collections::HashMap::new();
    map.insert(TestId::new("dave"), 1);
    assert_eq!(map.get("dave"), Some(&1));
}
