// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn render_to_string(table: &Table) -> String {
    let mut buf = Vec::new();
    table.render(&mut buf);
    String::from_utf8(buf).unwrap()
}

#[test]
fn empty_table_prints_nothing() {
    let table = Table::plain(vec![Column::left("USER"), Column::left("TYPE")]);
    assert_eq!(render_to_string(&table), "");
}

#[test]
fn multi_column_left_alignment() {
    let mut table = Table::plain(vec![Column::left("USER"), Column::left("TYPE")]);
    table.row(vec!["alice".into(), "web".into()]);
    table.row(vec!["bo".into(), "dialer".into()]);
    let out = render_to_string(&table);
    let lines: Vec<&str> = out.lines().collect();

    assert_eq!(lines, vec!["USER   TYPE", "alice  web", "bo     dialer"]);
}

#[test]
fn right_alignment() {
    let mut table = Table::plain(vec![Column::left("USER"), Column::right("PORT")]);
    table.row(vec!["alice".into(), "9123".into()]);
    table.row(vec!["bob".into(), "80".into()]);
    let out = render_to_string(&table);
    let lines: Vec<&str> = out.lines().collect();

    assert_eq!(lines, vec!["USER   PORT", "alice  9123", "bob      80"]);
}

#[test]
fn missing_cells_render_empty() {
    let mut table = Table::plain(vec![Column::left("USER"), Column::muted("AGENT")]);
    table.row(vec!["alice".into()]);
    let out = render_to_string(&table);
    assert_eq!(out.lines().nth(1), Some("alice  "));
}

#[test]
fn muted_column_is_colored_only_when_enabled() {
    let mut table = Table {
        columns: vec![Column::left("USER"), Column::muted("AGENT")],
        rows: Vec::new(),
        colorize: true,
    };
    table.row(vec!["alice".into(), "AB12CD34".into()]);
    let out = render_to_string(&table);
    assert!(out.contains("\x1b[38;5;240mAB12CD34\x1b[0m"), "{out:?}");
    assert!(out.starts_with("\x1b[38;5;74m"), "{out:?}");
}
