// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serial_test::serial;

#[test]
fn header_and_muted_wrap_text() {
    assert_eq!(apply_header("USER"), "\x1b[38;5;74mUSER\x1b[0m");
    assert_eq!(apply_muted("9123"), "\x1b[38;5;240m9123\x1b[0m");
}

#[test]
#[serial(color)]
fn no_color_wins_over_force() {
    std::env::set_var("NO_COLOR", "1");
    std::env::set_var("COLOR", "1");
    let colorize = should_colorize();
    let warning = yellow("careful");
    std::env::remove_var("NO_COLOR");
    std::env::remove_var("COLOR");

    assert!(!colorize);
    assert_eq!(warning, "careful");
}

#[test]
#[serial(color)]
fn force_color_enables() {
    std::env::remove_var("NO_COLOR");
    std::env::set_var("COLOR", "1");
    let colorize = should_colorize();
    let warning = yellow("careful");
    std::env::remove_var("COLOR");

    assert!(colorize);
    assert_eq!(warning, "\x1b[33mcareful\x1b[0m");
}
