// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! ANSI styling for `vam` text output

use std::io::IsTerminal;

/// 256-color palette entry for table headers
const HEADER_FG: u8 = 74;
/// 256-color palette entry for agent ids and other secondary columns
const MUTED_FG: u8 = 240;
const WARN_FG: &str = "\x1b[33m";
const RESET: &str = "\x1b[0m";

/// `NO_COLOR` turns styling off, `COLOR` forces it on, otherwise style only
/// when stdout is a terminal.
pub fn should_colorize() -> bool {
    match (crate::env::no_color(), crate::env::force_color()) {
        (true, _) => false,
        (false, true) => true,
        (false, false) => std::io::stdout().is_terminal(),
    }
}

fn paint(fg: &str, text: &str) -> String {
    format!("{fg}{text}{RESET}")
}

fn palette(code: u8) -> String {
    format!("\x1b[38;5;{code}m")
}

/// Always styled; the table decides whether to call it.
pub(crate) fn apply_header(text: &str) -> String {
    paint(&palette(HEADER_FG), text)
}

/// Always styled; the table decides whether to call it.
pub(crate) fn apply_muted(text: &str) -> String {
    paint(&palette(MUTED_FG), text)
}

/// Warning text, styled only when [`should_colorize`] allows it.
pub fn yellow(text: &str) -> String {
    if should_colorize() {
        paint(WARN_FG, text)
    } else {
        text.to_string()
    }
}

#[cfg(test)]
#[path = "color_tests.rs"]
mod tests;
