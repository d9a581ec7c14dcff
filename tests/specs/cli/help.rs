// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Help and version output

use crate::prelude::*;

#[test]
fn vam_help_lists_subcommands() {
    let out = cli().args(&["--help"]).passes();
    for command in ["start", "stop", "list", "status"] {
        assert!(out.stdout().contains(command), "missing {command}:\n{}", out.stdout());
    }
}

#[test]
fn vam_without_subcommand_prints_help() {
    cli().args(&[]).passes().stdout_has("Usage: vam");
}

#[test]
fn start_help_shows_options() {
    cli()
        .args(&["start", "--help"])
        .passes()
        .stdout_has("<USER_ID>")
        .stdout_has("--type")
        .stdout_has("--collection")
        .stdout_has("--phone");
}

#[test]
fn vamd_version() {
    vamd()
        .args(&["--version"])
        .passes()
        .stdout_eq(&format!("vamd {}\n", env!("CARGO_PKG_VERSION")));
}

#[test]
fn vamd_help_mentions_state_dir() {
    vamd().args(&["--help"]).passes().stdout_has("VAM_STATE_DIR");
}
