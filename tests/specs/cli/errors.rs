// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Failures that never reach a daemon

use crate::prelude::*;

#[test]
fn list_without_daemon_fails() {
    cli()
        .env("VAM_URL", dead_url())
        .args(&["list"])
        .fails_with(1)
        .stderr_has("cannot reach vamd");
}

#[test]
fn status_without_daemon_reports_not_running() {
    cli()
        .env("VAM_URL", dead_url())
        .args(&["status"])
        .passes()
        .stdout_has("not running");
}

#[test]
fn invalid_url_fails() {
    cli()
        .args(&["--url", "not a url", "list"])
        .fails_with(1)
        .stderr_has("invalid daemon URL");
}

#[test]
fn start_requires_user() {
    cli().args(&["start"]).fails_with(2);
}

#[test]
fn vamd_rejects_unknown_arguments() {
    vamd()
        .args(&["--bogus"])
        .fails_with(1)
        .stderr_has("unexpected argument '--bogus'");
}
