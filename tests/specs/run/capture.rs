// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Output capture and exit status reporting.

use crate::prelude::*;

#[tokio::test]
#[serial]
async fn snapshots_output_is_captured_line_by_line() {
    let tool = Tool::script(r#"[ "$1" = snapshots ] || exit 9; printf 'repo123\nrepo456\n'"#);
    let registry = RunRegistry::new();
    let command = tool.command(&registry, "default");

    within(command.exec(&args(&["snapshots"]), CommandOptions::default())).await;

    assert_eq!(command.stdout(), vec!["repo123", "repo456"]);
    assert!(command.stderr().is_empty());
    assert!(command.error().is_none());
    assert_eq!(command.program(), tool.path.to_str().unwrap());
}

#[tokio::test]
#[serial]
async fn deterministic_output_is_identical_across_runs() {
    let script = "i=0; while [ $i -lt 500 ]; do echo \"blob $i saved\"; i=$((i+1)); done";
    let tool = Tool::script(script);
    let registry = RunRegistry::new();

    let first = tool.command(&registry, "default");
    within(first.exec(&args(&["backup"]), CommandOptions::default())).await;
    let second = tool.command(&registry, "default");
    within(second.exec(&args(&["backup"]), CommandOptions::default())).await;

    assert_eq!(first.stdout().len(), 500);
    assert_eq!(first.stdout(), second.stdout());
    assert_eq!(first.stderr(), second.stderr());
}

#[tokio::test]
#[serial]
async fn exit_failure_keeps_output_written_before_exit() {
    let tool = Tool::script("echo 'scanned 12 files'; echo 'Fatal: wrong password' >&2; exit 1");
    let registry = RunRegistry::new();
    let command = tool.command(&registry, "default");

    within(command.exec(&args(&["check"]), CommandOptions::default())).await;

    let err = command.error().unwrap();
    assert!(matches!(*err, CommandError::Exit { .. }));
    assert_eq!(err.exit_code(), Some(1));
    assert_eq!(command.stdout(), vec!["scanned 12 files"]);
    assert_eq!(command.stderr(), vec!["Fatal: wrong password"]);
}

#[tokio::test]
#[serial]
async fn huge_unterminated_line_is_kept_whole() {
    // 50 MB of 'x' with no trailing newline.
    let tool = Tool::script("head -c 52428800 /dev/zero | tr '\\0' x");
    let registry = RunRegistry::new();
    let command = tool.command(&registry, "default");

    within(command.exec(&args(&["dump"]), CommandOptions::default())).await;

    assert!(command.error().is_none(), "{:?}", command.error());
    let stdout = command.stdout();
    assert_eq!(stdout.len(), 1);
    assert_eq!(stdout[0].len(), 52_428_800);
    assert!(stdout[0].bytes().all(|b| b == b'x'));
}
