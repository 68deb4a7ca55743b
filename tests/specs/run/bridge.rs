// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Feeding the tool's stdin from a remote exec stream.

use crate::prelude::*;

#[tokio::test]
#[serial]
async fn dump_is_streamed_into_stdin() {
    let tool = Tool::script("wc -l | tr -d ' '");
    let registry = RunRegistry::new();
    let command = tool.command(&registry, "mariadb");
    let remote = FakeRemoteExec::streaming(b"INSERT 1;\nINSERT 2;\nINSERT 3;\n");
    let options = CommandOptions::default().stdin_from(Arc::new(remote.clone()), pod());

    within(command.exec(&args(&["backup", "--stdin"]), options)).await;

    assert!(command.error().is_none(), "{:?}", command.error());
    assert_eq!(command.stdout(), vec!["3"]);
    assert_eq!(remote.calls(), vec![pod()]);
}

#[tokio::test]
#[serial]
async fn refused_connection_never_starts_the_tool() {
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("started");
    let tool = Tool::script(&format!("touch {}; cat >/dev/null", marker.display()));
    let registry = RunRegistry::new();
    let command = tool.command(&registry, "mariadb");
    let remote = FakeRemoteExec::refusing("connection refused");
    let options = CommandOptions::default().stdin_from(Arc::new(remote), pod());

    within(command.exec(&args(&["backup", "--stdin"]), options)).await;

    let err = command.error().unwrap();
    assert!(matches!(*err, CommandError::Bridge(BridgeError::Establish(_))));
    assert!(err.to_string().contains("connection refused"));
    assert!(!marker.exists());
    assert!(command.pid().is_none());
    assert!(registry.current("mariadb").is_none());
}

#[tokio::test]
#[serial]
async fn broken_stream_aborts_tool_and_is_the_reported_failure() {
    // Runs for 30s unless the bridge kills it.
    let tool = Tool::script("cat >/dev/null; sleep 30");
    let registry = RunRegistry::new();
    let command = tool.command(&registry, "mariadb");
    let closed = std::io::ErrorKind::BrokenPipe;
    let steps = [
        ReadStep::Data(b"INSERT 1;\n".to_vec()),
        ReadStep::Fail(closed, "websocket closed".to_string()),
    ];
    let remote = FakeRemoteExec::scripted(steps)
        .with_diagnostics("mysqldump: Error 2013: Lost connection\n");
    let options = CommandOptions::default().stdin_from(Arc::new(remote), pod());

    within(command.exec(&args(&["backup", "--stdin"]), options)).await;

    match &*command.error().unwrap() {
        CommandError::Bridge(BridgeError::Remote(text)) => {
            assert_eq!(text, "mysqldump: Error 2013: Lost connection");
        }
        other => panic!("expected remote failure, got {other:?}"),
    }
}
