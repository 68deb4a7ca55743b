// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Signal routing through the run registry.

use restash_exec::Signal;

use crate::prelude::*;

#[tokio::test]
#[serial]
async fn terminate_reaches_the_running_tool() {
    let tool = Tool::script("echo locking repository; exec sleep 30");
    let registry = RunRegistry::new();
    let command = tool.command(&registry, "prune");
    let runner = command.clone();
    let argv = args(&["prune"]);
    let handle = tokio::spawn(async move {
        runner.exec(&argv, CommandOptions::default()).await
    });

    running(&registry, "prune").await;
    registry.signal("prune", Signal::SIGTERM).unwrap();
    within(handle).await.unwrap();

    let err = command.error().unwrap();
    assert!(err.to_string().contains("SIGTERM"), "{err}");
    assert_eq!(command.stdout(), vec!["locking repository"]);
}

#[tokio::test]
#[serial]
async fn newer_run_replaces_older_in_slot() {
    let tool = Tool::script("echo done");
    let registry = RunRegistry::new();
    let first = tool.command(&registry, "backup");
    within(first.exec(&args(&["backup"]), CommandOptions::default())).await;
    let second = tool.command(&registry, "backup");
    within(second.exec(&args(&["backup"]), CommandOptions::default())).await;

    let current = registry.current("backup").unwrap();
    assert!(current.same_invocation(&second));
    assert!(matches!(
        registry.signal("backup", Signal::SIGTERM),
        Err(SignalError::Exited { .. })
    ));
}
