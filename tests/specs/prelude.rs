// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared helpers for specs: a scratch backup tool and bounded waits.

use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;
use std::time::Duration;

pub use restash_exec::fake::{FakeRemoteExec, ReadStep};
pub use restash_exec::{
    BridgeError, CommandError, CommandOptions, GenericCommand, PodExecParams, RunRegistry,
    SignalError,
};
pub use serial_test::serial;
pub use std::sync::Arc;

/// A throwaway executable standing in for the backup tool.
///
/// Points `RESTIC_BINARY` at itself for as long as it lives, so specs using
/// it must be `#[serial]`.
pub struct Tool {
    _dir: tempfile::TempDir,
    pub path: PathBuf,
}

impl Tool {
    pub fn script(body: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("restic");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        std::env::set_var("RESTIC_BINARY", &path);
        Self { _dir: dir, path }
    }

    pub fn command(&self, registry: &RunRegistry, slot: &str) -> GenericCommand {
        GenericCommand::new(registry.clone(), slot)
    }
}

impl Drop for Tool {
    fn drop(&mut self) {
        std::env::remove_var("RESTIC_BINARY");
    }
}

pub fn args(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

pub fn pod() -> PodExecParams {
    PodExecParams {
        namespace: "db".to_string(),
        pod: "mariadb-0".to_string(),
        container: None,
        command: args(&["sh", "-c", "mysqldump --all-databases"]),
    }
}

/// Await `fut`, failing if it takes longer than 20s.
pub async fn within<F: std::future::Future>(fut: F) -> F::Output {
    tokio::time::timeout(Duration::from_secs(20), fut)
        .await
        .expect("timed out")
}

/// Poll until `slot` holds a command with a live pid.
pub async fn running(registry: &RunRegistry, slot: &str) -> GenericCommand {
    within(async {
        loop {
            if let Some(cmd) = registry.current(slot) {
                if cmd.pid().is_some() {
                    return cmd;
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
}
