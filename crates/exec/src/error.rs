// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for command execution.

use std::process::ExitStatus;

use crate::collector::StreamKind;

/// Terminal failure of one command invocation.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// The subprocess could not be started or its pipes could not be opened.
    #[error("failed to start `{program}`: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The remote stdin bridge failed to establish or broke mid-copy.
    #[error("stdin bridge: {0}")]
    Bridge(#[from] BridgeError),

    /// Reading one of the subprocess's output pipes failed.
    #[error("reading {stream}: {source}")]
    Collect {
        stream: StreamKind,
        #[source]
        source: std::io::Error,
    },

    /// The subprocess exited non-zero or was killed by a signal.
    #[error("`{program}` {}", describe_status(.status))]
    Exit { program: String, status: ExitStatus },

    /// Waiting on the subprocess failed.
    #[error("waiting for `{program}`: {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

impl CommandError {
    /// Exit code of the subprocess, when the failure is a plain non-zero exit.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            CommandError::Exit { status, .. } => status.code(),
            _ => None,
        }
    }
}

fn describe_status(status: &ExitStatus) -> String {
    use std::os::unix::process::ExitStatusExt;

    match (status.code(), status.signal()) {
        (Some(code), _) => format!("exited with code {code}"),
        (None, Some(signal)) => match nix::sys::signal::Signal::try_from(signal) {
            Ok(sig) => format!("was killed by {sig}"),
            Err(_) => format!("was killed by signal {signal}"),
        },
        (None, None) => format!("terminated abnormally ({status})"),
    }
}

/// Failures of the remote stdin bridge.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// The remote exec stream could not be established.
    #[error("remote exec failed: {0}")]
    Establish(#[source] RemoteExecError),

    /// Copying remote output into the local stdin pipe failed.
    #[error("copy into stdin failed: {0}")]
    Copy(#[source] std::io::Error),

    /// The copy failed and the remote side reported diagnostics.
    #[error("remote command failed: {0}")]
    Remote(String),
}

/// Errors returned by [`crate::RemoteExec`] implementations.
#[derive(Debug, thiserror::Error)]
pub enum RemoteExecError {
    #[error("{0}")]
    Connect(String),
    #[error("pod {namespace}/{pod}: {message}")]
    Target {
        namespace: String,
        pod: String,
        message: String,
    },
    #[error("remote stream unavailable: {0}")]
    Stream(String),
}

/// Errors from delivering a signal to a command's process.
#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    #[error("process has not been started")]
    NotStarted,
    #[error("process {pid} has already exited")]
    Exited { pid: u32 },
    #[error("no command registered for slot `{0}`")]
    NoSuchSlot(String),
    #[error("signal delivery to {pid} failed: {source}")]
    Os {
        pid: u32,
        #[source]
        source: nix::errno::Errno,
    },
}
