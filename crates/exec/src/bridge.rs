// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Remote stdin bridge — feeds a subprocess's stdin from a remote exec stream.
//!
//! The remote side is abstracted behind [`RemoteExec`]; production uses the
//! Kubernetes implementation in `restash-adapters`. A session exposes the
//! remote stdout as a byte stream plus a [`Diagnostics`] buffer that
//! accumulates whatever the remote command writes to its stderr.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::task::JoinHandle;

use crate::error::{BridgeError, RemoteExecError};

/// Identifies the remote command whose output is streamed into stdin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodExecParams {
    pub namespace: String,
    pub pod: String,
    /// Container within the pod (None = the pod's default container)
    pub container: Option<String>,
    pub command: Vec<String>,
}

/// Accumulated remote stderr, shared between the session's reader task and
/// the bridge.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    inner: Arc<Mutex<Vec<u8>>>,
}

impl Diagnostics {
    pub fn append(&self, bytes: &[u8]) {
        self.inner.lock().extend_from_slice(bytes);
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.inner.lock()).into_owned()
    }

    /// Drain `reader` into this buffer until end-of-stream or a read error.
    pub async fn fill_from<R>(&self, mut reader: R)
    where
        R: AsyncRead + Unpin,
    {
        let mut chunk = [0u8; 4096];
        loop {
            match reader.read(&mut chunk).await {
                Ok(0) => break,
                Ok(n) => self.append(&chunk[..n]),
                Err(e) => {
                    tracing::debug!(error = %e, "remote stderr read failed");
                    break;
                }
            }
        }
    }
}

/// Resolves once the remote command has finished: `Err` carries its failure
/// message.
pub type RemoteCompletion = Pin<Box<dyn Future<Output = Result<(), String>> + Send>>;

/// How long a failing bridge waits for remote stderr to land in the
/// diagnostics before reporting.
const DIAGNOSTICS_GRACE: Duration = Duration::from_millis(500);

/// An established remote exec stream.
pub struct RemoteSession {
    stdout: Box<dyn AsyncRead + Send + Unpin>,
    diagnostics: Diagnostics,
    diagnostics_task: Option<JoinHandle<()>>,
    completion: Option<RemoteCompletion>,
    /// Whatever must stay alive for the stream to keep flowing.
    _guard: Option<Box<dyn Send>>,
}

impl RemoteSession {
    pub fn new<R>(stdout: R, diagnostics: Diagnostics) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        Self {
            stdout: Box::new(stdout),
            diagnostics,
            diagnostics_task: None,
            completion: None,
            _guard: None,
        }
    }

    /// Task filling the diagnostics buffer. On failure the bridge waits
    /// briefly for it before reading the diagnostics.
    pub fn with_diagnostics_task(mut self, task: JoinHandle<()>) -> Self {
        self.diagnostics_task = Some(task);
        self
    }

    /// Check `completion` after the stream ends cleanly, so a remote command
    /// that fails after producing partial output is not taken as success.
    pub fn with_completion<F>(mut self, completion: F) -> Self
    where
        F: Future<Output = Result<(), String>> + Send + 'static,
    {
        self.completion = Some(Box::pin(completion));
        self
    }

    /// Keep `guard` alive for as long as the session is.
    pub fn with_guard<G: Send + 'static>(mut self, guard: G) -> Self {
        self._guard = Some(Box::new(guard));
        self
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }
}

/// Opens remote exec streams.
#[async_trait]
pub trait RemoteExec: Send + Sync + 'static {
    async fn exec(&self, params: &PodExecParams) -> Result<RemoteSession, RemoteExecError>;
}

/// Copy the session's stdout into `stdin` until either side closes.
///
/// On a copy failure, or when the remote command reports failure after its
/// stream ended, `kill` is invoked so the subprocess never treats a truncated
/// stream as complete input. The remote diagnostics (if any) replace the raw
/// copy error. `stdin` is closed on every path.
pub(crate) async fn pump<W, K>(
    session: RemoteSession,
    mut stdin: W,
    kill: K,
) -> Result<u64, BridgeError>
where
    W: AsyncWrite + Unpin,
    K: FnOnce(),
{
    let RemoteSession {
        mut stdout,
        diagnostics,
        diagnostics_task,
        completion,
        _guard,
    } = session;
    let copied = tokio::io::copy(&mut stdout, &mut stdin).await;

    let outcome = match copied {
        Ok(bytes) => match completion {
            Some(completion) => match completion.await {
                Ok(()) => Ok(bytes),
                Err(message) => Err(BridgeError::Remote(message)),
            },
            None => Ok(bytes),
        },
        Err(e) => Err(BridgeError::Copy(e)),
    };

    let result = match outcome {
        Ok(bytes) => Ok(bytes),
        Err(err) => {
            // Kill before closing stdin so the process never sees a clean
            // end-of-input for a truncated stream.
            kill();
            tracing::warn!(error = %err, "stdin bridge failed; killed local process");
            settle(diagnostics_task).await;
            Err(prefer_diagnostics(&diagnostics, err))
        }
    };
    let _ = stdin.shutdown().await;
    result
}

/// Give the diagnostics task a bounded chance to finish.
async fn settle(task: Option<JoinHandle<()>>) {
    if let Some(task) = task {
        if tokio::time::timeout(DIAGNOSTICS_GRACE, task).await.is_err() {
            tracing::debug!("remote stderr still open; reporting without it");
        }
    }
}

/// Remote stderr, when there is any, says more than the local error.
fn prefer_diagnostics(diagnostics: &Diagnostics, err: BridgeError) -> BridgeError {
    if diagnostics.is_empty() {
        return err;
    }
    let text = diagnostics.text().trim_end().to_string();
    tracing::warn!(diagnostics = %text, "remote exec reported errors");
    BridgeError::Remote(text)
}

#[cfg(test)]
#[path = "bridge_tests.rs"]
mod tests;
