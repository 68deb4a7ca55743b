// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Test doubles for the remote exec collaborator and for flaky streams.

#![cfg_attr(coverage_nightly, coverage(off))]

use std::collections::VecDeque;
use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::io::{AsyncRead, ReadBuf};

use crate::bridge::{Diagnostics, PodExecParams, RemoteExec, RemoteSession};
use crate::error::RemoteExecError;

/// One step of a [`ScriptedReader`].
#[derive(Debug, Clone)]
pub enum ReadStep {
    Data(Vec<u8>),
    Fail(io::ErrorKind, String),
}

/// Reader that replays a fixed script of chunks and failures, then reports
/// end-of-stream.
#[derive(Debug, Default)]
pub struct ScriptedReader {
    steps: VecDeque<ReadStep>,
    pending: Vec<u8>,
}

impl ScriptedReader {
    pub fn new(steps: impl IntoIterator<Item = ReadStep>) -> Self {
        Self {
            steps: steps.into_iter().collect(),
            pending: Vec::new(),
        }
    }

    /// Yields `data`, then fails with `message`.
    pub fn failing_after(data: &[u8], message: &str) -> Self {
        Self::new([
            ReadStep::Data(data.to_vec()),
            ReadStep::Fail(io::ErrorKind::ConnectionReset, message.to_string()),
        ])
    }
}

impl AsyncRead for ScriptedReader {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = &mut *self;
        while this.pending.is_empty() {
            match this.steps.pop_front() {
                None => return Poll::Ready(Ok(())),
                Some(ReadStep::Fail(kind, message)) => {
                    return Poll::Ready(Err(io::Error::new(kind, message)));
                }
                Some(ReadStep::Data(data)) => this.pending = data,
            }
        }
        let n = this.pending.len().min(buf.remaining());
        buf.put_slice(&this.pending[..n]);
        this.pending.drain(..n);
        Poll::Ready(Ok(()))
    }
}

#[derive(Debug, Clone, Default)]
struct FakeStream {
    steps: Vec<ReadStep>,
    diagnostics: String,
    remote_failure: Option<String>,
}

#[derive(Debug, Clone)]
enum FakeOutcome {
    Stream(FakeStream),
    Refuse(String),
}

/// Fake [`RemoteExec`] that records every request and serves a scripted
/// stream.
#[derive(Clone)]
pub struct FakeRemoteExec {
    outcome: FakeOutcome,
    calls: Arc<Mutex<Vec<PodExecParams>>>,
}

impl FakeRemoteExec {
    fn with_outcome(outcome: FakeOutcome) -> Self {
        Self {
            outcome,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Serve `data` on the remote stdout, then end the stream.
    pub fn streaming(data: &[u8]) -> Self {
        Self::scripted([ReadStep::Data(data.to_vec())])
    }

    pub fn scripted(steps: impl IntoIterator<Item = ReadStep>) -> Self {
        Self::with_outcome(FakeOutcome::Stream(FakeStream {
            steps: steps.into_iter().collect(),
            ..FakeStream::default()
        }))
    }

    /// Fail to establish the session with `message`.
    pub fn refusing(message: &str) -> Self {
        Self::with_outcome(FakeOutcome::Refuse(message.to_string()))
    }

    /// Pre-fill the session's diagnostics buffer, as if the remote command
    /// had written to its stderr.
    pub fn with_diagnostics(mut self, text: &str) -> Self {
        if let FakeOutcome::Stream(stream) = &mut self.outcome {
            stream.diagnostics = text.to_string();
        }
        self
    }

    /// Report the remote command as failed with `message` once its stream
    /// has ended.
    pub fn failing_remotely(mut self, message: &str) -> Self {
        if let FakeOutcome::Stream(stream) = &mut self.outcome {
            stream.remote_failure = Some(message.to_string());
        }
        self
    }

    /// All requests received so far
    pub fn calls(&self) -> Vec<PodExecParams> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl RemoteExec for FakeRemoteExec {
    async fn exec(&self, params: &PodExecParams) -> Result<RemoteSession, RemoteExecError> {
        self.calls.lock().push(params.clone());
        let stream = match &self.outcome {
            FakeOutcome::Refuse(message) => {
                return Err(RemoteExecError::Connect(message.clone()));
            }
            FakeOutcome::Stream(stream) => stream.clone(),
        };

        let diagnostics = Diagnostics::default();
        diagnostics.append(stream.diagnostics.as_bytes());
        let reader = ScriptedReader::new(stream.steps);
        let session = RemoteSession::new(reader, diagnostics);
        Ok(match stream.remote_failure {
            Some(message) => session.with_completion(async move { Err(message) }),
            None => session,
        })
    }
}
