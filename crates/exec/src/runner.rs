// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Generic command runner.
//!
//! A [`GenericCommand`] owns exactly one subprocess. `exec` launches it,
//! drains stdout and stderr on two concurrent tasks, optionally feeds stdin
//! from a remote exec stream, waits for everything to finish and reconciles
//! the failures into one error.
//!
//! All observable state sits behind a single mutex, so the accessors can be
//! called from any task at any time and always see whole lines.

use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};

use nix::sys::signal::Signal;
use nix::unistd::Pid;
use parking_lot::Mutex;
use tokio::io::AsyncRead;
use tokio::process::{Child, Command};
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::mpsc;

use crate::bridge::{self, PodExecParams, RemoteExec};
use crate::collector::{LineSink, OutputCollector, StreamKind};
use crate::env;
use crate::error::{BridgeError, CommandError, SignalError};
use crate::registry::RunRegistry;
use crate::report::Reporter;

/// Fallback poll interval while reaping, in case a SIGCHLD is missed.
const REAP_POLL: Duration = Duration::from_millis(100);

/// Lifecycle of a command invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Started,
    Collecting,
    Terminated,
}

/// Remote source for the subprocess's stdin.
#[derive(Clone)]
pub struct StdinBridge {
    pub exec: Arc<dyn RemoteExec>,
    pub params: PodExecParams,
}

/// Per-invocation options.
#[derive(Clone, Default)]
pub struct CommandOptions {
    /// Echo every output line to the console as it arrives.
    pub print: bool,
    /// Feed stdin from a remote exec stream.
    pub stdin: Option<StdinBridge>,
    /// Live subscriber for output lines of both streams. Optional; not every
    /// command has meaningful realtime output.
    pub output: Option<mpsc::Sender<String>>,
    /// Per-line ceiling for both collectors (default: `RESTASH_MAX_LINE_BYTES`).
    pub max_line_bytes: Option<usize>,
}

impl CommandOptions {
    pub fn print(mut self, print: bool) -> Self {
        self.print = print;
        self
    }

    pub fn stdin_from(mut self, exec: Arc<dyn RemoteExec>, params: PodExecParams) -> Self {
        self.stdin = Some(StdinBridge { exec, params });
        self
    }

    pub fn output(mut self, tx: mpsc::Sender<String>) -> Self {
        self.output = Some(tx);
        self
    }

    pub fn max_line_bytes(mut self, max: usize) -> Self {
        self.max_line_bytes = Some(max);
        self
    }
}

#[derive(Debug)]
struct CommandState {
    phase: Phase,
    stdout: Vec<String>,
    stderr: Vec<String>,
    error: Option<Arc<CommandError>>,
    pid: Option<u32>,
    exited: bool,
}

struct CommandInner {
    program: String,
    slot: String,
    registry: RunRegistry,
    state: Mutex<CommandState>,
}

/// One invocation of an external program plus its I/O plumbing.
///
/// Cloning yields another handle to the same invocation.
#[derive(Clone)]
pub struct GenericCommand {
    inner: Arc<CommandInner>,
}

impl std::fmt::Debug for GenericCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("GenericCommand")
            .field("program", &self.inner.program)
            .field("slot", &self.inner.slot)
            .field("phase", &state.phase)
            .field("pid", &state.pid)
            .finish()
    }
}

impl GenericCommand {
    /// Create a runner for the backup tool binary (see [`env::restic_bin`])
    /// that registers itself in `registry` under `slot` once started.
    pub fn new(registry: RunRegistry, slot: impl Into<String>) -> Self {
        Self::with_program(registry, slot, env::restic_bin())
    }

    /// Create a runner for an arbitrary program.
    pub fn with_program(
        registry: RunRegistry,
        slot: impl Into<String>,
        program: impl Into<String>,
    ) -> Self {
        Self {
            inner: Arc::new(CommandInner {
                program: program.into(),
                slot: slot.into(),
                registry,
                state: Mutex::new(CommandState {
                    phase: Phase::Idle,
                    stdout: Vec::new(),
                    stderr: Vec::new(),
                    error: None,
                    pid: None,
                    exited: false,
                }),
            }),
        }
    }

    pub fn program(&self) -> &str {
        &self.inner.program
    }

    pub fn slot(&self) -> &str {
        &self.inner.slot
    }

    /// Whether both handles refer to the same invocation.
    pub fn same_invocation(&self, other: &GenericCommand) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Run the program with `args` to completion.
    ///
    /// Never fails directly: every failure lands in [`GenericCommand::error`].
    /// A runner executes at most once; later calls are ignored.
    pub async fn exec(&self, args: &[String], options: CommandOptions) {
        {
            let mut state = self.inner.state.lock();
            if state.phase != Phase::Idle {
                tracing::warn!(
                    program = %self.inner.program,
                    slot = %self.inner.slot,
                    phase = ?state.phase,
                    "command already executed; ignoring exec"
                );
                return;
            }
            state.phase = Phase::Started;
        }

        let start = Instant::now();
        self.run(args, options).await;
        self.inner.state.lock().phase = Phase::Terminated;

        let elapsed_ms = start.elapsed().as_millis() as u64;
        match self.error() {
            None => {
                tracing::info!(program = %self.inner.program, elapsed_ms, "command finished");
            }
            Some(e) => {
                tracing::warn!(
                    program = %self.inner.program,
                    elapsed_ms,
                    error = %e,
                    "command failed"
                );
            }
        }
    }

    async fn run(&self, args: &[String], options: CommandOptions) {
        let program = self.inner.program.clone();
        tracing::info!(
            %program,
            ?args,
            slot = %self.inner.slot,
            stdin = options.stdin.is_some(),
            "starting command"
        );

        // Remote stream first: if it cannot be established the subprocess is
        // never spawned.
        let session = match &options.stdin {
            Some(bridge) => match bridge.exec.exec(&bridge.params).await {
                Ok(session) => Some(session),
                Err(e) => {
                    tracing::error!(%program, error = %e, "failed to open remote stdin stream");
                    self.record_error(BridgeError::Establish(e).into());
                    return;
                }
            },
            None => None,
        };

        let mut cmd = Command::new(&program);
        let input = match session {
            Some(_) => Stdio::piped(),
            None => Stdio::null(),
        };
        cmd.args(args)
            .stdin(input)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(source) => {
                tracing::error!(%program, error = %source, "failed to spawn command");
                self.record_error(CommandError::Launch { program, source });
                return;
            }
        };

        let (stdout, stderr) = match (child.stdout.take(), child.stderr.take()) {
            (Some(stdout), Some(stderr)) => (stdout, stderr),
            _ => {
                let _ = child.start_kill();
                let source = std::io::Error::other("output pipes unavailable");
                self.record_error(CommandError::Launch { program, source });
                return;
            }
        };
        let stdin = child.stdin.take();

        let pid = child.id();
        {
            let mut state = self.inner.state.lock();
            state.pid = pid;
            state.phase = Phase::Collecting;
        }
        let registry = &self.inner.registry;
        registry.set_running(&self.inner.slot, self.clone());
        tracing::debug!(%program, ?pid, "command started");

        let bridge_task = match (session, stdin) {
            (Some(session), Some(stdin)) => {
                let this = self.clone();
                Some(tokio::spawn(async move {
                    let killer = this.clone();
                    let pumped = bridge::pump(session, stdin, move || killer.kill()).await;
                    match pumped {
                        Ok(bytes) => tracing::debug!(bytes, "stdin bridge finished"),
                        Err(e) => this.record_error(CommandError::Bridge(e)),
                    }
                }))
            }
            (Some(_), None) => {
                let _ = child.start_kill();
                let source = std::io::Error::other("stdin pipe unavailable");
                self.record_error(CommandError::Launch {
                    program: program.clone(),
                    source,
                });
                None
            }
            _ => None,
        };

        // One task per pipe; each reports its read error (if any) once done.
        let (done_tx, mut done_rx) = mpsc::channel::<(StreamKind, Option<std::io::Error>)>(2);
        let pipes: [(StreamKind, Box<dyn AsyncRead + Send + Unpin>); 2] = [
            (StreamKind::Stdout, Box::new(stdout)),
            (StreamKind::Stderr, Box::new(stderr)),
        ];
        for (kind, reader) in pipes {
            let mut collector = OutputCollector::new(kind)
                .echo(options.print)
                .live(options.output.clone());
            if let Some(max) = options.max_line_bytes {
                collector = collector.max_line_bytes(max);
            }
            let sink = SharedLines {
                command: self.clone(),
                stream: kind,
            };
            let done_tx = done_tx.clone();
            tokio::spawn(async move {
                let collected = collector.collect(reader, sink).await;
                let _ = done_tx.send((kind, collected.error)).await;
            });
        }
        drop(done_tx);

        let mut collect_errors = Vec::new();
        for _ in 0..2 {
            match done_rx.recv().await {
                Some((kind, Some(e))) => collect_errors.push((kind, e)),
                Some((_, None)) => {}
                None => break,
            }
        }

        let waited = self.reap(&mut child).await;

        if let Some(mut task) = bridge_task {
            let drain = env::bridge_drain_timeout();
            if tokio::time::timeout(drain, &mut task).await.is_err() {
                let drain_ms = drain.as_millis() as u64;
                tracing::warn!(%program, drain_ms, "stdin bridge outlived the process; aborting");
                task.abort();
            }
        }

        // First writer wins: bridge and launch failures recorded above stay.
        match waited {
            Ok(status) if status.success() => {}
            Ok(status) => self.record_error(CommandError::Exit {
                program: program.clone(),
                status,
            }),
            Err(source) => self.record_error(CommandError::Wait {
                program: program.clone(),
                source,
            }),
        }
        for (stream, source) in collect_errors {
            self.record_error(CommandError::Collect { stream, source });
        }
    }

    /// Reap `child`, marking the command exited in the same critical section
    /// so `send_signal` never targets a pid the kernel may have recycled.
    async fn reap(&self, child: &mut Child) -> std::io::Result<ExitStatus> {
        let mut sigchld = match signal(SignalKind::child()) {
            Ok(stream) => Some(stream),
            Err(e) => {
                tracing::debug!(error = %e, "no SIGCHLD stream; polling for exit");
                None
            }
        };
        loop {
            {
                let mut state = self.inner.state.lock();
                match child.try_wait() {
                    Ok(Some(status)) => {
                        state.exited = true;
                        return Ok(status);
                    }
                    Ok(None) => {}
                    Err(e) => {
                        state.exited = true;
                        return Err(e);
                    }
                }
            }
            match sigchld.as_mut() {
                Some(stream) => {
                    let _ = tokio::time::timeout(REAP_POLL, stream.recv()).await;
                }
                None => tokio::time::sleep(REAP_POLL).await,
            }
        }
    }

    fn record_error(&self, error: CommandError) {
        let mut state = self.inner.state.lock();
        match &state.error {
            None => state.error = Some(Arc::new(error)),
            Some(existing) => {
                tracing::debug!(kept = %existing, dropped = %error, "error already recorded")
            }
        }
    }

    fn kill(&self) {
        if let Err(e) = self.send_signal(Signal::SIGKILL) {
            tracing::debug!(error = %e, "kill skipped");
        }
    }

    /// Snapshot of stdout lines collected so far.
    pub fn stdout(&self) -> Vec<String> {
        self.inner.state.lock().stdout.clone()
    }

    /// Snapshot of stderr lines collected so far.
    pub fn stderr(&self) -> Vec<String> {
        self.inner.state.lock().stderr.clone()
    }

    /// The recorded failure, if any.
    pub fn error(&self) -> Option<Arc<CommandError>> {
        self.inner.state.lock().error.clone()
    }

    pub fn phase(&self) -> Phase {
        self.inner.state.lock().phase
    }

    /// Pid of the subprocess once started.
    pub fn pid(&self) -> Option<u32> {
        self.inner.state.lock().pid
    }

    /// Deliver `signal` to the running subprocess.
    pub fn send_signal(&self, signal: Signal) -> Result<(), SignalError> {
        // Held across kill(2) so the process cannot be marked reaped mid-call.
        let state = self.inner.state.lock();
        let pid = state.pid.ok_or(SignalError::NotStarted)?;
        if state.exited {
            return Err(SignalError::Exited { pid });
        }
        tracing::info!(pid, %signal, program = %self.inner.program, "signalling command");
        nix::sys::signal::kill(Pid::from_raw(pid as i32), signal)
            .map_err(|source| SignalError::Os { pid, source })
    }
}

impl Reporter for GenericCommand {}

/// Appends collected lines straight into the command's shared state.
struct SharedLines {
    command: GenericCommand,
    stream: StreamKind,
}

impl LineSink for SharedLines {
    fn push_line(&mut self, line: String) {
        let mut state = self.command.inner.state.lock();
        match self.stream {
            StreamKind::Stdout => state.stdout.push(line),
            StreamKind::Stderr => state.stderr.push(line),
        }
    }
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
