// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Generic command execution engine for restash.
//!
//! # Module layout
//!
//! - [`collector`] — line-oriented draining of one output stream
//! - [`bridge`] — remote exec stream copied into a subprocess's stdin
//! - [`runner`] — [`GenericCommand`], one subprocess and its I/O plumbing
//! - [`registry`] — per-slot lookup of the running command for signal routing
//! - [`report`] — webhook / metrics extension points
//! - [`env`] — environment-driven configuration

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod bridge;
pub mod collector;
pub mod env;
mod error;
pub mod registry;
pub mod report;
pub mod runner;

#[cfg(any(test, feature = "test-support"))]
pub mod fake;

pub use bridge::{Diagnostics, PodExecParams, RemoteCompletion, RemoteExec, RemoteSession};
pub use collector::{Collected, LineSink, OutputCollector, StreamKind};
pub use error::{BridgeError, CommandError, RemoteExecError, SignalError};
pub use registry::RunRegistry;
pub use report::Reporter;
pub use runner::{CommandOptions, GenericCommand, Phase, StdinBridge};

pub use nix::sys::signal::Signal;
