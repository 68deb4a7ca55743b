// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Adapters connecting the restash exec engine to external systems.
//!
//! - [`pod_exec`] — Kubernetes pod exec as the remote stdin source

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod pod_exec;

pub use pod_exec::KubePodExec;
