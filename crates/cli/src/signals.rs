// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Forwarding of termination signals to the running backup tool.

use std::future::Future;

use anyhow::Result;
use restash_exec::{RunRegistry, Signal};
use tokio::signal::unix::{signal, SignalKind};

/// Drive `fut` to completion, forwarding SIGINT/SIGTERM received by this
/// process to whatever command is registered in `slot`.
pub async fn forward_while<F>(registry: &RunRegistry, slot: &str, fut: F) -> Result<F::Output>
where
    F: Future,
{
    let mut terminate = signal(SignalKind::terminate())?;
    let mut interrupt = signal(SignalKind::interrupt())?;
    tokio::pin!(fut);

    loop {
        tokio::select! {
            output = &mut fut => return Ok(output),
            Some(()) = terminate.recv() => forward(registry, slot, Signal::SIGTERM),
            Some(()) = interrupt.recv() => forward(registry, slot, Signal::SIGINT),
        }
    }
}

fn forward(registry: &RunRegistry, slot: &str, signal: Signal) {
    match registry.signal(slot, signal) {
        Ok(()) => tracing::info!(%slot, %signal, "forwarded signal"),
        Err(e) => tracing::warn!(%slot, %signal, error = %e, "could not forward signal"),
    }
}
