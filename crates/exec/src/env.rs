// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the exec crate.

use std::time::Duration;

/// Default per-line ceiling for output collection (64 MiB).
pub const DEFAULT_MAX_LINE_BYTES: usize = 64 * 1024 * 1024;

/// Backup tool binary: RESTIC_BINARY > `restic` on PATH
pub fn restic_bin() -> String {
    std::env::var("RESTIC_BINARY")
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "restic".to_string())
}

/// Longest single output line the collectors accept before failing the read.
pub fn max_line_bytes() -> usize {
    std::env::var("RESTASH_MAX_LINE_BYTES")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .filter(|n| *n > 0)
        .unwrap_or(DEFAULT_MAX_LINE_BYTES)
}

/// How long the stdin bridge may keep running once the subprocess has exited
/// (default 5s, configurable via `RESTASH_BRIDGE_DRAIN_MS`).
pub fn bridge_drain_timeout() -> Duration {
    std::env::var("RESTASH_BRIDGE_DRAIN_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(5))
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
