// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reporting extension points.
//!
//! The engine never interprets or transmits these; commands built on top of
//! [`crate::GenericCommand`] override them to expose their results.

use prometheus::core::Collector;

/// Webhook payloads and metrics a command wants to publish.
pub trait Reporter {
    /// Objects to serialize as JSON and send to the webhook endpoint.
    fn webhook_payloads(&self) -> Vec<serde_json::Value> {
        Vec::new()
    }

    /// Collectors to push to the metrics gateway.
    fn metric_collectors(&self) -> Vec<Box<dyn Collector>> {
        Vec::new()
    }
}

/// Register every collector of `reporter` with `registry`.
///
/// Returns how many collectors were registered.
pub fn register_metrics<R>(
    reporter: &R,
    registry: &prometheus::Registry,
) -> prometheus::Result<usize>
where
    R: Reporter + ?Sized,
{
    let collectors = reporter.metric_collectors();
    let count = collectors.len();
    for collector in collectors {
        registry.register(collector)?;
    }
    Ok(count)
}

#[cfg(test)]
#[path = "report_tests.rs"]
mod tests;
