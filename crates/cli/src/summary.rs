// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Run summary — the `restash run` report built on top of a finished command.

use prometheus::core::Collector;
use prometheus::{IntGaugeVec, Opts};
use restash_exec::{GenericCommand, Reporter};
use serde::Serialize;

/// Webhook payload describing one finished run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunPayload {
    pub slot: String,
    pub program: String,
    pub args: Vec<String>,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub stdout_lines: usize,
    pub stderr_lines: usize,
}

/// Reports a finished [`GenericCommand`].
pub struct RunSummary<'a> {
    command: &'a GenericCommand,
    args: &'a [String],
}

impl<'a> RunSummary<'a> {
    pub fn new(command: &'a GenericCommand, args: &'a [String]) -> Self {
        Self { command, args }
    }

    pub fn payload(&self) -> RunPayload {
        let error = self.command.error().map(|e| e.to_string());
        RunPayload {
            slot: self.command.slot().to_string(),
            program: self.command.program().to_string(),
            args: self.args.to_vec(),
            success: error.is_none(),
            error,
            stdout_lines: self.command.stdout().len(),
            stderr_lines: self.command.stderr().len(),
        }
    }
}

impl Reporter for RunSummary<'_> {
    fn webhook_payloads(&self) -> Vec<serde_json::Value> {
        match serde_json::to_value(self.payload()) {
            Ok(value) => vec![value],
            Err(e) => {
                tracing::warn!(error = %e, "failed to serialize run payload");
                Vec::new()
            }
        }
    }

    fn metric_collectors(&self) -> Vec<Box<dyn Collector>> {
        let opts = Opts::new(
            "restash_output_lines",
            "Output lines captured from the last run",
        );
        let gauge = match IntGaugeVec::new(opts, &["slot", "stream"]) {
            Ok(gauge) => gauge,
            Err(e) => {
                tracing::warn!(error = %e, "failed to build output line gauge");
                return Vec::new();
            }
        };
        let payload = self.payload();
        let slot = payload.slot.as_str();
        gauge
            .with_label_values(&[slot, "stdout"])
            .set(payload.stdout_lines as i64);
        gauge
            .with_label_values(&[slot, "stderr"])
            .set(payload.stderr_lines as i64);
        vec![Box::new(gauge)]
    }
}

#[cfg(test)]
#[path = "summary_tests.rs"]
mod tests;
