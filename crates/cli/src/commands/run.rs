// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `restash run` — run the backup tool once in a named slot.

use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use prometheus::{Encoder, TextEncoder};
use restash_adapters::KubePodExec;
use restash_exec::report::register_metrics;
use restash_exec::{CommandOptions, GenericCommand, PodExecParams, Reporter, RunRegistry};
use tokio::sync::mpsc;

use crate::color;
use crate::exit_error::ExitError;
use crate::signals;
use crate::summary::RunSummary;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Slot the run is registered under for signal routing
    #[arg(long, default_value = "default")]
    pub slot: String,

    /// Echo output lines live as they are read
    #[arg(long)]
    pub print: bool,

    /// Relay every output line to stderr as it arrives
    #[arg(long, short)]
    pub follow: bool,

    /// Executable to run instead of `$RESTIC_BINARY`
    #[arg(long, value_name = "PATH")]
    pub program: Option<String>,

    /// Pod whose command output feeds the tool's stdin
    #[arg(long, value_name = "POD", requires = "stdin_command")]
    pub stdin_pod: Option<String>,

    /// Namespace of the stdin pod (default: `$RESTASH_K8S_NAMESPACE`)
    #[arg(long, value_name = "NS", requires = "stdin_pod")]
    pub stdin_namespace: Option<String>,

    /// Container within the stdin pod
    #[arg(long, value_name = "NAME", requires = "stdin_pod")]
    pub stdin_container: Option<String>,

    /// Shell command run in the pod (via `sh -c`)
    #[arg(long, value_name = "CMD", requires = "stdin_pod")]
    pub stdin_command: Option<String>,

    /// Print the run's webhook payloads as JSON
    #[arg(long)]
    pub report: bool,

    /// Print the run's metrics in prometheus text format
    #[arg(long)]
    pub metrics: bool,

    /// Arguments passed to the tool verbatim
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

impl RunArgs {
    pub(crate) fn pod_params(&self) -> Option<PodExecParams> {
        let pod = self.stdin_pod.clone()?;
        let script = self.stdin_command.clone()?;
        let namespace = self.stdin_namespace.clone();
        Some(PodExecParams {
            namespace: namespace.unwrap_or_else(KubePodExec::default_namespace),
            pod,
            container: self.stdin_container.clone(),
            command: vec!["sh".to_string(), "-c".to_string(), script],
        })
    }
}

pub async fn handle(args: RunArgs) -> Result<()> {
    let registry = RunRegistry::new();
    let command = match &args.program {
        Some(program) => GenericCommand::with_program(registry.clone(), &args.slot, program),
        None => GenericCommand::new(registry.clone(), &args.slot),
    };

    let mut options = CommandOptions::default().print(args.print);
    if let Some(params) = args.pod_params() {
        let remote = KubePodExec::try_default().await?;
        options = options.stdin_from(Arc::new(remote), params);
    }

    let relay = if args.follow {
        let (tx, mut rx) = mpsc::channel::<String>(256);
        options = options.output(tx);
        Some(tokio::spawn(async move {
            while let Some(line) = rx.recv().await {
                eprintln!("{}", color::context(&line));
            }
        }))
    } else {
        None
    };

    tracing::info!(slot = %args.slot, program = %command.program(), "starting run");
    let exec = command.exec(&args.args, options);
    signals::forward_while(&registry, &args.slot, exec).await?;
    if let Some(relay) = relay {
        let _ = relay.await;
    }

    if !args.print {
        print_captured(&command)?;
    }

    let summary = RunSummary::new(&command, &args.args);
    if args.report {
        let mut out = std::io::stdout().lock();
        for payload in summary.webhook_payloads() {
            writeln!(out, "{}", serde_json::to_string(&payload)?)?;
        }
    }
    if args.metrics {
        print!("{}", metrics_text(&summary)?);
    }

    match command.error() {
        Some(err) => Err(ExitError::from_command(&err).into()),
        None => Ok(()),
    }
}

fn print_captured(command: &GenericCommand) -> Result<()> {
    let mut out = std::io::stdout().lock();
    for line in command.stdout() {
        writeln!(out, "{line}")?;
    }
    out.flush()?;
    for line in command.stderr() {
        eprintln!("{}", color::context(&line));
    }
    Ok(())
}

pub(crate) fn metrics_text<R: Reporter + ?Sized>(reporter: &R) -> Result<String> {
    let registry = prometheus::Registry::new();
    register_metrics(reporter, &registry)
        .context("registering run metrics")?;
    let mut buf = Vec::new();
    TextEncoder::new().encode(&registry.gather(), &mut buf)?;
    Ok(String::from_utf8(buf)?)
}

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;
