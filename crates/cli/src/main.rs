// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! restash - runs the backup tool and captures its output

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod color;
mod commands;
mod exit_error;
mod logging;
mod signals;
mod summary;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};

use crate::exit_error::ExitError;

const VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("RESTASH_BUILD_HASH"),
    ")"
);

#[derive(Parser)]
#[command(name = "restash", version = VERSION, styles = color::styles())]
#[command(about = "Run the backup tool and capture its output")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the backup tool once with the given arguments
    Run(commands::run::RunArgs),
}

#[tokio::main]
async fn main() {
    logging::init();

    if let Err(e) = run().await {
        match e.downcast_ref::<ExitError>() {
            Some(exit) => {
                eprintln!("{} {}", color::error("error:"), exit.message);
                std::process::exit(exit.code);
            }
            None => {
                eprintln!("{} {:#}", color::error("error:"), e);
                std::process::exit(1);
            }
        }
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Some(Commands::Run(args)) => commands::run::handle(args).await,
        None => {
            Cli::command().print_help()?;
            println!();
            Ok(())
        }
    }
}
