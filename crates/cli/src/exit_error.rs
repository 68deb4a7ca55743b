// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Custom error type that carries a process exit code.
//!
//! Commands return `ExitError` instead of calling `std::process::exit()`
//! directly, allowing `main()` to handle process termination.

use std::fmt;

use restash_exec::CommandError;

#[derive(Debug)]
pub struct ExitError {
    pub code: i32,
    pub message: String,
}

impl ExitError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Mirror a failed command: its own exit code, 128 + signal when it was
    /// killed, 1 for everything else.
    pub fn from_command(err: &CommandError) -> Self {
        use std::os::unix::process::ExitStatusExt;

        let code = match err {
            CommandError::Exit { status, .. } => match status.code() {
                Some(code) => code,
                None => status.signal().map_or(1, |s| 128 + s),
            },
            _ => 1,
        };
        Self::new(code, err.to_string())
    }
}

impl fmt::Display for ExitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ExitError {}

#[cfg(test)]
#[path = "exit_error_tests.rs"]
mod tests;
