// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::builder::styling::{Ansi256Color, Color, Style, Styles};
use std::io::IsTerminal;

pub mod codes {
    /// Section headers: steel blue
    pub const HEADER: u8 = 74;
    /// Commands and literals: light grey
    pub const LITERAL: u8 = 250;
    /// Placeholders and context: medium grey
    pub const CONTEXT: u8 = 245;
    /// Failures: soft red
    pub const ERROR: u8 = 167;
}

/// Determine if color output should be enabled for `stream`.
///
/// Priority: `NO_COLOR=1` disables → `COLOR=1` forces → TTY check.
fn colorize_for(is_terminal: bool) -> bool {
    if std::env::var("NO_COLOR").is_ok_and(|v| v == "1") {
        return false;
    }
    if std::env::var("COLOR").is_ok_and(|v| v == "1") {
        return true;
    }
    is_terminal
}

/// Whether stdout output should be colored.
pub fn should_colorize() -> bool {
    colorize_for(std::io::stdout().is_terminal())
}

/// Whether stderr output should be colored.
pub fn should_colorize_stderr() -> bool {
    colorize_for(std::io::stderr().is_terminal())
}

/// Build clap `Styles` using the project palette.
pub fn styles() -> Styles {
    if !should_colorize() {
        return Styles::plain();
    }
    Styles::styled()
        .header(Style::new().fg_color(Some(Color::Ansi256(Ansi256Color(codes::HEADER)))))
        .literal(Style::new().fg_color(Some(Color::Ansi256(Ansi256Color(codes::LITERAL)))))
        .placeholder(Style::new().fg_color(Some(Color::Ansi256(Ansi256Color(codes::CONTEXT)))))
}

fn fg256(code: u8) -> String {
    format!("\x1b[38;5;{code}m")
}

const RESET: &str = "\x1b[0m";

/// Format an error label for stderr.
pub fn error(text: &str) -> String {
    if should_colorize_stderr() {
        format!("{}{}{}", fg256(codes::ERROR), text, RESET)
    } else {
        text.to_string()
    }
}

/// Format subprocess stderr lines relayed to our stderr.
pub fn context(text: &str) -> String {
    if should_colorize_stderr() {
        format!("{}{}{}", fg256(codes::CONTEXT), text, RESET)
    } else {
        text.to_string()
    }
}

#[cfg(test)]
#[path = "color_tests.rs"]
mod tests;
