//! ui::prompts
//!
//! Interactive confirmations.
//!
//! # Design
//!
//! Prompts are only shown in interactive mode. In non-interactive mode,
//! commands that ask for confirmation must be given `--yes` or fail with a
//! clear error message.

use std::io::{self, BufRead, IsTerminal, Write};

use thiserror::Error;

/// Errors from prompts.
#[derive(Debug, Error)]
pub enum PromptError {
    #[error("prompt cancelled by user")]
    Cancelled,

    #[error("not in interactive mode; pass --yes to confirm")]
    NotInteractive,

    #[error("IO error: {0}")]
    IoError(String),
}

/// Whether stdin is attached to a terminal.
pub fn is_interactive() -> bool {
    io::stdin().is_terminal()
}

/// Prompt for confirmation (yes/no).
///
/// Returns `Ok(true)` if the user confirms, `Ok(false)` if they decline.
/// An empty answer takes `default`.
/// Returns `Err(PromptError::NotInteractive)` if not in interactive mode.
pub fn confirm(message: &str, default: bool, interactive: bool) -> Result<bool, PromptError> {
    if !interactive {
        return Err(PromptError::NotInteractive);
    }

    let hint = if default { "[Y/n]" } else { "[y/N]" };
    let mut stderr = io::stderr();
    write!(stderr, "{} {} ", message, hint).map_err(|e| PromptError::IoError(e.to_string()))?;
    stderr.flush().map_err(|e| PromptError::IoError(e.to_string()))?;

    read_confirm(&mut io::stdin().lock(), default)
}

/// Read one yes/no answer from `input`. An empty answer takes `default`.
pub fn read_confirm<R: BufRead>(input: &mut R, default: bool) -> Result<bool, PromptError> {
    let mut line = String::new();
    let read = input
        .read_line(&mut line)
        .map_err(|e| PromptError::IoError(e.to_string()))?;
    if read == 0 {
        return Err(PromptError::Cancelled);
    }

    Ok(parse_answer(&line).unwrap_or(default))
}

/// Interpret a yes/no answer. Anything unrecognised is `None`.
fn parse_answer(line: &str) -> Option<bool> {
    match line.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}
