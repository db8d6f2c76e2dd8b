// ABOUTME: External bulk-copy process invocation for export and import
// ABOUTME: Runs rendered command templates through the shell with inherited stdio

use crate::error::TransferError;
use anyhow::Result;
use std::process::{Command, Stdio};

/// A fully rendered external command
///
/// The program and arguments are kept separate from the original command
/// line so they can be inspected without parsing shell syntax.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalCommand {
    pub program: String,
    pub args: Vec<String>,
    /// The rendered template, as written in the config
    pub command_line: String,
}

impl ExternalCommand {
    /// Wrap a shell command line for the current platform
    pub fn shell(command_line: impl Into<String>) -> Self {
        let command_line = command_line.into();
        let (program, flag) = if cfg!(windows) {
            ("cmd", "/C")
        } else {
            ("sh", "-c")
        };
        Self {
            program: program.to_string(),
            args: vec![flag.to_string(), command_line.clone()],
            command_line,
        }
    }

    /// First word of the command line, used for availability checks
    pub fn tool(&self) -> Option<&str> {
        self.command_line.split_whitespace().next()
    }
}

/// Runs external commands to completion
pub trait ProcessRunner {
    /// Run the command, blocking until it exits
    ///
    /// Fails with [`TransferError::ExternalProcess`] when the process cannot
    /// be spawned or exits with a non-zero status.
    fn run(&mut self, command: &ExternalCommand) -> Result<()>;
}

/// Spawns commands with stdin, stdout, and stderr inherited from this process
#[derive(Debug, Default, Clone, Copy)]
pub struct InheritedStdioRunner;

impl ProcessRunner for InheritedStdioRunner {
    fn run(&mut self, command: &ExternalCommand) -> Result<()> {
        if let Some(tool) = command.tool() {
            if which::which(tool).is_err() {
                tracing::warn!(
                    "⚠ '{}' was not found in PATH; the command may fail",
                    crate::utils::sanitize_identifier(tool)
                );
            }
        }

        let status = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|e| {
                tracing::error!("Failed to spawn {}: {}", command.program, e);
                TransferError::ExternalProcess {
                    command: command.command_line.clone(),
                    code: None,
                }
            })?;

        if !status.success() {
            return Err(TransferError::ExternalProcess {
                command: command.command_line.clone(),
                code: status.code(),
            }
            .into());
        }

        Ok(())
    }
}
