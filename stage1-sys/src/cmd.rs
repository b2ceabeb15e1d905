// SPDX-License-Identifier: GPL-3.0-only

use std::fmt;
use std::process::Command;

use tracing::{debug, warn};

use crate::error::{Result, SysError};

/// A program plus arguments, rendered as one shell-like line for logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub program: &'static str,
    pub args: Vec<String>,
}

impl CommandLine {
    pub fn new(program: &'static str) -> Self {
        Self {
            program,
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Run the command, or only record it when `dry_run` is set.
    pub fn execute(&self, dry_run: bool) -> Result<CommandOutcome> {
        let rendered = self.to_string();
        if dry_run {
            debug!(command = %rendered, "dry run, not executing");
            return Ok(CommandOutcome::skipped(rendered));
        }

        which::which(self.program)
            .map_err(|_| SysError::CommandNotFound(self.program.to_string()))?;

        let output = Command::new(self.program)
            .args(&self.args)
            .output()
            .map_err(|error| SysError::CommandFailed {
                command: rendered.clone(),
                stderr: error.to_string(),
            })?;

        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        if !output.status.success() {
            warn!(command = %rendered, status = ?output.status.code(), "command failed");
            return Err(SysError::CommandFailed {
                command: rendered,
                stderr,
            });
        }

        Ok(CommandOutcome {
            command: rendered,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr,
            executed: true,
        })
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutcome {
    pub command: String,
    pub stdout: String,
    pub stderr: String,
    pub executed: bool,
}

impl CommandOutcome {
    fn skipped(command: String) -> Self {
        Self {
            command,
            stdout: String::new(),
            stderr: String::new(),
            executed: false,
        }
    }
}
