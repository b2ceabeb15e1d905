// SPDX-License-Identifier: GPL-3.0-only

use std::path::PathBuf;

use stage1_contracts::Stage1Error;
use thiserror::Error;

/// Error types for system-level operations
#[derive(Error, Debug)]
pub enum SysError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("I/O error on {path:?}: {source}")]
    PathIo {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid snapshot '{name}': {reason}")]
    SnapshotInvalid { name: String, reason: String },

    #[error("command not found: {0}")]
    CommandNotFound(String),

    #[error("command failed: {command}; stderr: {stderr}")]
    CommandFailed { command: String, stderr: String },
}

impl SysError {
    pub(crate) fn path_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::PathIo {
            path: path.into(),
            source,
        }
    }
}

impl From<SysError> for Stage1Error {
    fn from(error: SysError) -> Self {
        match error {
            SysError::CommandFailed { command, stderr } => Stage1Error::Install { command, stderr },
            SysError::CommandNotFound(command) => Stage1Error::Install {
                command,
                stderr: "not found in PATH".to_string(),
            },
            other => Stage1Error::store(other.to_string()),
        }
    }
}

/// Result type alias for system operations
pub type Result<T> = std::result::Result<T, SysError>;
