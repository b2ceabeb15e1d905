// SPDX-License-Identifier: GPL-3.0-only

use serde::{Deserialize, Serialize};
use thiserror::Error;

use stage1_types::{Architecture, DeviceId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage1ErrorKind {
    InvalidInput,
    NotFound,
    Conflict,
    Unsupported,
    Unavailable,
    Internal,
}

impl Stage1ErrorKind {
    pub fn code(self) -> u16 {
        match self {
            Self::InvalidInput => 400,
            Self::NotFound => 404,
            Self::Conflict => 409,
            Self::Unsupported => 501,
            Self::Unavailable => 503,
            Self::Internal => 500,
        }
    }
}

/// Errors raised while resolving topology, proposing or installing stage1.
///
/// None of these are retried: the topology is a snapshot, so asking again
/// without refreshing it yields the same answer.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "error", rename_all = "snake_case")]
pub enum Stage1Error {
    #[error("device not found in storage inventory: {device}")]
    Lookup { device: DeviceId },

    #[error("unsupported architecture for stage1 placement: {arch}")]
    UnsupportedArchitecture { arch: Architecture },

    #[error("there is no PReP partition to hold stage1")]
    NoBootLocation,

    #[error("invalid installer flags: {reason}")]
    InvalidFlagCombination { reason: String },

    #[error("device stacking cycle detected at {device}")]
    CycleDetected { device: DeviceId },

    #[error("no device is mounted on /")]
    NoRootMount,

    #[error("stage1 store error: {message}")]
    Store { message: String },

    #[error("installer failed: {command}; stderr: {stderr}")]
    Install { command: String, stderr: String },
}

impl Stage1Error {
    pub fn lookup(device: impl Into<DeviceId>) -> Self {
        Self::Lookup {
            device: device.into(),
        }
    }

    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
        }
    }

    pub fn kind(&self) -> Stage1ErrorKind {
        match self {
            Self::Lookup { .. } | Self::NoRootMount => Stage1ErrorKind::NotFound,
            Self::UnsupportedArchitecture { .. } => Stage1ErrorKind::Unsupported,
            Self::NoBootLocation | Self::CycleDetected { .. } => Stage1ErrorKind::Conflict,
            Self::InvalidFlagCombination { .. } => Stage1ErrorKind::InvalidInput,
            Self::Store { .. } => Stage1ErrorKind::Unavailable,
            Self::Install { .. } => Stage1ErrorKind::Internal,
        }
    }
}

pub type Result<T> = std::result::Result<T, Stage1Error>;
