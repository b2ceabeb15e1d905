// SPDX-License-Identifier: GPL-3.0-only

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use stage1_sys::install_device::DEFAULT_INSTALL_DEVICE_PATH;
use stage1_sys::udev::DEFAULT_UDEV_ROOT;
use stage1_types::Architecture;

pub const DEFAULT_CONFIG_PATH: &str = "/etc/stage1/config.toml";

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, Eq, PartialEq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum LoggingLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LoggingLevel {
    pub fn as_directive(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }

    /// Level raised by `steps` (one per `-v`), saturating at trace.
    pub fn raised(self, steps: u8) -> Self {
        (0..steps).fold(self, |level, _| match level {
            Self::Error => Self::Warn,
            Self::Warn => Self::Info,
            Self::Info => Self::Debug,
            Self::Debug | Self::Trace => Self::Trace,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
#[serde(default)]
pub struct Config {
    pub log_level: LoggingLevel,
    /// Append logs to this file in addition to stderr
    pub log_file: Option<PathBuf>,
    /// Topology snapshot describing the storage of this system
    pub snapshot: Option<PathBuf>,
    pub install_device_file: PathBuf,
    pub udev_root: PathBuf,
    /// Detected from the running system when unset
    pub arch: Option<Architecture>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: LoggingLevel::Info,
            log_file: None,
            snapshot: None,
            install_device_file: PathBuf::from(DEFAULT_INSTALL_DEVICE_PATH),
            udev_root: PathBuf::from(DEFAULT_UDEV_ROOT),
            arch: None,
        }
    }
}

impl Config {
    /// Load `path`, or the default location when it exists.
    ///
    /// An explicitly given file must exist; a missing default file yields
    /// the built-in defaults.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let path = match path {
            Some(path) => path,
            None => {
                let default = Path::new(DEFAULT_CONFIG_PATH);
                if !default.exists() {
                    return Ok(Self::default());
                }
                default
            }
        };

        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_toml_str(&raw).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn from_toml_str(raw: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(raw)?)
    }
}
