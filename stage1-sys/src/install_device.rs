// SPDX-License-Identifier: GPL-3.0-only

//! Persisted stage1 location in the grub install-device file.
//!
//! The file lists one device per line; the keyword lines `activate` and
//! `generic_mbr` carry the two flags:
//!
//! ```text
//! /dev/disk/by-id/ata-DISK_S1
//! activate
//! generic_mbr
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use stage1_contracts::{Result as Stage1Result, Stage1Store};
use stage1_types::Stage1Config;
use tracing::debug;

use crate::error::{Result, SysError};

pub const DEFAULT_INSTALL_DEVICE_PATH: &str = "/etc/default/grub_installdevice";

const ACTIVATE: &str = "activate";
const GENERIC_MBR: &str = "generic_mbr";

#[derive(Debug, Clone)]
pub struct InstallDeviceFile {
    path: PathBuf,
}

impl Default for InstallDeviceFile {
    fn default() -> Self {
        Self::new(DEFAULT_INSTALL_DEVICE_PATH)
    }
}

impl InstallDeviceFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<Stage1Config> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no install-device file, starting empty");
                return Ok(Stage1Config::default());
            }
            Err(error) => return Err(SysError::path_io(&self.path, error)),
        };
        Ok(parse(&raw))
    }

    fn write(&self, config: &Stage1Config) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|error| SysError::path_io(parent, error))?;
        }
        fs::write(&self.path, render(config)).map_err(|error| SysError::path_io(&self.path, error))
    }
}

pub fn parse(raw: &str) -> Stage1Config {
    let mut config = Stage1Config::default();
    for line in raw.lines().map(str::trim) {
        match line {
            "" => {}
            _ if line.starts_with('#') => {}
            ACTIVATE => config.activate = true,
            GENERIC_MBR => config.generic_boot_code = true,
            device => config.devices.push(device.to_string()),
        }
    }
    config
}

pub fn render(config: &Stage1Config) -> String {
    let mut out = String::new();
    for device in &config.devices {
        out.push_str(device);
        out.push('\n');
    }
    if config.activate {
        out.push_str(ACTIVATE);
        out.push('\n');
    }
    if config.generic_boot_code {
        out.push_str(GENERIC_MBR);
        out.push('\n');
    }
    out
}

impl Stage1Store for InstallDeviceFile {
    fn load(&self) -> Stage1Result<Stage1Config> {
        Ok(self.read()?)
    }

    fn save(&self, config: &Stage1Config) -> Stage1Result<()> {
        self.write(config)?;
        debug!(path = %self.path.display(), ?config, "saved stage1 configuration");
        Ok(())
    }
}
