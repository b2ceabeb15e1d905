//! Stage1 placement data

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::DeviceId;

/// Persisted shape of the stage1 model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stage1Config {
    /// Install targets, in installer invocation order
    pub devices: Vec<DeviceId>,

    /// Set the bootable flag on the target partition
    pub activate: bool,

    /// Write a generic boot stub into the MBR
    pub generic_boot_code: bool,
}

/// Symbolic stage1 location chosen by the policy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Location {
    Mbr,
    Boot,
    Root,
    Extended,
    /// A device taken verbatim, e.g. a PReP partition
    Custom(DeviceId),
    /// No stage1 is written
    None,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mbr => f.write_str("mbr"),
            Self::Boot => f.write_str("boot"),
            Self::Root => f.write_str("root"),
            Self::Extended => f.write_str("extended"),
            Self::Custom(device) => write!(f, "custom({device})"),
            Self::None => f.write_str("none"),
        }
    }
}

/// Complete outcome of one proposal branch, applied to the model in one step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub location: Location,
    pub devices: Vec<DeviceId>,
    pub activate: bool,
    pub generic_boot_code: bool,
}

impl Proposal {
    /// A proposal that writes nothing and touches no flags.
    pub fn none() -> Self {
        Self {
            location: Location::None,
            devices: Vec::new(),
            activate: false,
            generic_boot_code: false,
        }
    }

    pub fn into_config(self) -> Stage1Config {
        Stage1Config {
            devices: self.devices,
            activate: self.activate,
            generic_boot_code: self.generic_boot_code,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_roundtrips_through_toml() {
        let config = Stage1Config {
            devices: vec!["/dev/disk/by-id/ata-disk".to_string()],
            activate: true,
            generic_boot_code: false,
        };
        let raw = toml::to_string(&config).expect("serialize config");
        let parsed: Stage1Config = toml::from_str(&raw).expect("deserialize config");
        assert_eq!(parsed, config);
    }

    #[test]
    fn empty_proposal_clears_flags() {
        let config = Proposal::none().into_config();
        assert_eq!(config, Stage1Config::default());
    }

    #[test]
    fn location_display() {
        assert_eq!(Location::Extended.to_string(), "extended");
        assert_eq!(
            Location::Custom("/dev/sda1".to_string()).to_string(),
            "custom(/dev/sda1)"
        );
    }
}
