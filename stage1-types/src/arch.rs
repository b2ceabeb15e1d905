//! Platform architecture context

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Platform the bootloader is installed for.
///
/// Resolved once per session and passed explicitly to the placement policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Architecture {
    X86Bios,
    X86Efi,
    /// 32-bit x86 firmware on UEFI
    I386Efi,
    Ppc,
    /// OpenPOWER bare metal, boots via petitboot without a PReP partition
    PpcPowernv,
    S390,
    Aarch64Efi,
    Unsupported,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown architecture '{0}'")]
pub struct ParseArchitectureError(pub String);

impl Architecture {
    pub const ALL: [Architecture; 8] = [
        Self::X86Bios,
        Self::X86Efi,
        Self::I386Efi,
        Self::Ppc,
        Self::PpcPowernv,
        Self::S390,
        Self::Aarch64Efi,
        Self::Unsupported,
    ];

    pub fn is_efi(self) -> bool {
        matches!(self, Self::X86Efi | Self::I386Efi | Self::Aarch64Efi)
    }

    pub fn is_x86(self) -> bool {
        matches!(self, Self::X86Bios | Self::X86Efi | Self::I386Efi)
    }

    pub fn is_ppc(self) -> bool {
        matches!(self, Self::Ppc | Self::PpcPowernv)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::X86Bios => "x86_bios",
            Self::X86Efi => "x86_efi",
            Self::I386Efi => "i386_efi",
            Self::Ppc => "ppc",
            Self::PpcPowernv => "ppc_powernv",
            Self::S390 => "s390",
            Self::Aarch64Efi => "aarch64_efi",
            Self::Unsupported => "unsupported",
        }
    }
}

impl FromStr for Architecture {
    type Err = ParseArchitectureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|arch| arch.as_str() == normalized)
            .ok_or_else(|| ParseArchitectureError(s.to_string()))
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
