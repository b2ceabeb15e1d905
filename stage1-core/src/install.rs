// SPDX-License-Identifier: GPL-3.0-only

//! Installer invocation plan
//!
//! Validates platform and flags before anything is executed, then runs the
//! installer once per stage1 device.

use stage1_contracts::{BootInstaller, Result, Stage1Error};
use stage1_types::{Architecture, DeviceId};
use tracing::info;

/// Bootloader target platform string for `arch`.
pub fn target_platform(arch: Architecture) -> Result<&'static str> {
    match arch {
        Architecture::X86Bios => Ok("i386-pc"),
        Architecture::X86Efi => Ok("x86_64-efi"),
        Architecture::I386Efi => Ok("i386-efi"),
        Architecture::Ppc | Architecture::PpcPowernv => Ok("powerpc-ieee1275"),
        Architecture::S390 => Ok("s390x-emu"),
        Architecture::Aarch64Efi => Ok("arm64-efi"),
        Architecture::Unsupported => Err(Stage1Error::UnsupportedArchitecture { arch }),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallPlan {
    target: &'static str,
    efi: bool,
    secure_boot: bool,
    trusted_boot: bool,
}

impl InstallPlan {
    pub fn new(arch: Architecture, secure_boot: bool, trusted_boot: bool) -> Result<Self> {
        let efi = arch.is_efi();
        if secure_boot && !efi {
            return Err(Stage1Error::InvalidFlagCombination {
                reason: "cannot have secure boot without EFI".to_string(),
            });
        }
        if trusted_boot && efi {
            return Err(Stage1Error::InvalidFlagCombination {
                reason: "cannot have trusted boot with EFI".to_string(),
            });
        }

        Ok(Self {
            target: target_platform(arch)?,
            efi,
            secure_boot,
            trusted_boot,
        })
    }

    pub fn target(&self) -> &'static str {
        self.target
    }

    pub fn efi(&self) -> bool {
        self.efi
    }

    pub fn secure_boot(&self) -> bool {
        self.secure_boot
    }

    pub fn trusted_boot(&self) -> bool {
        self.trusted_boot
    }

    /// Run the installer for each device, or once without a device when
    /// there is none (s390, EFI). Returns the number of invocations.
    pub fn run(&self, installer: &dyn BootInstaller, devices: &[DeviceId]) -> Result<usize> {
        if devices.is_empty() {
            info!(platform = self.target, "installing stage1 to the default location");
            installer.install(self.target, None, self.secure_boot, self.trusted_boot)?;
            return Ok(1);
        }

        for device in devices {
            info!(platform = self.target, device = %device, "installing stage1");
            installer.install(
                self.target,
                Some(device.as_str()),
                self.secure_boot,
                self.trusted_boot,
            )?;
        }
        Ok(devices.len())
    }
}
