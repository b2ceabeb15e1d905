// SPDX-License-Identifier: GPL-3.0-only

//! Architecture detection for the running system.
//!
//! Only the command line front end calls this; the placement policy always
//! receives the architecture as a value.

use std::path::Path;

use procfs::{CpuInfo, Current};
use stage1_types::Architecture;
use tracing::{debug, warn};

const EFI_FIRMWARE_DIR: &str = "/sys/firmware/efi";

pub fn detect_architecture() -> Architecture {
    let machine = std::env::consts::ARCH;
    let efi = Path::new(EFI_FIRMWARE_DIR).exists();

    // Only PowerPC needs the platform line.
    let cpuinfo = if is_powerpc(machine) {
        match CpuInfo::current() {
            Ok(info) => Some(info),
            Err(error) => {
                warn!(%error, "cannot read cpuinfo, assuming a non-PowerNV platform");
                None
            }
        }
    } else {
        None
    };

    let platform = cpuinfo.as_ref().and_then(platform_field);
    let arch = classify(machine, efi, platform);
    debug!(machine, efi, ?platform, %arch, "detected architecture");
    arch
}

/// Map a machine name plus firmware facts to an architecture.
///
/// `platform` is the cpuinfo `platform` value, if any.
pub fn classify(machine: &str, efi: bool, platform: Option<&str>) -> Architecture {
    match machine {
        "x86_64" if efi => Architecture::X86Efi,
        "x86" | "i386" | "i586" | "i686" if efi => Architecture::I386Efi,
        "x86" | "x86_64" | "i386" | "i586" | "i686" => Architecture::X86Bios,
        machine if is_powerpc(machine) => {
            if platform.is_some_and(|p| p.trim() == "PowerNV") {
                Architecture::PpcPowernv
            } else {
                Architecture::Ppc
            }
        }
        "s390x" | "s390" => Architecture::S390,
        "aarch64" if efi => Architecture::Aarch64Efi,
        _ => Architecture::Unsupported,
    }
}

fn is_powerpc(machine: &str) -> bool {
    matches!(machine, "powerpc" | "powerpc64" | "ppc" | "ppc64" | "ppc64le")
}

/// `platform` appears once, after the per-processor sections.
fn platform_field(info: &CpuInfo) -> Option<&str> {
    info.fields
        .get("platform")
        .or_else(|| info.cpus.iter().find_map(|cpu| cpu.get("platform")))
        .map(String::as_str)
}
