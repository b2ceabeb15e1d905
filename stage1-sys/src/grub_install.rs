// SPDX-License-Identifier: GPL-3.0-only

//! `grub2-install` / `shim-install` invocation

use std::sync::{Mutex, MutexGuard};

use stage1_contracts::{BootInstaller, Result as Stage1Result, Stage1Error};
use tracing::info;

use crate::cmd::{CommandLine, CommandOutcome};

const GRUB_INSTALL: &str = "/usr/sbin/grub2-install";
const SHIM_INSTALL: &str = "/usr/sbin/shim-install";
const GRUB_CONFIG: &str = "/boot/grub2/grub.cfg";
const TRUSTED_GRUB_DIR: &str = "/usr/lib/trustedgrub2";

#[derive(Debug, Default)]
pub struct GrubInstall {
    dry_run: bool,
    outcomes: Mutex<Vec<CommandOutcome>>,
}

impl GrubInstall {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record commands without executing them.
    pub fn dry_run() -> Self {
        Self {
            dry_run: true,
            ..Self::default()
        }
    }

    /// Commands run (or rendered, in dry-run mode) so far.
    pub fn outcomes(&self) -> Vec<CommandOutcome> {
        self.recorded().clone()
    }

    // The list stays valid after a panic elsewhere; only whole outcomes are pushed.
    fn recorded(&self) -> MutexGuard<'_, Vec<CommandOutcome>> {
        self.outcomes
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Installer invocation for one stage1 device.
pub fn command_line(
    target: &str,
    device: Option<&str>,
    secure_boot: bool,
    trusted_boot: bool,
) -> Stage1Result<CommandLine> {
    let efi = target.ends_with("-efi");
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

    let mut line = if secure_boot {
        CommandLine::new(SHIM_INSTALL).arg(format!("--config-file={GRUB_CONFIG}"))
    } else {
        // Skip the filesystem probe, it fails when embedding into an
        // extended partition.
        let line = CommandLine::new(GRUB_INSTALL)
            .arg(format!("--target={target}"))
            .arg("--force")
            .arg("--skip-fs-probe");
        if trusted_boot {
            line.arg(format!("--directory={TRUSTED_GRUB_DIR}"))
        } else {
            line
        }
    };

    if let Some(device) = device {
        line = line.arg(device);
    }
    Ok(line)
}

impl BootInstaller for GrubInstall {
    fn install(
        &self,
        target: &str,
        device: Option<&str>,
        secure_boot: bool,
        trusted_boot: bool,
    ) -> Stage1Result<()> {
        let outcome =
            command_line(target, device, secure_boot, trusted_boot)?.execute(self.dry_run)?;
        info!(command = %outcome.command, executed = outcome.executed, "bootloader installer");

        self.recorded().push(outcome);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_command_line() {
        let line = command_line("i386-pc", Some("/dev/sda"), false, false).unwrap();
        assert_eq!(line.program, GRUB_INSTALL);
        assert_eq!(
            line.args,
            vec!["--target=i386-pc", "--force", "--skip-fs-probe", "/dev/sda"]
        );
    }

    #[test]
    fn trusted_boot_uses_trustedgrub_modules() {
        let line = command_line("i386-pc", None, false, true).unwrap();
        assert_eq!(line.args.last().map(String::as_str), Some("--directory=/usr/lib/trustedgrub2"));
    }

    #[test]
    fn secure_boot_goes_through_shim() {
        let line = command_line("x86_64-efi", None, true, false).unwrap();
        assert_eq!(line.program, SHIM_INSTALL);
        assert_eq!(line.args, vec!["--config-file=/boot/grub2/grub.cfg"]);
    }

    #[test]
    fn rejects_conflicting_flags() {
        assert!(command_line("i386-pc", None, true, false).is_err());
        assert!(command_line("arm64-efi", None, false, true).is_err());
    }

    #[test]
    fn dry_run_records_each_device() {
        let installer = GrubInstall::dry_run();
        installer.install("i386-pc", Some("/dev/sda"), false, false).unwrap();
        installer.install("i386-pc", Some("/dev/sdb"), false, false).unwrap();

        let outcomes = installer.outcomes();
        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.iter().all(|outcome| !outcome.executed));
        assert!(outcomes[1].command.ends_with("/dev/sdb"));
    }

    #[test]
    fn outcomes_survive_a_poisoned_lock() {
        let installer = std::sync::Arc::new(GrubInstall::dry_run());
        installer.install("i386-pc", Some("/dev/sda"), false, false).unwrap();

        let holder = installer.clone();
        let result = std::thread::spawn(move || {
            let _guard = holder.outcomes.lock().unwrap();
            panic!("installer thread died while recording");
        })
        .join();
        assert!(result.is_err());
        assert!(installer.outcomes.is_poisoned());

        installer.install("i386-pc", Some("/dev/sdb"), false, false).unwrap();
        let commands: Vec<String> = installer
            .outcomes()
            .into_iter()
            .map(|outcome| outcome.command)
            .collect();
        assert_eq!(commands.len(), 2);
        assert!(commands[0].ends_with("/dev/sda"));
        assert!(commands[1].ends_with("/dev/sdb"));
    }
}
