// SPDX-License-Identifier: GPL-3.0-only

use crate::Result;

/// Runs the platform bootloader installer.
pub trait BootInstaller: Send + Sync {
    /// Install stage1 for `target` (e.g. "i386-pc") onto `device`, or let the
    /// installer pick its default location when `device` is None.
    fn install(
        &self,
        target: &str,
        device: Option<&str>,
        secure_boot: bool,
        trusted_boot: bool,
    ) -> Result<()>;
}
