// SPDX-License-Identifier: GPL-3.0-only

//! System-facing collaborators for stage1 placement
//!
//! This crate provides the concrete implementations the placement core is
//! wired to at runtime:
//! - Storage inventory over a point-in-time topology snapshot
//! - Device name mapping through `/dev/disk/by-*` symlinks
//! - The grub install-device file as persisted stage1 store
//! - Invocation of `grub2-install` / `shim-install`
//!
//! Running the installer requires root and should only happen once the
//! proposal has been reviewed.

pub mod arch;
pub mod cmd;
pub mod error;
pub mod grub_install;
pub mod install_device;
pub mod snapshot;
pub mod udev;

pub use arch::detect_architecture;
pub use cmd::{CommandLine, CommandOutcome};
pub use error::{Result, SysError};
pub use grub_install::GrubInstall;
pub use install_device::InstallDeviceFile;
pub use snapshot::{SnapshotInventory, SnapshotNames};
pub use udev::{UdevMapping, UdevNamespace};
