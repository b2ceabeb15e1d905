// SPDX-License-Identifier: GPL-3.0-only

//! Canonical domain models for stage1 bootloader placement
//!
//! These types are shared by every layer of the workspace:
//!
//! - **stage1-contracts**: collaborator traits speak in these types
//! - **stage1-core**: the resolver and placement policy consume and produce them
//! - **stage1-sys**: snapshot files and the install-device store (de)serialize them
//!
//! ## Device namespaces
//!
//! A [`DeviceId`] is an opaque block device name. The same device may be named
//! by its kernel name (`/dev/sda1`) or by a stable udev alias
//! (`/dev/disk/by-id/ata-...-part1`). Nothing in this crate normalizes names;
//! that is the job of a `DeviceNames` collaborator.

pub mod arch;
pub mod device;
pub mod filesystem;
pub mod snapshot;
pub mod stage1;

pub use arch::{Architecture, ParseArchitectureError};
pub use device::{
    DeviceId, DiskInfo, DiskKind, DiskPartition, PartitionInfo, PartitionKind,
    PartitionTableLabel,
};
pub use filesystem::FilesystemType;
pub use snapshot::{SnapshotDisk, SnapshotPartition, TopologySnapshot};
pub use stage1::{Location, Proposal, Stage1Config};
