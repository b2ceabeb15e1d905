//! Block device descriptors
//!
//! Flat records describing disks and partitions as reported by a storage
//! inventory. RAID and LVM aggregates are modelled the way the inventory
//! sees them: an md array or a volume group is a "disk" whose members are
//! other block devices, and its volumes are "partitions" of that disk.

use serde::{Deserialize, Serialize};

use crate::FilesystemType;

/// Block device name, either a kernel name or a stable udev alias.
pub type DeviceId = String;

/// Kind of a device as seen from its disk-partition descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartitionKind {
    Primary,
    Extended,
    Logical,
    /// Software RAID array (md) built from member devices
    SwRaid,
    /// Logical volume inside a volume group
    Lvm,
    /// Whole disk, no partition number
    Disk,
}

/// Kind of a disk-level device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiskKind {
    /// Plain physical disk
    #[default]
    Disk,
    /// Software RAID aggregate
    SwRaid,
    /// LVM volume group
    Lvm,
    /// Firmware (BIOS) RAID set
    DmRaid,
}

/// Partition table label of a disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartitionTableLabel {
    Msdos,
    Gpt,
}

/// Where a device lives: its containing disk and partition number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiskPartition {
    /// Containing disk (None for a raw disk)
    pub disk: Option<DeviceId>,

    /// Partition number (None for disk-level devices)
    pub number: Option<u32>,

    pub kind: PartitionKind,

    pub filesystem: Option<FilesystemType>,
}

impl DiskPartition {
    /// Whether this descriptor names a whole disk rather than a partition.
    pub fn is_disk(&self) -> bool {
        self.number.is_none()
    }

    /// Containing disk, falling back to `device` itself for disk-level devices.
    pub fn disk_or<'a>(&'a self, device: &'a str) -> &'a str {
        self.disk.as_deref().unwrap_or(device)
    }
}

/// Disk-level device information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiskInfo {
    /// Device path (e.g., "/dev/sda", "/dev/md0", "/dev/system")
    pub device: DeviceId,

    pub kind: DiskKind,

    /// Member devices (RAID members, LVM physical volumes)
    pub members: Vec<DeviceId>,

    /// Members pending addition in this session
    pub pending_members: Vec<DeviceId>,

    pub label: Option<PartitionTableLabel>,
}

impl DiskInfo {
    /// Existing members followed by pending ones.
    pub fn all_members(&self) -> Vec<DeviceId> {
        self.members
            .iter()
            .chain(&self.pending_members)
            .cloned()
            .collect()
    }
}

/// Partition-level device information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionInfo {
    /// Device path (e.g., "/dev/sda1")
    pub device: DeviceId,

    /// Containing disk
    pub disk: DeviceId,

    pub number: u32,

    pub kind: PartitionKind,

    pub filesystem: Option<FilesystemType>,

    /// Member devices (only for software RAID)
    pub members: Vec<DeviceId>,

    /// Members pending addition in this session
    pub pending_members: Vec<DeviceId>,

    /// Legacy "bootable" flag set in the partition table
    pub active: bool,

    /// Partition is created by the current session
    pub created: bool,

    /// PReP boot partition (type 0x41 or GPT PReP)
    pub prep: bool,

    /// Partition is scheduled for deletion in this session
    pub deleted: bool,

    /// RAID level of a software RAID volume, e.g. "raid1"
    pub raid_type: Option<String>,
}

impl PartitionInfo {
    /// Existing members followed by pending ones.
    pub fn all_members(&self) -> Vec<DeviceId> {
        self.members
            .iter()
            .chain(&self.pending_members)
            .cloned()
            .collect()
    }

    /// Whether this is a mirrored software RAID volume.
    pub fn is_mirror(&self) -> bool {
        self.raid_type
            .as_deref()
            .is_some_and(|level| level.eq_ignore_ascii_case("raid1"))
    }
}
