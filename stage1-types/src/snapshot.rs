//! Point-in-time storage topology
//!
//! A `TopologySnapshot` is the serialisable form of everything the placement
//! policy needs to know about storage: disks, partitions, mount points and the
//! udev alias table. It is written as TOML:
//!
//! ```toml
//! [mounts]
//! "/" = "/dev/sda2"
//!
//! [[disks]]
//! device = "/dev/sda"
//! label = "msdos"
//!
//! [[partitions]]
//! device = "/dev/sda2"
//! disk = "/dev/sda"
//! number = 2
//! kind = "primary"
//! filesystem = "ext4"
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    DeviceId, DiskInfo, DiskKind, FilesystemType, PartitionInfo, PartitionKind,
    PartitionTableLabel,
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologySnapshot {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub disks: Vec<SnapshotDisk>,

    #[serde(default)]
    pub partitions: Vec<SnapshotPartition>,

    /// Mount point -> kernel device name
    #[serde(default)]
    pub mounts: BTreeMap<String, DeviceId>,

    /// Devices backed by a network filesystem (e.g. "/dev/nfs")
    #[serde(default)]
    pub network_devices: Vec<DeviceId>,

    /// Stable udev alias -> kernel device name
    #[serde(default)]
    pub aliases: BTreeMap<DeviceId, DeviceId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotDisk {
    pub device: DeviceId,

    #[serde(default)]
    pub kind: DiskKind,

    #[serde(default)]
    pub members: Vec<DeviceId>,

    #[serde(default)]
    pub pending_members: Vec<DeviceId>,

    #[serde(default)]
    pub label: Option<PartitionTableLabel>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotPartition {
    pub device: DeviceId,
    pub disk: DeviceId,
    pub number: u32,
    pub kind: PartitionKind,

    #[serde(default)]
    pub filesystem: Option<FilesystemType>,

    #[serde(default)]
    pub members: Vec<DeviceId>,

    #[serde(default)]
    pub pending_members: Vec<DeviceId>,

    #[serde(default)]
    pub active: bool,

    #[serde(default)]
    pub created: bool,

    #[serde(default)]
    pub prep: bool,

    #[serde(default)]
    pub deleted: bool,

    #[serde(default)]
    pub raid_type: Option<String>,

    /// Name of the dm-crypt mapping opened on top of this partition
    #[serde(default)]
    pub crypt_device: Option<DeviceId>,
}

impl SnapshotDisk {
    pub fn to_info(&self) -> DiskInfo {
        DiskInfo {
            device: self.device.clone(),
            kind: self.kind,
            members: self.members.clone(),
            pending_members: self.pending_members.clone(),
            label: self.label,
        }
    }
}

impl SnapshotPartition {
    /// Whether `device` names this partition or its encryption mapping.
    pub fn matches(&self, device: &str) -> bool {
        self.device == device || self.crypt_device.as_deref() == Some(device)
    }

    pub fn to_info(&self) -> PartitionInfo {
        PartitionInfo {
            device: self.device.clone(),
            disk: self.disk.clone(),
            number: self.number,
            kind: self.kind,
            filesystem: self.filesystem.clone(),
            members: self.members.clone(),
            pending_members: self.pending_members.clone(),
            active: self.active,
            created: self.created,
            prep: self.prep,
            deleted: self.deleted,
            raid_type: self.raid_type.clone(),
        }
    }
}
