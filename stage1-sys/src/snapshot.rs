// SPDX-License-Identifier: GPL-3.0-only

//! Storage inventory backed by a topology snapshot file

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use stage1_contracts::{DeviceNames, Result as Stage1Result, Stage1Error, StorageInventory};
use stage1_types::{
    DeviceId, DiskInfo, DiskPartition, PartitionInfo, PartitionKind, SnapshotDisk,
    SnapshotPartition, TopologySnapshot,
};
use tracing::debug;

use crate::error::{Result, SysError};

#[derive(Debug, Clone)]
pub struct SnapshotInventory {
    snapshot: TopologySnapshot,
    disks: BTreeMap<DeviceId, SnapshotDisk>,
}

impl SnapshotInventory {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|error| SysError::path_io(path, error))?;
        let inventory = Self::from_toml_str(&raw)?;
        debug!(path = %path.display(), name = %inventory.snapshot.name, "loaded topology snapshot");
        Ok(inventory)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let snapshot: TopologySnapshot =
            toml::from_str(raw).map_err(|error| SysError::SnapshotInvalid {
                name: "<unparsed>".to_string(),
                reason: error.to_string(),
            })?;
        Self::from_snapshot(snapshot)
    }

    pub fn from_snapshot(snapshot: TopologySnapshot) -> Result<Self> {
        validate(&snapshot)?;
        let disks = snapshot
            .disks
            .iter()
            .map(|disk| (disk.device.clone(), disk.clone()))
            .collect();
        Ok(Self { snapshot, disks })
    }

    pub fn snapshot(&self) -> &TopologySnapshot {
        &self.snapshot
    }

    /// Name mapping from the snapshot's alias table.
    pub fn names(&self) -> SnapshotNames {
        SnapshotNames::new(self.snapshot.aliases.clone())
    }

    fn partition(&self, device: &str) -> Option<&SnapshotPartition> {
        self.snapshot
            .partitions
            .iter()
            .find(|part| part.matches(device))
    }

    fn known_disk(&self, disk: &str) -> Stage1Result<&SnapshotDisk> {
        self.disks.get(disk).ok_or_else(|| Stage1Error::lookup(disk))
    }

    fn partitions_of<'a>(&'a self, disk: &'a str) -> impl Iterator<Item = &'a SnapshotPartition> {
        self.snapshot
            .partitions
            .iter()
            .filter(move |part| part.disk == disk)
    }
}

impl StorageInventory for SnapshotInventory {
    fn disk_partition_info(&self, device: &str) -> Stage1Result<DiskPartition> {
        if self.disks.contains_key(device) {
            return Ok(DiskPartition {
                disk: None,
                number: None,
                kind: PartitionKind::Disk,
                filesystem: None,
            });
        }

        self.partition(device)
            .map(|part| DiskPartition {
                disk: Some(part.disk.clone()),
                number: Some(part.number),
                kind: part.kind,
                filesystem: part.filesystem.clone(),
            })
            .ok_or_else(|| Stage1Error::lookup(device))
    }

    fn disk_info(&self, disk: &str) -> Stage1Result<DiskInfo> {
        Ok(self.known_disk(disk)?.to_info())
    }

    fn partition_info(&self, partition: &str) -> Stage1Result<PartitionInfo> {
        self.partition(partition)
            .map(SnapshotPartition::to_info)
            .ok_or_else(|| Stage1Error::lookup(partition))
    }

    fn mount_points(&self) -> Stage1Result<BTreeMap<String, DeviceId>> {
        Ok(self.snapshot.mounts.clone())
    }

    fn prep_partitions(&self) -> Stage1Result<Vec<DeviceId>> {
        let prep: Vec<DeviceId> = self
            .snapshot
            .partitions
            .iter()
            .filter(|part| part.prep)
            .map(|part| part.device.clone())
            .collect();
        debug!(?prep, "detected PReP partitions");
        Ok(prep)
    }

    fn extended_partition_of(&self, disk: &str) -> Stage1Result<Option<DeviceId>> {
        self.known_disk(disk)?;
        Ok(self
            .partitions_of(disk)
            .find(|part| part.kind == PartitionKind::Extended)
            .map(|part| part.device.clone()))
    }

    fn active_partition_of(&self, disk: &str) -> Stage1Result<Option<DeviceId>> {
        self.known_disk(disk)?;
        Ok(self
            .partitions_of(disk)
            .find(|part| part.active)
            .map(|part| part.device.clone()))
    }

    fn is_network_backed(&self, device: &str) -> Stage1Result<bool> {
        if self.snapshot.network_devices.iter().any(|dev| dev == device) {
            return Ok(true);
        }
        Ok(self
            .partition(device)
            .and_then(|part| part.filesystem.as_ref())
            .is_some_and(|fs| fs.is_network()))
    }

    fn crypt_backing(&self, device: &str) -> Stage1Result<Option<DeviceId>> {
        Ok(self
            .snapshot
            .partitions
            .iter()
            .find(|part| part.crypt_device.as_deref() == Some(device))
            .map(|part| part.device.clone()))
    }

    fn disks(&self) -> Stage1Result<Vec<DiskInfo>> {
        Ok(self.snapshot.disks.iter().map(SnapshotDisk::to_info).collect())
    }

    fn partitions(&self) -> Stage1Result<Vec<PartitionInfo>> {
        Ok(self
            .snapshot
            .partitions
            .iter()
            .map(SnapshotPartition::to_info)
            .collect())
    }
}

pub fn validate(snapshot: &TopologySnapshot) -> Result<()> {
    let invalid = |reason: String| SysError::SnapshotInvalid {
        name: if snapshot.name.is_empty() {
            "<unnamed>".to_string()
        } else {
            snapshot.name.clone()
        },
        reason,
    };

    if snapshot.disks.is_empty() && snapshot.network_devices.is_empty() {
        return Err(invalid(
            "at least one disk or network device is required".to_string(),
        ));
    }

    let mut seen = BTreeSet::new();
    let devices = snapshot
        .disks
        .iter()
        .map(|disk| &disk.device)
        .chain(snapshot.partitions.iter().map(|part| &part.device));
    for device in devices {
        if device.is_empty() {
            return Err(invalid("device names must not be empty".to_string()));
        }
        if !seen.insert(device.as_str()) {
            return Err(invalid(format!("device {device} is declared twice")));
        }
    }

    for part in &snapshot.partitions {
        if !snapshot.disks.iter().any(|disk| disk.device == part.disk) {
            return Err(invalid(format!(
                "partition {} refers to undeclared disk {}",
                part.device, part.disk
            )));
        }
    }

    Ok(())
}

/// Alias table lookup: stable udev name -> kernel name.
#[derive(Debug, Clone, Default)]
pub struct SnapshotNames {
    aliases: BTreeMap<DeviceId, DeviceId>,
}

impl SnapshotNames {
    pub fn new(aliases: BTreeMap<DeviceId, DeviceId>) -> Self {
        Self { aliases }
    }
}

impl DeviceNames for SnapshotNames {
    fn to_kernel_name(&self, device: &str) -> DeviceId {
        self.aliases
            .get(device)
            .cloned()
            .unwrap_or_else(|| device.to_string())
    }

    fn to_stable_name(&self, device: &str) -> DeviceId {
        let kernel = self.to_kernel_name(device);
        self.aliases
            .iter()
            .find(|(_, target)| **target == kernel)
            .map(|(alias, _)| alias.clone())
            .unwrap_or(kernel)
    }
}
