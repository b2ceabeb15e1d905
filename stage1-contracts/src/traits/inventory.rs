// SPDX-License-Identifier: GPL-3.0-only

use std::collections::BTreeMap;

use stage1_types::{DeviceId, DiskInfo, DiskPartition, PartitionInfo};

use crate::Result;

/// Read-only view of the storage topology.
///
/// Every lookup of an unknown device fails with `Stage1Error::Lookup`;
/// implementations must not guess.
pub trait StorageInventory: Send + Sync {
    fn disk_partition_info(&self, device: &str) -> Result<DiskPartition>;

    fn disk_info(&self, disk: &str) -> Result<DiskInfo>;

    fn partition_info(&self, partition: &str) -> Result<PartitionInfo>;

    /// Mount point -> device
    fn mount_points(&self) -> Result<BTreeMap<String, DeviceId>>;

    fn prep_partitions(&self) -> Result<Vec<DeviceId>>;

    fn extended_partition_of(&self, disk: &str) -> Result<Option<DeviceId>>;

    /// Partition carrying the legacy bootable flag on `disk`, if any.
    fn active_partition_of(&self, disk: &str) -> Result<Option<DeviceId>>;

    fn is_network_backed(&self, _device: &str) -> Result<bool> {
        Ok(false)
    }

    /// Partition underneath `device` when `device` is a dm-crypt mapping.
    fn crypt_backing(&self, _device: &str) -> Result<Option<DeviceId>> {
        Ok(None)
    }

    /// Every disk-level device, in inventory order.
    fn disks(&self) -> Result<Vec<DiskInfo>>;

    /// Every partition-level device, in inventory order.
    fn partitions(&self) -> Result<Vec<PartitionInfo>>;
}
