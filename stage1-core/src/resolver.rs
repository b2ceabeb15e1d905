// SPDX-License-Identifier: GPL-3.0-only

//! Resolve a block device to the physical devices it rests on.
//!
//! Devices stack: a logical volume lives on physical volumes, which may be
//! md arrays, which are built from partitions. Resolution walks that stack
//! until nothing more can be unwrapped. Results are memoized for the life of
//! the resolver; call [`TopologyResolver::invalidate`] after changing storage.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use stage1_contracts::{DeviceNames, Result, Stage1Error, StorageInventory};
use stage1_types::{DeviceId, DiskKind, PartitionKind};
use tracing::{debug, warn};

/// Deepest RAID/LVM stack accepted before resolution is treated as a cycle.
pub const MAX_STACK_DEPTH: usize = 32;

pub struct TopologyResolver {
    inventory: Arc<dyn StorageInventory>,
    names: Arc<dyn DeviceNames>,
    boot_partition: Option<DeviceId>,
    cache: HashMap<DeviceId, BTreeSet<DeviceId>>,
}

impl TopologyResolver {
    pub fn new(inventory: Arc<dyn StorageInventory>, names: Arc<dyn DeviceNames>) -> Self {
        Self {
            inventory,
            names,
            boot_partition: None,
            cache: HashMap::new(),
        }
    }

    /// Set the partition holding `/boot`.
    ///
    /// A software RAID disk is resolved through this partition rather than
    /// its own member list, so nested arrays bottom out where `/boot` lives.
    pub fn with_boot_partition(mut self, device: impl AsRef<str>) -> Self {
        self.set_boot_partition(Some(device.as_ref()));
        self
    }

    pub fn set_boot_partition(&mut self, device: Option<&str>) {
        self.boot_partition = device.map(|d| self.names.to_kernel_name(d));
        self.invalidate();
    }

    pub fn boot_partition(&self) -> Option<&str> {
        self.boot_partition.as_deref()
    }

    pub fn names(&self) -> &Arc<dyn DeviceNames> {
        &self.names
    }

    pub fn inventory(&self) -> &Arc<dyn StorageInventory> {
        &self.inventory
    }

    /// Drop every memoized result.
    pub fn invalidate(&mut self) {
        self.cache.clear();
    }

    /// Physical devices (kernel names) that `device` ultimately rests on.
    ///
    /// Never empty: a device that cannot be decomposed resolves to itself.
    pub fn resolve(&mut self, device: &str) -> Result<BTreeSet<DeviceId>> {
        let mut stack = Vec::new();
        self.resolve_inner(device, &mut stack)
    }

    /// Disks holding the devices `device` resolves to.
    pub fn underlying_disks(&mut self, device: &str) -> Result<BTreeSet<DeviceId>> {
        self.resolve(device)?
            .iter()
            .map(|dev| self.containing_disk(dev))
            .collect()
    }

    /// Disk a device lives on, or the device itself when it is a disk.
    pub fn containing_disk(&self, device: &str) -> Result<DeviceId> {
        let kernel = self.names.to_kernel_name(device);
        let descriptor = self.inventory.disk_partition_info(&kernel)?;
        Ok(descriptor.disk_or(&kernel).to_string())
    }

    fn resolve_inner(
        &mut self,
        device: &str,
        stack: &mut Vec<DeviceId>,
    ) -> Result<BTreeSet<DeviceId>> {
        let kernel = self.names.to_kernel_name(device);
        if let Some(hit) = self.cache.get(&kernel) {
            return Ok(hit.clone());
        }

        if stack.contains(&kernel) || stack.len() >= MAX_STACK_DEPTH {
            warn!(device = %kernel, depth = stack.len(), "device stacking does not terminate");
            return Err(Stage1Error::CycleDetected { device: kernel });
        }

        stack.push(kernel.clone());
        let direct = self.direct_underlying(&kernel, stack);
        let mut resolved = BTreeSet::new();
        let outcome = direct.and_then(|direct| {
            for dev in direct {
                resolved.extend(self.resolve_inner(&dev, stack)?);
            }
            Ok(())
        });
        stack.pop();
        outcome?;

        if resolved.is_empty() {
            resolved.insert(kernel.clone());
        }

        debug!(device = %kernel, underlying = ?resolved, "resolved underlying devices");
        self.cache.insert(kernel, resolved.clone());
        Ok(resolved)
    }

    /// One level of unwrapping. Empty when `device` is a leaf.
    fn direct_underlying(
        &mut self,
        device: &str,
        stack: &mut Vec<DeviceId>,
    ) -> Result<Vec<DeviceId>> {
        if let Some(backing) = self.inventory.crypt_backing(device)? {
            debug!(device, %backing, "unwrapping encryption mapping");
            return Ok(vec![backing]);
        }

        let descriptor = self.inventory.disk_partition_info(device)?;

        if descriptor.is_disk() {
            let disk = self.inventory.disk_info(device)?;
            return match disk.kind {
                DiskKind::SwRaid => {
                    let Some(boot) = self.boot_partition.clone() else {
                        debug!(device, "no boot partition known, raid disk is a leaf");
                        return Ok(Vec::new());
                    };
                    let parts = self.resolve_inner(&boot, stack)?;
                    parts.iter().map(|part| self.containing_disk(part)).collect()
                }
                DiskKind::Lvm => disk
                    .all_members()
                    .iter()
                    .map(|member| self.containing_disk(member))
                    .collect(),
                DiskKind::Disk | DiskKind::DmRaid => Ok(Vec::new()),
            };
        }

        match descriptor.kind {
            PartitionKind::Lvm => match descriptor.disk {
                Some(vg) => Ok(self.inventory.disk_info(&vg)?.all_members()),
                None => Ok(Vec::new()),
            },
            PartitionKind::SwRaid => Ok(self.inventory.partition_info(device)?.all_members()),
            _ => Ok(Vec::new()),
        }
    }
}

impl std::fmt::Debug for TopologyResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TopologyResolver")
            .field("boot_partition", &self.boot_partition)
            .field("cached", &self.cache.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stage1_contracts::IdentityNames;
    use stage1_sys::SnapshotInventory;

    fn resolver(raw: &str) -> TopologyResolver {
        let inventory = SnapshotInventory::from_toml_str(raw).expect("valid snapshot");
        TopologyResolver::new(Arc::new(inventory), Arc::new(IdentityNames))
    }

    fn set(devices: &[&str]) -> BTreeSet<DeviceId> {
        devices.iter().map(|d| d.to_string()).collect()
    }

    const RAID1_BOOT: &str = r#"
[[disks]]
device = "/dev/sda"

[[disks]]
device = "/dev/sdb"

[[disks]]
device = "/dev/md"
kind = "sw_raid"

[[partitions]]
device = "/dev/sda1"
disk = "/dev/sda"
number = 1
kind = "primary"

[[partitions]]
device = "/dev/sdb1"
disk = "/dev/sdb"
number = 1
kind = "primary"

[[partitions]]
device = "/dev/md0"
disk = "/dev/md"
number = 0
kind = "sw_raid"
filesystem = "ext4"
members = ["/dev/sda1"]
pending_members = ["/dev/sdb1"]
"#;

    #[test]
    fn plain_partition_resolves_to_itself() {
        let mut resolver = resolver(RAID1_BOOT);
        assert_eq!(resolver.resolve("/dev/sda1").unwrap(), set(&["/dev/sda1"]));
        assert_eq!(resolver.resolve("/dev/sda").unwrap(), set(&["/dev/sda"]));
    }

    #[test]
    fn raid_partition_includes_pending_members() {
        let mut resolver = resolver(RAID1_BOOT);
        assert_eq!(
            resolver.resolve("/dev/md0").unwrap(),
            set(&["/dev/sda1", "/dev/sdb1"])
        );
        assert_eq!(
            resolver.underlying_disks("/dev/md0").unwrap(),
            set(&["/dev/sda", "/dev/sdb"])
        );
    }

    #[test]
    fn raid_disk_follows_boot_partition() {
        let mut resolver = resolver(RAID1_BOOT).with_boot_partition("/dev/md0");
        assert_eq!(
            resolver.resolve("/dev/md").unwrap(),
            set(&["/dev/sda", "/dev/sdb"])
        );
    }

    #[test]
    fn raid_disk_without_boot_partition_is_a_leaf() {
        let mut resolver = resolver(RAID1_BOOT);
        assert_eq!(resolver.resolve("/dev/md").unwrap(), set(&["/dev/md"]));
    }

    #[test]
    fn unknown_device_is_a_lookup_error() {
        let mut resolver = resolver(RAID1_BOOT);
        assert_eq!(
            resolver.resolve("/dev/sdz").unwrap_err(),
            Stage1Error::lookup("/dev/sdz")
        );
    }

    #[test]
    fn resolution_is_a_fixed_point() {
        let mut resolver = resolver(RAID1_BOOT).with_boot_partition("/dev/md0");
        for device in ["/dev/md", "/dev/md0", "/dev/sda1", "/dev/sdb"] {
            let first = resolver.resolve(device).unwrap();
            let mut again = BTreeSet::new();
            for dev in &first {
                again.extend(resolver.resolve(dev).unwrap());
            }
            assert_eq!(first, again, "{device} is not a fixed point");
        }
    }

    #[test]
    fn self_referencing_raid_is_a_cycle() {
        let raw = r#"
[[disks]]
device = "/dev/md"
kind = "sw_raid"

[[partitions]]
device = "/dev/md0"
disk = "/dev/md"
number = 0
kind = "sw_raid"
members = ["/dev/md1"]

[[partitions]]
device = "/dev/md1"
disk = "/dev/md"
number = 1
kind = "sw_raid"
members = ["/dev/md0"]
"#;
        let mut resolver = resolver(raw);
        assert!(matches!(
            resolver.resolve("/dev/md0"),
            Err(Stage1Error::CycleDetected { .. })
        ));
        // Nothing half-resolved is left behind.
        assert_eq!(resolver.cache.len(), 0);
    }

    #[test]
    fn stack_deeper_than_limit_is_rejected() {
        let mut raw = String::from(
            "[[disks]]\ndevice = \"/dev/sda\"\n\n[[disks]]\ndevice = \"/dev/md\"\nkind = \"sw_raid\"\n\n\
             [[partitions]]\ndevice = \"/dev/sda1\"\ndisk = \"/dev/sda\"\nnumber = 1\nkind = \"primary\"\n",
        );
        // md0 on md1 on ... on md31 on sda1, without any repeated device.
        for level in 0..MAX_STACK_DEPTH {
            let member = if level + 1 == MAX_STACK_DEPTH {
                "/dev/sda1".to_string()
            } else {
                format!("/dev/md{}", level + 1)
            };
            raw.push_str(&format!(
                "\n[[partitions]]\ndevice = \"/dev/md{level}\"\ndisk = \"/dev/md\"\n\
                 number = {level}\nkind = \"sw_raid\"\nmembers = [\"{member}\"]\n"
            ));
        }

        let mut resolver = resolver(&raw);
        assert!(matches!(
            resolver.resolve("/dev/md0"),
            Err(Stage1Error::CycleDetected { .. })
        ));
        assert!(resolver.cache.is_empty());

        // One level shallower stays within the limit.
        assert_eq!(resolver.resolve("/dev/md1").unwrap(), set(&["/dev/sda1"]));
    }

    #[test]
    fn encryption_mapping_resolves_to_its_partition() {
        let raw = r#"
[[disks]]
device = "/dev/sda"

[[disks]]
device = "/dev/system"
kind = "lvm"
members = ["/dev/mapper/cr_sda2"]

[[partitions]]
device = "/dev/sda2"
disk = "/dev/sda"
number = 2
kind = "primary"
crypt_device = "/dev/mapper/cr_sda2"

[[partitions]]
device = "/dev/system/root"
disk = "/dev/system"
number = 1
kind = "lvm"
filesystem = "btrfs"
"#;
        let mut resolver = resolver(raw);
        assert_eq!(
            resolver.resolve("/dev/mapper/cr_sda2").unwrap(),
            set(&["/dev/sda2"])
        );
        assert_eq!(
            resolver.resolve("/dev/system/root").unwrap(),
            set(&["/dev/sda2"])
        );
        assert_eq!(
            resolver.underlying_disks("/dev/system/root").unwrap(),
            set(&["/dev/sda"])
        );
    }

    #[test]
    fn invalidate_drops_cached_results() {
        let mut resolver = resolver(RAID1_BOOT);
        resolver.resolve("/dev/md0").unwrap();
        assert!(!resolver.cache.is_empty());
        resolver.invalidate();
        assert!(resolver.cache.is_empty());
    }
}
