// SPDX-License-Identifier: GPL-3.0-only

use stage1_contracts::{DeviceNames, Result, Stage1Error, StorageInventory};
use stage1_types::DeviceId;
use tracing::info;

/// Devices that matter for stage1 placement, all as kernel names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootLayout {
    /// Device mounted on `/`
    pub root: DeviceId,

    /// Device mounted on `/boot`, or `root` without a separate `/boot`
    pub boot: DeviceId,

    /// Disk holding the boot device
    pub boot_disk: DeviceId,

    /// Disk whose MBR receives stage1 (defaults to `boot_disk`)
    pub mbr_disk: DeviceId,

    /// Extended partition on the boot disk
    pub extended: Option<DeviceId>,

    /// `/boot` comes from a network filesystem (diskless client)
    pub network_boot: bool,
}

impl BootLayout {
    pub fn detect(inventory: &dyn StorageInventory, names: &dyn DeviceNames) -> Result<Self> {
        let mounts = inventory.mount_points()?;

        let root = mounts
            .get("/")
            .map(|dev| names.to_kernel_name(dev))
            .ok_or(Stage1Error::NoRootMount)?;
        let boot = mounts
            .get("/boot")
            .map(|dev| names.to_kernel_name(dev))
            .unwrap_or_else(|| root.clone());

        let network_boot = inventory.is_network_backed(&boot)?;
        let (boot_disk, extended) = if network_boot {
            (boot.clone(), None)
        } else {
            let descriptor = inventory.disk_partition_info(&boot)?;
            let disk = names.to_kernel_name(descriptor.disk_or(&boot));
            let extended = inventory
                .extended_partition_of(&disk)?
                .map(|dev| names.to_kernel_name(&dev));
            (disk, extended)
        };

        let layout = Self {
            root,
            boot,
            mbr_disk: boot_disk.clone(),
            boot_disk,
            extended,
            network_boot,
        };
        info!(
            root = %layout.root,
            boot = %layout.boot,
            mbr_disk = %layout.mbr_disk,
            extended = ?layout.extended,
            network_boot = layout.network_boot,
            "detected boot layout"
        );
        Ok(layout)
    }

    /// Whether `/boot` is a partition of its own.
    pub fn separated_boot(&self) -> bool {
        self.boot != self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stage1_contracts::IdentityNames;
    use stage1_sys::SnapshotInventory;

    const LOGICAL_BOOT: &str = r#"
[mounts]
"/" = "/dev/sda2"
"/boot" = "/dev/sda5"

[[disks]]
device = "/dev/sda"
label = "msdos"

[[partitions]]
device = "/dev/sda2"
disk = "/dev/sda"
number = 2
kind = "primary"
filesystem = "ext4"

[[partitions]]
device = "/dev/sda4"
disk = "/dev/sda"
number = 4
kind = "extended"

[[partitions]]
device = "/dev/sda5"
disk = "/dev/sda"
number = 5
kind = "logical"
filesystem = "ext4"
"#;

    #[test]
    fn detects_separate_boot_and_extended() {
        let inventory = SnapshotInventory::from_toml_str(LOGICAL_BOOT).unwrap();
        let layout = BootLayout::detect(&inventory, &IdentityNames).unwrap();
        assert_eq!(layout.root, "/dev/sda2");
        assert_eq!(layout.boot, "/dev/sda5");
        assert_eq!(layout.boot_disk, "/dev/sda");
        assert_eq!(layout.mbr_disk, "/dev/sda");
        assert_eq!(layout.extended.as_deref(), Some("/dev/sda4"));
        assert!(layout.separated_boot());
        assert!(!layout.network_boot);
    }

    #[test]
    fn missing_root_mount_is_an_error() {
        let inventory = SnapshotInventory::from_toml_str(
            r#"
[[disks]]
device = "/dev/sda"
"#,
        )
        .unwrap();
        assert_eq!(
            BootLayout::detect(&inventory, &IdentityNames).unwrap_err(),
            Stage1Error::NoRootMount
        );
    }

    #[test]
    fn boot_defaults_to_root() {
        let raw = LOGICAL_BOOT.replace("\"/boot\" = \"/dev/sda5\"\n", "");
        let inventory = SnapshotInventory::from_toml_str(&raw).unwrap();
        let layout = BootLayout::detect(&inventory, &IdentityNames).unwrap();
        assert_eq!(layout.boot, "/dev/sda2");
        assert!(!layout.separated_boot());
    }
}
