// SPDX-License-Identifier: GPL-3.0-only

#![allow(dead_code)]

use std::sync::Arc;

use stage1_contracts::{DeviceNames, IdentityNames};
use stage1_core::{Stage1Model, Stage1Policy};
use stage1_sys::SnapshotInventory;
use stage1_types::Architecture;

pub struct Fixture {
    pub inventory: Arc<SnapshotInventory>,
    pub names: Arc<dyn DeviceNames>,
}

impl Fixture {
    /// Devices named by kernel name only.
    pub fn plain(raw: &str) -> Self {
        let inventory = SnapshotInventory::from_toml_str(raw).expect("valid snapshot");
        Self {
            inventory: Arc::new(inventory),
            names: Arc::new(IdentityNames),
        }
    }

    /// Devices mapped through the snapshot's alias table.
    pub fn aliased(raw: &str) -> Self {
        let inventory = SnapshotInventory::from_toml_str(raw).expect("valid snapshot");
        let names = inventory.names();
        Self {
            inventory: Arc::new(inventory),
            names: Arc::new(names),
        }
    }

    pub fn policy(&self, arch: Architecture) -> Stage1Policy {
        Stage1Policy::new(arch, self.inventory.clone(), self.names.clone())
            .expect("boot layout detected")
    }

    pub fn model(&self) -> Stage1Model {
        Stage1Model::new(self.names.clone())
    }
}

pub fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| item.to_string()).collect()
}

/// Separate ext4 `/boot` on the second disk; the first disk has an active
/// partition (e.g. another operating system).
pub const SEPARATE_BOOT_SECOND_DISK: &str = r#"
name = "separate-boot-second-disk"

[mounts]
"/" = "/dev/sdb2"
"/boot" = "/dev/sdb1"

[[disks]]
device = "/dev/sda"
label = "msdos"

[[disks]]
device = "/dev/sdb"
label = "msdos"

[[partitions]]
device = "/dev/sda1"
disk = "/dev/sda"
number = 1
kind = "primary"
filesystem = "ntfs"
active = true

[[partitions]]
device = "/dev/sdb1"
disk = "/dev/sdb"
number = 1
kind = "primary"
filesystem = "ext4"

[[partitions]]
device = "/dev/sdb2"
disk = "/dev/sdb"
number = 2
kind = "primary"
filesystem = "ext4"
"#;

/// `/` and `/boot` share one ext4 partition.
pub const SINGLE_ROOT: &str = r#"
name = "single-root"

[mounts]
"/" = "/dev/sda1"

[aliases]
"/dev/disk/by-id/ata-DISK_S1" = "/dev/sda"
"/dev/disk/by-id/ata-DISK_S1-part1" = "/dev/sda1"

[[disks]]
device = "/dev/sda"
label = "gpt"

[[partitions]]
device = "/dev/sda1"
disk = "/dev/sda"
number = 1
kind = "primary"
filesystem = "ext4"

[[partitions]]
device = "/dev/sda2"
disk = "/dev/sda"
number = 2
kind = "primary"
filesystem = "swap"
"#;

/// Separate btrfs `/boot` on the MBR disk.
pub const BTRFS_BOOT: &str = r#"
name = "btrfs-boot"

[mounts]
"/" = "/dev/sda2"
"/boot" = "/dev/sda1"

[[disks]]
device = "/dev/sda"
label = "msdos"

[[partitions]]
device = "/dev/sda1"
disk = "/dev/sda"
number = 1
kind = "primary"
filesystem = "btrfs"

[[partitions]]
device = "/dev/sda2"
disk = "/dev/sda"
number = 2
kind = "primary"
filesystem = "ext4"
"#;

/// `/boot` on a logical partition inside an extended one.
pub const LOGICAL_BOOT: &str = r#"
name = "logical-boot"

[mounts]
"/" = "/dev/sda1"
"/boot" = "/dev/sda5"

[[disks]]
device = "/dev/sda"
label = "msdos"

[[partitions]]
device = "/dev/sda1"
disk = "/dev/sda"
number = 1
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

/// Root and `/boot` on an xfs partition.
pub const XFS_ROOT: &str = r#"
name = "xfs-root"

[mounts]
"/" = "/dev/vda1"

[[disks]]
device = "/dev/vda"
label = "msdos"

[[partitions]]
device = "/dev/vda1"
disk = "/dev/vda"
number = 1
kind = "primary"
filesystem = "xfs"
"#;

/// `/boot` on a RAID1 array mirrored over two disks.
pub const RAID1_BOOT: &str = r#"
name = "raid1-boot"

[mounts]
"/" = "/dev/md1"
"/boot" = "/dev/md0"

[[disks]]
device = "/dev/sda"
label = "msdos"

[[disks]]
device = "/dev/sdb"
label = "msdos"

[[disks]]
device = "/dev/md"
kind = "sw_raid"

[[partitions]]
device = "/dev/sda1"
disk = "/dev/sda"
number = 1
kind = "primary"

[[partitions]]
device = "/dev/sda2"
disk = "/dev/sda"
number = 2
kind = "primary"

[[partitions]]
device = "/dev/sdb1"
disk = "/dev/sdb"
number = 1
kind = "primary"

[[partitions]]
device = "/dev/sdb2"
disk = "/dev/sdb"
number = 2
kind = "primary"

[[partitions]]
device = "/dev/md0"
disk = "/dev/md"
number = 0
kind = "sw_raid"
filesystem = "ext4"
raid_type = "raid1"
members = ["/dev/sda1", "/dev/sdb1"]

[[partitions]]
device = "/dev/md1"
disk = "/dev/md"
number = 1
kind = "sw_raid"
filesystem = "ext4"
raid_type = "raid1"
members = ["/dev/sda2", "/dev/sdb2"]
"#;

/// Root and `/boot` on a logical volume; the volume group spans two whole disks.
pub const LVM_TWO_DISKS: &str = r#"
name = "lvm-two-disks"

[mounts]
"/" = "/dev/system/root"

[[disks]]
device = "/dev/sda"

[[disks]]
device = "/dev/sdb"

[[disks]]
device = "/dev/system"
kind = "lvm"
members = ["/dev/sda"]
pending_members = ["/dev/sdb"]

[[partitions]]
device = "/dev/system/root"
disk = "/dev/system"
number = 1
kind = "lvm"
filesystem = "ext4"
"#;

/// PowerPC: a PReP partition on the boot disk and a newly created one elsewhere.
pub const PPC_TWO_PREP: &str = r#"
name = "ppc-two-prep"

[mounts]
"/" = "/dev/sda2"

[[disks]]
device = "/dev/sda"
label = "gpt"

[[disks]]
device = "/dev/sdb"
label = "gpt"

[[partitions]]
device = "/dev/sda1"
disk = "/dev/sda"
number = 1
kind = "primary"
prep = true

[[partitions]]
device = "/dev/sda2"
disk = "/dev/sda"
number = 2
kind = "primary"
filesystem = "xfs"

[[partitions]]
device = "/dev/sdb1"
disk = "/dev/sdb"
number = 1
kind = "primary"
prep = true
created = true
"#;

/// PowerPC diskless client: everything comes over NFS.
pub const PPC_NFS: &str = r#"
name = "ppc-nfs"
network_devices = ["/dev/nfs"]

[mounts]
"/" = "/dev/nfs"
"#;

/// PowerPC: two existing PReP partitions, the one on the boot disk listed last.
pub const PPC_FOREIGN_PREP_FIRST: &str = r#"
name = "ppc-foreign-prep-first"

[mounts]
"/" = "/dev/sdb2"

[[disks]]
device = "/dev/sda"
label = "gpt"

[[disks]]
device = "/dev/sdb"
label = "gpt"

[[partitions]]
device = "/dev/sda1"
disk = "/dev/sda"
number = 1
kind = "primary"
prep = true

[[partitions]]
device = "/dev/sdb1"
disk = "/dev/sdb"
number = 1
kind = "primary"
prep = true

[[partitions]]
device = "/dev/sdb2"
disk = "/dev/sdb"
number = 2
kind = "primary"
filesystem = "xfs"
"#;

/// Root on a dm-crypt mapping of the only partition.
pub const ENCRYPTED_ROOT: &str = r#"
name = "encrypted-root"

[mounts]
"/" = "/dev/mapper/cr_root"

[[disks]]
device = "/dev/sda"
label = "gpt"

[[partitions]]
device = "/dev/sda1"
disk = "/dev/sda"
number = 1
kind = "primary"
filesystem = "ext4"
crypt_device = "/dev/mapper/cr_root"
"#;

/// Encrypted `/boot` next to a plain root partition.
pub const ENCRYPTED_BOOT: &str = r#"
name = "encrypted-boot"

[mounts]
"/" = "/dev/sda2"
"/boot" = "/dev/mapper/cr_boot"

[[disks]]
device = "/dev/sda"
label = "msdos"

[[partitions]]
device = "/dev/sda1"
disk = "/dev/sda"
number = 1
kind = "primary"
filesystem = "ext4"
crypt_device = "/dev/mapper/cr_boot"

[[partitions]]
device = "/dev/sda2"
disk = "/dev/sda"
number = 2
kind = "primary"
filesystem = "ext4"
"#;
