// SPDX-License-Identifier: GPL-3.0-only

use stage1_contracts::Result;
use stage1_types::{DeviceId, Location, PartitionKind, Proposal};
use tracing::info;

use super::Stage1Policy;

/// Facts about the boot partition and everything it rests on.
#[derive(Debug, Clone, Copy, Default)]
pub(super) struct BootFacts {
    pub(super) logical: bool,
    pub(super) copy_on_write: bool,
}

impl Stage1Policy {
    pub(super) fn propose_x86(&mut self) -> Result<Proposal> {
        let location = self.propose_boot_location()?;
        info!(location = %location, "selected x86 stage1 location");

        let devices = match self.location_device(&location) {
            Some(target) => self
                .resolver
                .resolve(&target)?
                .iter()
                .map(|dev| self.names.to_stable_name(dev))
                .collect(),
            None => Vec::new(),
        };

        if location == Location::Mbr {
            // With our own MBR code the active flag does not matter for
            // booting Linux, so an already active partition (e.g. Windows)
            // stays as it is.
            let mbr_disk = self.layout.mbr_disk.clone();
            let activate = !self.any_active_partition(&mbr_disk)?;
            Ok(Proposal {
                location,
                devices,
                activate,
                generic_boot_code: false,
            })
        } else {
            // Stage1 on a partition: a generic MBR chain-loads the active one.
            Ok(Proposal {
                location,
                devices,
                activate: true,
                generic_boot_code: true,
            })
        }
    }

    fn propose_boot_location(&mut self) -> Result<Location> {
        let separated = self.layout.separated_boot();
        let mut location = Location::Mbr;

        if self.boot_on_mbr_disk()? {
            location = if separated {
                Location::Boot
            } else {
                Location::Root
            };
        }

        let facts = self.boot_facts()?;
        if facts.logical && self.layout.extended.is_some() {
            info!("/boot is on a logical partition, proposing the extended partition");
            location = Location::Extended;
        }

        if facts.copy_on_write && (facts.logical || separated) {
            info!("/boot is btrfs on a logical or separate partition, proposing mbr");
            location = Location::Mbr;
        }

        if !self.can_use_boot()? {
            location = Location::Mbr;
        }

        Ok(location)
    }

    pub(super) fn boot_facts(&mut self) -> Result<BootFacts> {
        let boot = self.layout.boot.clone();
        let mut devices: Vec<DeviceId> = vec![boot.clone()];
        devices.extend(self.resolver.resolve(&boot)?);

        let mut facts = BootFacts::default();
        for device in devices {
            let descriptor = self.inventory.disk_partition_info(&device)?;
            facts.logical |= descriptor.kind == PartitionKind::Logical;
            facts.copy_on_write |= descriptor
                .filesystem
                .as_ref()
                .is_some_and(|fs| fs.is_copy_on_write());
        }
        Ok(facts)
    }

    /// Whether a device beneath `/boot` sits on the MBR disk.
    fn boot_on_mbr_disk(&mut self) -> Result<bool> {
        let boot = self.layout.boot.clone();
        let disks = self.resolver.underlying_disks(&boot)?;
        Ok(disks.contains(&self.layout.mbr_disk))
    }

    fn any_active_partition(&mut self, disk: &str) -> Result<bool> {
        for disk in self.resolver.underlying_disks(disk)? {
            if let Some(active) = self.inventory.active_partition_of(&disk)? {
                info!(disk = %disk, partition = %active, "disk already has an active partition");
                return Ok(true);
            }
        }
        Ok(false)
    }
}
