// SPDX-License-Identifier: GPL-3.0-only

//! Stage1 placement policy
//!
//! `propose` computes a complete [`Proposal`] for the architecture first and
//! only then assigns it to the model, so a failing branch leaves the model
//! untouched.

mod ppc;
mod x86;

use std::sync::Arc;

use stage1_contracts::{DeviceNames, Result, Stage1Error, StorageInventory};
use stage1_types::{
    Architecture, DeviceId, DiskKind, Location, PartitionKind, PartitionTableLabel, Proposal,
};
use tracing::{debug, info};

use crate::{BootLayout, Stage1Model, TopologyResolver};

pub struct Stage1Policy {
    arch: Architecture,
    inventory: Arc<dyn StorageInventory>,
    names: Arc<dyn DeviceNames>,
    layout: BootLayout,
    resolver: TopologyResolver,
}

impl Stage1Policy {
    pub fn new(
        arch: Architecture,
        inventory: Arc<dyn StorageInventory>,
        names: Arc<dyn DeviceNames>,
    ) -> Result<Self> {
        let layout = BootLayout::detect(inventory.as_ref(), names.as_ref())?;
        let resolver = TopologyResolver::new(inventory.clone(), names.clone())
            .with_boot_partition(&layout.boot);

        Ok(Self {
            arch,
            inventory,
            names,
            layout,
            resolver,
        })
    }

    pub fn arch(&self) -> Architecture {
        self.arch
    }

    pub fn layout(&self) -> &BootLayout {
        &self.layout
    }

    pub fn resolver(&mut self) -> &mut TopologyResolver {
        &mut self.resolver
    }

    /// Use a disk other than the boot disk for MBR placement.
    pub fn set_mbr_disk(&mut self, disk: &str) {
        self.layout.mbr_disk = self.names.to_kernel_name(disk);
    }

    /// Re-read the boot layout and forget cached resolutions.
    ///
    /// Needed after storage changes within a session. A custom MBR disk is
    /// kept when it still differs from the boot disk.
    pub fn refresh(&mut self) -> Result<()> {
        let custom_mbr = (self.layout.mbr_disk != self.layout.boot_disk)
            .then(|| self.layout.mbr_disk.clone());

        self.layout = BootLayout::detect(self.inventory.as_ref(), self.names.as_ref())?;
        if let Some(disk) = custom_mbr {
            self.layout.mbr_disk = disk;
        }
        self.resolver.set_boot_partition(Some(&self.layout.boot));
        Ok(())
    }

    /// Decide where stage1 goes and assign it to `model`.
    pub fn propose(&mut self, model: &mut Stage1Model) -> Result<Proposal> {
        let proposal = self.proposal()?;
        model.apply(proposal.clone());
        info!(arch = %self.arch, model = ?model, "proposed stage1 configuration");
        Ok(proposal)
    }

    /// Decision without touching any model.
    pub fn proposal(&mut self) -> Result<Proposal> {
        match self.arch {
            Architecture::X86Bios | Architecture::X86Efi | Architecture::I386Efi => {
                self.propose_x86()
            }
            Architecture::Ppc | Architecture::PpcPowernv => self.propose_ppc(),
            // zipl writes to a location fixed by the platform.
            Architecture::S390 => Ok(Proposal::none()),
            arch @ (Architecture::Aarch64Efi | Architecture::Unsupported) => {
                Err(Stage1Error::UnsupportedArchitecture { arch })
            }
        }
    }

    /// Whether the boot filesystem can hold stage1.
    pub fn can_use_boot(&self) -> Result<bool> {
        let descriptor = self.inventory.disk_partition_info(&self.layout.boot)?;
        let usable = descriptor
            .filesystem
            .as_ref()
            .is_none_or(|fs| fs.can_embed_stage1());
        if !usable {
            info!(boot = %self.layout.boot, "boot filesystem has no room for stage1");
        }
        Ok(usable)
    }

    /// Symbolic locations offered for manual choice, with their devices.
    pub fn available_locations(&mut self) -> Result<Vec<(Location, DeviceId)>> {
        let mut locations = Vec::new();
        if !self.arch.is_x86() {
            info!(arch = %self.arch, "no non-custom stage1 locations");
            return Ok(locations);
        }

        if self.can_use_boot()? {
            if self.layout.separated_boot() {
                locations.push((Location::Boot, self.layout.boot.clone()));
            } else {
                locations.push((Location::Root, self.layout.root.clone()));
            }
            if self.boot_facts()?.logical
                && let Some(extended) = &self.layout.extended
            {
                locations.push((Location::Extended, extended.clone()));
            }
        }
        locations.push((Location::Mbr, self.layout.mbr_disk.clone()));
        Ok(locations)
    }

    /// Devices stage1 could be written to when chosen by hand.
    ///
    /// Partitions come first, then disks. A partition qualifies when it is
    /// primary, extended, logical or software RAID, is not being deleted, is
    /// no PReP partition, and is either unformatted or holds a Linux
    /// filesystem with room for stage1.
    pub fn possible_locations(&self) -> Result<Vec<DeviceId>> {
        let partitions = self.inventory.partitions()?.into_iter().filter(|part| {
            let kind_fits = matches!(
                part.kind,
                PartitionKind::Primary
                    | PartitionKind::Extended
                    | PartitionKind::Logical
                    | PartitionKind::SwRaid
            );
            let fs_fits = part
                .filesystem
                .as_ref()
                .is_none_or(|fs| fs.is_linux_native() && fs.can_embed_stage1());
            kind_fits && fs_fits && !part.deleted && !part.prep
        });
        let disks = self
            .inventory
            .disks()?
            .into_iter()
            .filter(|disk| matches!(disk.kind, DiskKind::Disk | DiskKind::DmRaid));

        let locations: Vec<DeviceId> = partitions
            .map(|part| part.device)
            .chain(disks.map(|disk| disk.device))
            .filter(|device| !device.is_empty())
            .collect();
        debug!(?locations, "possible stage1 locations");
        Ok(locations)
    }

    /// Whether the bootloader can be installed with `/boot` where it is.
    ///
    /// On x86 a software RAID `/boot` has to be a mirror; other levels
    /// stripe the boot code across members.
    pub fn bootloader_installable(&self) -> Result<bool> {
        if !self.arch.is_x86() || self.layout.network_boot {
            return Ok(true);
        }

        let descriptor = self.inventory.disk_partition_info(&self.layout.boot)?;
        if descriptor.kind != PartitionKind::SwRaid {
            return Ok(true);
        }

        let md = self.inventory.partition_info(&self.layout.boot)?;
        if !md.is_mirror() {
            info!(
                boot = %self.layout.boot,
                raid_type = ?md.raid_type,
                "cannot install bootloader on non-mirrored RAID"
            );
            return Ok(false);
        }
        Ok(true)
    }

    pub fn is_mbr(&mut self, model: &Stage1Model) -> Result<bool> {
        let disk = self.layout.mbr_disk.clone();
        model.contains(&disk, &mut self.resolver)
    }

    pub fn is_boot_partition(&mut self, model: &Stage1Model) -> Result<bool> {
        let boot = self.layout.boot.clone();
        model.contains(&boot, &mut self.resolver)
    }

    pub fn is_root_partition(&mut self, model: &Stage1Model) -> Result<bool> {
        let root = self.layout.root.clone();
        model.contains(&root, &mut self.resolver)
    }

    pub fn is_extended_partition(&mut self, model: &Stage1Model) -> Result<bool> {
        match self.layout.extended.clone() {
            Some(extended) => model.contains(&extended, &mut self.resolver),
            None => Ok(false),
        }
    }

    /// Model entries that are none of boot, root, MBR disk or extended partition.
    pub fn custom_devices(&self, model: &Stage1Model) -> Vec<DeviceId> {
        let known = [
            Some(&self.layout.boot),
            Some(&self.layout.root),
            Some(&self.layout.mbr_disk),
            self.layout.extended.as_ref(),
        ];
        model
            .devices()
            .iter()
            .filter(|dev| {
                let kernel = self.names.to_kernel_name(dev);
                !known.iter().flatten().any(|k| **k == kernel)
            })
            .cloned()
            .collect()
    }

    /// Whether stage1 goes to a GPT disk, in which case the protective MBR
    /// boot flag has to be removed for legacy boot.
    pub fn gpt_boot_disk(&self, model: &Stage1Model) -> Result<bool> {
        if self.arch.is_efi() {
            return Ok(true);
        }
        for device in model.devices() {
            let disk = self.resolver.containing_disk(device)?;
            if self.inventory.disk_info(&disk)?.label == Some(PartitionTableLabel::Gpt) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Kernel name of the device a symbolic location stands for.
    fn location_device(&self, location: &Location) -> Option<DeviceId> {
        match location {
            Location::Mbr => Some(self.layout.mbr_disk.clone()),
            Location::Boot => Some(self.layout.boot.clone()),
            Location::Root => Some(self.layout.root.clone()),
            Location::Extended => self.layout.extended.clone(),
            Location::Custom(device) => Some(device.clone()),
            Location::None => None,
        }
    }
}

impl std::fmt::Debug for Stage1Policy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stage1Policy")
            .field("arch", &self.arch)
            .field("layout", &self.layout)
            .field("resolver", &self.resolver)
            .finish()
    }
}
