// SPDX-License-Identifier: GPL-3.0-only

use stage1_contracts::{Result, Stage1Error};
use stage1_types::{Architecture, DeviceId, Location, Proposal};
use tracing::info;

use super::Stage1Policy;

impl Stage1Policy {
    pub(super) fn propose_ppc(&mut self) -> Result<Proposal> {
        if let Some(partition) = self.proposed_prep_partition()? {
            // Taken verbatim, without alias mapping.
            return Ok(Proposal {
                location: Location::Custom(partition.clone()),
                devices: vec![partition],
                activate: true,
                generic_boot_code: false,
            });
        }

        if self.layout.network_boot {
            info!(boot = %self.layout.boot, "diskless client, no stage1 written");
            return Ok(Proposal::none());
        }

        if self.arch == Architecture::PpcPowernv {
            info!("PowerNV boots without a PReP partition");
            return Ok(Proposal::none());
        }

        Err(Stage1Error::NoBootLocation)
    }

    fn proposed_prep_partition(&self) -> Result<Option<DeviceId>> {
        let partitions = self.inventory.prep_partitions()?;

        for part in &partitions {
            if self.inventory.partition_info(part)?.created {
                info!(partition = %part, "using freshly created PReP partition");
                return Ok(Some(part.clone()));
            }
        }

        for part in &partitions {
            let descriptor = self.inventory.disk_partition_info(part)?;
            if descriptor
                .disk
                .is_some_and(|disk| self.names.to_kernel_name(&disk) == self.layout.boot_disk)
            {
                info!(partition = %part, "using PReP partition on the boot disk");
                return Ok(Some(part.clone()));
            }
        }

        let first = partitions.into_iter().next();
        if let Some(part) = &first {
            info!(partition = %part, "using first available PReP partition");
        }
        Ok(first)
    }
}
