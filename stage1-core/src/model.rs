// SPDX-License-Identifier: GPL-3.0-only

//! Where stage1 is installed
//!
//! The model keeps install targets in insertion order; the installer is run
//! once per target in that order. No two targets share a kernel device name.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use stage1_contracts::{DeviceNames, Result, Stage1Store};
use stage1_types::{DeviceId, Proposal, Stage1Config};
use tracing::{debug, info};

use crate::TopologyResolver;

pub struct Stage1Model {
    config: Stage1Config,
    names: Arc<dyn DeviceNames>,
}

impl Stage1Model {
    pub fn new(names: Arc<dyn DeviceNames>) -> Self {
        Self {
            config: Stage1Config::default(),
            names,
        }
    }

    /// Build a model from persisted state, dropping aliased duplicates.
    pub fn from_config(config: Stage1Config, names: Arc<dyn DeviceNames>) -> Self {
        let mut model = Self::new(names);
        model.assign(config);
        model
    }

    pub fn devices(&self) -> &[DeviceId] {
        &self.config.devices
    }

    pub fn activate(&self) -> bool {
        self.config.activate
    }

    pub fn set_activate(&mut self, value: bool) {
        self.config.activate = value;
    }

    pub fn generic_boot_code(&self) -> bool {
        self.config.generic_boot_code
    }

    pub fn set_generic_boot_code(&mut self, value: bool) {
        self.config.generic_boot_code = value;
    }

    pub fn config(&self) -> &Stage1Config {
        &self.config
    }

    pub fn is_empty(&self) -> bool {
        self.config.devices.is_empty()
    }

    /// Append `device` unless an entry already names the same kernel device.
    ///
    /// Returns whether the device was added.
    pub fn add(&mut self, device: &str) -> bool {
        if self.position(device).is_some() {
            debug!(device, "stage1 device already present");
            return false;
        }
        self.config.devices.push(device.to_string());
        true
    }

    /// Remove the entry naming the same kernel device as `device`.
    pub fn remove(&mut self, device: &str) -> Option<DeviceId> {
        self.position(device)
            .map(|index| self.config.devices.remove(index))
    }

    pub fn clear(&mut self) {
        self.config.devices.clear();
    }

    /// Whether stage1 covers every physical device `device` rests on.
    ///
    /// An entry covers a physical device when it names it directly or
    /// resolves to it, so a disk counts as covered by a volume group or md
    /// array spanning it.
    pub fn contains(&self, device: &str, resolver: &mut TopologyResolver) -> Result<bool> {
        let wanted = resolver.resolve(device)?;

        let mut covered = BTreeSet::new();
        for entry in &self.config.devices {
            covered.insert(self.names.to_kernel_name(entry));
            covered.extend(resolver.resolve(entry)?);
        }

        Ok(wanted.iter().all(|dev| covered.contains(dev)))
    }

    /// Replace devices and flags with the outcome of a proposal.
    pub fn apply(&mut self, proposal: Proposal) {
        info!(location = %proposal.location, devices = ?proposal.devices, "applying stage1 proposal");
        self.assign(proposal.into_config());
    }

    pub fn load(&mut self, store: &dyn Stage1Store) -> Result<()> {
        let config = store.load()?;
        self.assign(config);
        debug!(model = ?self, "loaded stage1 configuration");
        Ok(())
    }

    pub fn save(&self, store: &dyn Stage1Store) -> Result<()> {
        store.save(&self.config)
    }

    fn assign(&mut self, config: Stage1Config) {
        self.clear();
        for device in &config.devices {
            self.add(device);
        }
        self.config.activate = config.activate;
        self.config.generic_boot_code = config.generic_boot_code;
    }

    fn position(&self, device: &str) -> Option<usize> {
        let kernel = self.names.to_kernel_name(device);
        self.config
            .devices
            .iter()
            .position(|entry| self.names.to_kernel_name(entry) == kernel)
    }
}

impl fmt::Debug for Stage1Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stage1Model")
            .field("activate", &self.config.activate)
            .field("generic_boot_code", &self.config.generic_boot_code)
            .field("devices", &self.config.devices)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    use super::*;
    use stage1_contracts::Stage1Error;
    use stage1_types::Location;

    struct AliasNames(BTreeMap<&'static str, &'static str>);

    impl DeviceNames for AliasNames {
        fn to_kernel_name(&self, device: &str) -> DeviceId {
            self.0.get(device).copied().unwrap_or(device).to_string()
        }

        fn to_stable_name(&self, device: &str) -> DeviceId {
            device.to_string()
        }
    }

    fn names() -> Arc<dyn DeviceNames> {
        Arc::new(AliasNames(BTreeMap::from([
            ("/dev/disk/by-id/ata-one", "/dev/sda"),
            ("/dev/disk/by-path/pci-0000:00:1f.2-ata-1", "/dev/sda"),
            ("/dev/disk/by-id/ata-one-part1", "/dev/sda1"),
        ])))
    }

    #[derive(Default)]
    struct MemoryStore(Mutex<Stage1Config>);

    impl Stage1Store for MemoryStore {
        fn load(&self) -> stage1_contracts::Result<Stage1Config> {
            Ok(self.0.lock().map_err(|e| Stage1Error::store(e.to_string()))?.clone())
        }

        fn save(&self, config: &Stage1Config) -> stage1_contracts::Result<()> {
            *self.0.lock().map_err(|e| Stage1Error::store(e.to_string()))? = config.clone();
            Ok(())
        }
    }

    #[test]
    fn add_ignores_aliases_of_present_device() {
        let mut model = Stage1Model::new(names());
        assert!(model.add("/dev/disk/by-id/ata-one"));
        assert!(!model.add("/dev/disk/by-path/pci-0000:00:1f.2-ata-1"));
        assert!(!model.add("/dev/sda"));
        assert!(model.add("/dev/sda1"));
        assert_eq!(
            model.devices(),
            ["/dev/disk/by-id/ata-one".to_string(), "/dev/sda1".to_string()]
        );
    }

    #[test]
    fn remove_matches_by_kernel_name() {
        let mut model = Stage1Model::new(names());
        model.add("/dev/disk/by-id/ata-one-part1");
        model.add("/dev/sdb");
        assert_eq!(
            model.remove("/dev/sda1").as_deref(),
            Some("/dev/disk/by-id/ata-one-part1")
        );
        assert_eq!(model.remove("/dev/sda1"), None);
        assert_eq!(model.devices(), ["/dev/sdb".to_string()]);
    }

    #[test]
    fn from_config_drops_duplicates() {
        let config = Stage1Config {
            devices: vec![
                "/dev/sda".to_string(),
                "/dev/disk/by-id/ata-one".to_string(),
            ],
            activate: true,
            generic_boot_code: true,
        };
        let model = Stage1Model::from_config(config, names());
        assert_eq!(model.devices(), ["/dev/sda".to_string()]);
        assert!(model.activate());
        assert!(model.generic_boot_code());
    }

    #[test]
    fn apply_replaces_previous_state() {
        let mut model = Stage1Model::new(names());
        model.add("/dev/sdc");
        model.set_activate(true);
        model.apply(Proposal {
            location: Location::Mbr,
            devices: vec!["/dev/sda".to_string()],
            activate: false,
            generic_boot_code: false,
        });
        assert_eq!(model.devices(), ["/dev/sda".to_string()]);
        assert!(!model.activate());
    }

    #[test]
    fn save_then_load_restores_state() {
        let store = MemoryStore::default();
        let mut model = Stage1Model::new(names());
        model.add("/dev/disk/by-id/ata-one");
        model.set_generic_boot_code(true);
        model.save(&store).unwrap();

        let mut loaded = Stage1Model::new(names());
        loaded.load(&store).unwrap();
        assert_eq!(loaded.config(), model.config());
    }
}
