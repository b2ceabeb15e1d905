// SPDX-License-Identifier: GPL-3.0-only

pub mod installer;
pub mod inventory;
pub mod names;
pub mod store;

pub use installer::BootInstaller;
pub use inventory::StorageInventory;
pub use names::{DeviceNames, IdentityNames};
pub use store::Stage1Store;
