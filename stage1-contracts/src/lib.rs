// SPDX-License-Identifier: GPL-3.0-only

pub mod error;
pub mod traits;

pub use error::{Result, Stage1Error, Stage1ErrorKind};
pub use traits::{BootInstaller, DeviceNames, IdentityNames, Stage1Store, StorageInventory};
