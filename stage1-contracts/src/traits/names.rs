// SPDX-License-Identifier: GPL-3.0-only

use stage1_types::DeviceId;

/// Mapping between kernel device names and stable udev aliases.
///
/// Both directions are total: a name without a mapping is returned unchanged.
pub trait DeviceNames: Send + Sync {
    fn to_kernel_name(&self, device: &str) -> DeviceId;

    fn to_stable_name(&self, device: &str) -> DeviceId;

    fn same_device(&self, a: &str, b: &str) -> bool {
        self.to_kernel_name(a) == self.to_kernel_name(b)
    }
}

/// Names are used as given.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityNames;

impl DeviceNames for IdentityNames {
    fn to_kernel_name(&self, device: &str) -> DeviceId {
        device.to_string()
    }

    fn to_stable_name(&self, device: &str) -> DeviceId {
        device.to_string()
    }
}
