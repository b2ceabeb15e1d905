// SPDX-License-Identifier: GPL-3.0-only

//! Stage1 bootloader placement
//!
//! Three layers, bottom-up:
//!
//! - [`TopologyResolver`] unwraps RAID, LVM and encryption layers down to the
//!   physical devices a block device rests on.
//! - [`Stage1Model`] holds the ordered, duplicate-free set of install targets
//!   and the `activate` / `generic_boot_code` flags.
//! - [`Stage1Policy`] decides, per architecture, where stage1 goes and assigns
//!   the result to the model in one step.
//!
//! [`InstallPlan`] turns the decision into installer invocations.

pub mod install;
pub mod layout;
pub mod model;
pub mod policy;
pub mod resolver;

pub use install::{InstallPlan, target_platform};
pub use layout::BootLayout;
pub use model::Stage1Model;
pub use policy::Stage1Policy;
pub use resolver::{MAX_STACK_DEPTH, TopologyResolver};
