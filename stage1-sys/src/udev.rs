// SPDX-License-Identifier: GPL-3.0-only

//! Kernel name <-> udev alias mapping from `/dev/disk/by-*` symlinks.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path, PathBuf};

use stage1_contracts::DeviceNames;
use stage1_types::DeviceId;
use tracing::{debug, warn};

use crate::error::{Result, SysError};

pub const DEFAULT_UDEV_ROOT: &str = "/dev/disk";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UdevNamespace {
    Id,
    Path,
    Uuid,
    Label,
}

impl UdevNamespace {
    pub const DEFAULT_PRIORITY: [UdevNamespace; 4] = [Self::Id, Self::Path, Self::Uuid, Self::Label];

    pub fn dir_name(self) -> &'static str {
        match self {
            Self::Id => "by-id",
            Self::Path => "by-path",
            Self::Uuid => "by-uuid",
            Self::Label => "by-label",
        }
    }
}

#[derive(Debug, Clone)]
pub struct UdevMapping {
    /// alias -> kernel name, per namespace
    aliases: Vec<(UdevNamespace, BTreeMap<DeviceId, DeviceId>)>,

    /// Unknown aliases are resolved on the live `/dev/disk`, which is only
    /// right when that is the tree that was scanned.
    follow_system_links: bool,
}

impl UdevMapping {
    /// Scan the system udev tree.
    pub fn system() -> Result<Self> {
        Self::scan(Path::new(DEFAULT_UDEV_ROOT), &UdevNamespace::DEFAULT_PRIORITY)
    }

    /// Scan `root` (normally `/dev/disk`), preferring namespaces in `priority`
    /// order when choosing a stable name.
    pub fn scan(root: &Path, priority: &[UdevNamespace]) -> Result<Self> {
        let mut aliases = Vec::new();
        for namespace in priority {
            let dir = root.join(namespace.dir_name());
            let table = match read_namespace(&dir, *namespace) {
                Ok(table) => table,
                Err(SysError::PathIo { source, .. })
                    if source.kind() == std::io::ErrorKind::NotFound =>
                {
                    debug!(dir = %dir.display(), "udev namespace not present");
                    BTreeMap::new()
                }
                Err(error) => return Err(error),
            };
            aliases.push((*namespace, table));
        }
        Ok(Self {
            aliases,
            follow_system_links: root == Path::new(DEFAULT_UDEV_ROOT),
        })
    }

    pub fn follows_system_links(&self) -> bool {
        self.follow_system_links
    }

    pub fn alias_count(&self) -> usize {
        self.aliases.iter().map(|(_, table)| table.len()).sum()
    }
}

fn read_namespace(dir: &Path, namespace: UdevNamespace) -> Result<BTreeMap<DeviceId, DeviceId>> {
    let mut table = BTreeMap::new();
    let entries = fs::read_dir(dir).map_err(|error| SysError::path_io(dir, error))?;

    for entry in entries.flatten() {
        let path = entry.path();
        let Ok(target) = fs::read_link(&path) else {
            continue;
        };
        let target = if target.is_absolute() {
            target
        } else {
            normalize_lexically(&dir.join(target))
        };
        let Some(kernel) = target.file_name() else {
            warn!(link = %path.display(), "udev link without target name");
            continue;
        };

        let alias = format!(
            "{DEFAULT_UDEV_ROOT}/{}/{}",
            namespace.dir_name(),
            entry.file_name().to_string_lossy()
        );
        let kernel = format!("/dev/{}", kernel.to_string_lossy());
        table.insert(alias, kernel);
    }

    Ok(table)
}

fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::ParentDir => {
                out.pop();
            }
            Component::CurDir => {}
            other => out.push(other.as_os_str()),
        }
    }
    out
}

fn canonicalize_best_effort(device: &str) -> Option<String> {
    fs::canonicalize(device)
        .ok()
        .map(|c| c.to_string_lossy().to_string())
}

impl DeviceNames for UdevMapping {
    fn to_kernel_name(&self, device: &str) -> DeviceId {
        for (_, table) in &self.aliases {
            if let Some(kernel) = table.get(device) {
                return kernel.clone();
            }
        }

        if self.follow_system_links
            && device.starts_with(DEFAULT_UDEV_ROOT)
            && let Some(canonical) = canonicalize_best_effort(device)
        {
            return canonical;
        }

        device.to_string()
    }

    fn to_stable_name(&self, device: &str) -> DeviceId {
        let kernel = self.to_kernel_name(device);
        for (_, table) in &self.aliases {
            if let Some((alias, _)) = table.iter().find(|(_, target)| **target == kernel) {
                return alias.clone();
            }
        }
        kernel
    }
}
