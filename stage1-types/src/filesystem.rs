//! Filesystem kinds relevant to stage1 placement

use std::fmt;

use serde::{Deserialize, Serialize};

/// Filesystem found on a block device.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FilesystemType {
    Ext2,
    Ext3,
    Ext4,
    Xfs,
    Btrfs,
    Vfat,
    Swap,
    Nfs,
    Other(String),
}

impl FilesystemType {
    /// Whether the filesystem leaves room in its first sectors for stage1.
    ///
    /// XFS puts its superblock in sector 0 and has no reserved area.
    pub fn can_embed_stage1(&self) -> bool {
        !matches!(self, Self::Xfs)
    }

    /// Filesystems created on Linux partition types. Swap, FAT and foreign
    /// or unknown filesystems are not.
    pub fn is_linux_native(&self) -> bool {
        matches!(
            self,
            Self::Ext2 | Self::Ext3 | Self::Ext4 | Self::Xfs | Self::Btrfs
        )
    }

    pub fn is_copy_on_write(&self) -> bool {
        matches!(self, Self::Btrfs)
    }

    pub fn is_network(&self) -> bool {
        matches!(self, Self::Nfs)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Ext2 => "ext2",
            Self::Ext3 => "ext3",
            Self::Ext4 => "ext4",
            Self::Xfs => "xfs",
            Self::Btrfs => "btrfs",
            Self::Vfat => "vfat",
            Self::Swap => "swap",
            Self::Nfs => "nfs",
            Self::Other(name) => name,
        }
    }
}

impl From<&str> for FilesystemType {
    fn from(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "ext2" => Self::Ext2,
            "ext3" => Self::Ext3,
            "ext4" => Self::Ext4,
            "xfs" => Self::Xfs,
            "btrfs" => Self::Btrfs,
            "vfat" | "fat" | "fat32" => Self::Vfat,
            "swap" => Self::Swap,
            "nfs" | "nfs4" => Self::Nfs,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for FilesystemType {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<FilesystemType> for String {
    fn from(value: FilesystemType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for FilesystemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
