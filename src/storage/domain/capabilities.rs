//! Storage backend capability metadata.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single operation a storage backend may support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageCapability {
    /// Fetch an archive into a local artifact.
    Pull,
    /// Upload a completed archive.
    Push,
    /// Remove an archive.
    Delete,
    /// Check whether an archive is present.
    Exists,
}

impl StorageCapability {
    /// Returns the canonical lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pull => "pull",
            Self::Push => "push",
            Self::Delete => "delete",
            Self::Exists => "exists",
        }
    }
}

impl fmt::Display for StorageCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The set of operations a storage backend supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StorageCapabilities {
    pull: bool,
    push: bool,
    delete: bool,
    exists: bool,
}

impl StorageCapabilities {
    /// Returns an empty capability set.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            pull: false,
            push: false,
            delete: false,
            exists: false,
        }
    }

    /// Returns a capability set supporting every operation.
    #[must_use]
    pub const fn all() -> Self {
        Self {
            pull: true,
            push: true,
            delete: true,
            exists: true,
        }
    }

    /// Returns a capability set for a backend that can only receive
    /// archives.
    #[must_use]
    pub const fn push_only() -> Self {
        Self::none().with(StorageCapability::Push)
    }

    /// Adds a capability to the set.
    #[must_use]
    pub const fn with(mut self, capability: StorageCapability) -> Self {
        match capability {
            StorageCapability::Pull => self.pull = true,
            StorageCapability::Push => self.push = true,
            StorageCapability::Delete => self.delete = true,
            StorageCapability::Exists => self.exists = true,
        }
        self
    }

    /// Removes a capability from the set.
    #[must_use]
    pub const fn without(mut self, capability: StorageCapability) -> Self {
        match capability {
            StorageCapability::Pull => self.pull = false,
            StorageCapability::Push => self.push = false,
            StorageCapability::Delete => self.delete = false,
            StorageCapability::Exists => self.exists = false,
        }
        self
    }

    /// Returns whether the capability is in the set.
    #[must_use]
    pub const fn supports(self, capability: StorageCapability) -> bool {
        match capability {
            StorageCapability::Pull => self.pull,
            StorageCapability::Push => self.push,
            StorageCapability::Delete => self.delete,
            StorageCapability::Exists => self.exists,
        }
    }
}
