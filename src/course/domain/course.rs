//! Course, category, and archive handle value types.

use super::{CategoryId, CourseId};
use crate::storage::domain::{ArchiveFilename, LocalArtifact};
use serde::{Deserialize, Serialize};

/// Snapshot of a course as reported by the host platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    /// Course identifier.
    pub id: CourseId,
    /// Full display name.
    pub full_name: String,
    /// Unique short name.
    pub short_name: String,
    /// Category the course belongs to.
    pub category_id: CategoryId,
    /// Whether learners can see the course.
    pub visible: bool,
}

/// Snapshot of a course category as reported by the host platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Category identifier.
    pub id: CategoryId,
    /// Display name.
    pub name: String,
}

impl Category {
    /// Creates a category snapshot.
    #[must_use]
    pub fn new(id: CategoryId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// A freshly produced course archive awaiting transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveHandle {
    filename: ArchiveFilename,
    artifact: LocalArtifact,
}

impl ArchiveHandle {
    /// Pairs an archive name with its local content.
    #[must_use]
    pub const fn new(filename: ArchiveFilename, artifact: LocalArtifact) -> Self {
        Self { filename, artifact }
    }

    /// Returns the archive name used as the storage key.
    #[must_use]
    pub const fn filename(&self) -> &ArchiveFilename {
        &self.filename
    }

    /// Returns the local archive content.
    #[must_use]
    pub const fn artifact(&self) -> &LocalArtifact {
        &self.artifact
    }
}
