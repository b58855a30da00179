//! Restore lifecycle events.

use crate::course::domain::{CategoryId, CourseId};
use crate::migration::domain::MigrationId;
use crate::storage::domain::ArchiveFilename;
use serde::{Deserialize, Serialize};

/// Event emitted at a well-defined point of a restore execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum MigrationEvent {
    /// A restore finished and the new course is in place.
    RestoreCompleted {
        /// Record that completed.
        migration_id: MigrationId,
        /// Newly created course.
        course_id: CourseId,
        /// Full name of the new course.
        course_name: String,
        /// Category the course was restored into.
        destination_category_id: CategoryId,
        /// Name of that category.
        destination_category_name: String,
        /// Archive restored from.
        filename: ArchiveFilename,
    },
    /// A restore execution failed.
    RestoreFailed {
        /// Record that failed; absent when the record could not be loaded.
        migration_id: Option<MigrationId>,
        /// Composite failure text.
        error: String,
        /// Archive name; absent when the record could not be loaded.
        filename: Option<ArchiveFilename>,
    },
}

impl MigrationEvent {
    /// Returns the event name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::RestoreCompleted { .. } => "restore_completed",
            Self::RestoreFailed { .. } => "restore_failed",
        }
    }

    /// Returns the human-readable description.
    #[must_use]
    pub fn description(&self) -> String {
        match self {
            Self::RestoreCompleted {
                course_id,
                course_name,
                destination_category_id,
                destination_category_name,
                ..
            } => format!(
                "Restoring course '{course_name}' (id: {course_id}) is successfully completed \
                 into category '{destination_category_name}' (id: {destination_category_id})."
            ),
            Self::RestoreFailed { error, .. } => {
                format!("Restoring course is failed. Error: {error}")
            }
        }
    }

    /// Returns the archive filename as carried in the payload; empty when
    /// the failing execution never resolved one.
    #[must_use]
    pub fn filename(&self) -> &str {
        match self {
            Self::RestoreCompleted { filename, .. } => filename.as_str(),
            Self::RestoreFailed { filename, .. } => {
                filename.as_ref().map_or("", ArchiveFilename::as_str)
            }
        }
    }
}
