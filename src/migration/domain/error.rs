//! Error types for migration record validation and parsing.

use super::{MigrationId, MigrationStatus};
use crate::course::domain::CourseId;
use thiserror::Error;

/// Errors returned while mutating migration records.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MigrationDomainError {
    /// The requested status change is not permitted by the lifecycle.
    #[error("migration {id} cannot move from {from} to {to}")]
    InvalidStateTransition {
        /// Migration identifier.
        id: MigrationId,
        /// Current status.
        from: MigrationStatus,
        /// Requested status.
        to: MigrationStatus,
    },

    /// A restored course is already linked to the record.
    #[error("migration {id} is already linked to course {course_id}")]
    CourseAlreadyAssigned {
        /// Migration identifier.
        id: MigrationId,
        /// Course already linked.
        course_id: CourseId,
    },
}

/// Error returned while parsing migration statuses from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown migration status: {0}")]
pub struct ParseMigrationStatusError(pub String);

/// Error returned while parsing migration actions from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown migration action: {0}")]
pub struct ParseMigrationActionError(pub String);
