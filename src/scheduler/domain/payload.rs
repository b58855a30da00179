//! Typed payloads carried by queued tasks.

use crate::course::domain::{CategoryId, CourseId};
use crate::migration::domain::MigrationId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Errors raised while decoding task payloads.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PayloadError {
    /// A required key is absent.
    #[error("missing required parameter '{0}'")]
    Missing(&'static str),

    /// The payload does not match the expected shape.
    #[error("malformed payload: {0}")]
    Malformed(String),
}

/// Payload of a restore execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestorePayload {
    /// Record to restore.
    #[serde(alias = "migrationRecordId", alias = "coursemigrationid")]
    pub migration_id: MigrationId,
}

impl RestorePayload {
    const KEYS: [&'static str; 3] = ["migration_id", "migrationRecordId", "coursemigrationid"];

    /// Decodes the payload from raw task data.
    ///
    /// # Errors
    ///
    /// Returns [`PayloadError::Missing`] when no record identifier key is
    /// present and [`PayloadError::Malformed`] when it is not a valid
    /// identifier.
    pub fn from_custom_data(data: &Value) -> Result<Self, PayloadError> {
        let present = data
            .as_object()
            .is_some_and(|map| Self::KEYS.iter().any(|key| map.contains_key(*key)));
        if !present {
            return Err(PayloadError::Missing("migration_id"));
        }
        serde_json::from_value(data.clone()).map_err(|err| PayloadError::Malformed(err.to_string()))
    }
}

/// Payload of a backup execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupPayload {
    /// Course to archive.
    pub course_id: CourseId,
    /// Category the archive will be restored into.
    pub destination_category_id: CategoryId,
}

/// Payload of an orphaned-course cleanup execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupPayload {
    /// Course to delete.
    #[serde(alias = "courseid")]
    pub course_id: CourseId,
}
