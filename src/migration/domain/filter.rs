//! Report queries over migration records.

use super::{MigrationAction, MigrationRecord, MigrationStatus};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Selection criteria for migration reports.
///
/// Results are ordered newest first. An empty filter matches every record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationFilter {
    /// Restrict to one action.
    pub action: Option<MigrationAction>,
    /// Restrict to one status.
    pub status: Option<MigrationStatus>,
    /// Include records created at or after this instant.
    pub created_from: Option<DateTime<Utc>>,
    /// Include records created strictly before this instant.
    pub created_until: Option<DateTime<Utc>>,
    /// Maximum number of records to return.
    pub limit: Option<usize>,
    /// Number of matching records to skip.
    pub offset: usize,
}

impl MigrationFilter {
    /// Creates a filter matching every record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts the filter to one action.
    #[must_use]
    pub const fn with_action(mut self, action: MigrationAction) -> Self {
        self.action = Some(action);
        self
    }

    /// Restricts the filter to one status.
    #[must_use]
    pub const fn with_status(mut self, status: MigrationStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Restricts the filter to a creation window.
    #[must_use]
    pub const fn created_between(
        mut self,
        from: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
    ) -> Self {
        self.created_from = from;
        self.created_until = until;
        self
    }

    /// Selects one page of results.
    #[must_use]
    pub const fn page(mut self, offset: usize, limit: usize) -> Self {
        self.offset = offset;
        self.limit = Some(limit);
        self
    }

    /// Returns whether the record satisfies the selection criteria.
    ///
    /// Pagination is not considered.
    #[must_use]
    pub fn matches(&self, record: &MigrationRecord) -> bool {
        self.action.is_none_or(|action| record.action() == action)
            && self.status.is_none_or(|status| record.status() == status)
            && self
                .created_from
                .is_none_or(|from| record.created_at() >= from)
            && self
                .created_until
                .is_none_or(|until| record.created_at() < until)
    }
}

/// Flattened record for external report renderers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationReportRow {
    /// Record identifier.
    pub id: String,
    /// Action name.
    pub action: &'static str,
    /// Status name.
    pub status: &'static str,
    /// Linked course, if any.
    pub course_id: Option<u64>,
    /// Destination category, if any.
    pub destination_category_id: Option<u64>,
    /// Archive filename, if any.
    pub filename: Option<String>,
    /// Failure text, if any.
    pub error: Option<String>,
    /// Executions started.
    pub attempts: u32,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Latest modification timestamp.
    pub modified_at: DateTime<Utc>,
}

impl From<&MigrationRecord> for MigrationReportRow {
    fn from(record: &MigrationRecord) -> Self {
        Self {
            id: record.id().to_string(),
            action: record.action().as_str(),
            status: record.status().as_str(),
            course_id: record.course_id().map(u64::from),
            destination_category_id: record.destination_category_id().map(u64::from),
            filename: record.filename().map(|name| name.as_str().to_owned()),
            error: record.error().map(str::to_owned),
            attempts: record.attempts(),
            created_at: record.created_at(),
            modified_at: record.modified_at(),
        }
    }
}
