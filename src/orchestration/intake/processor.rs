//! Row-by-row processing of an intake file.

use super::{IntakeDelimiter, IntakeFile, IntakeFileError, IntakeRow, IntakeSummary};
use crate::course::{
    domain::{CategoryId, CourseId},
    ports::CourseBackup,
};
use crate::migration::{
    domain::{MigrationAction, MigrationRecord},
    ports::MigrationRepository,
};
use crate::orchestration::{BackupRequest, BackupTaskService, OrchestrationContext};
use mockable::Clock;
use reqwest::Url;
use std::sync::Arc;
use thiserror::Error;

/// Whole-batch intake errors. No row is processed when one is returned.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IntakeError {
    /// The file itself is unusable.
    #[error(transparent)]
    File(#[from] IntakeFileError),

    /// No storage backend is selected.
    #[error("A storage class has not been configured")]
    StorageNotConfigured,

    /// The selected backend cannot accept pushes.
    #[error("Selected storage is not ready for push")]
    StorageNotReadyForPush,
}

/// A row that passed validation.
struct ValidRow {
    course_id: CourseId,
    category_id: CategoryId,
}

/// A row that failed validation, with whatever could be salvaged for the
/// audit record.
struct InvalidRow {
    course_id: Option<CourseId>,
    category_id: Option<CategoryId>,
    message: String,
}

/// Turns a delimited course list into backup executions.
pub struct BulkIntakeProcessor<R, H, C>
where
    R: MigrationRepository,
    H: CourseBackup,
    C: Clock + Send + Sync,
{
    backups: BackupTaskService<R, H, C>,
    repository: Arc<R>,
    context: OrchestrationContext,
    clock: Arc<C>,
}

impl<R, H, C> BulkIntakeProcessor<R, H, C>
where
    R: MigrationRepository,
    H: CourseBackup,
    C: Clock + Send + Sync,
{
    /// Creates a processor that runs each valid row through `backups`.
    #[must_use]
    pub const fn new(
        backups: BackupTaskService<R, H, C>,
        repository: Arc<R>,
        context: OrchestrationContext,
        clock: Arc<C>,
    ) -> Self {
        Self {
            backups,
            repository,
            context,
            clock,
        }
    }

    /// Processes every data row of `content`.
    ///
    /// Valid rows run a backup; invalid rows are recorded as `Invalid`
    /// backup records. Earlier rows are never undone by later failures.
    ///
    /// # Errors
    ///
    /// Returns [`IntakeError`] when storage cannot accept pushes or the file
    /// is unusable as a whole.
    #[tracing::instrument(name = "bulk_intake", skip(self, content))]
    pub async fn process(
        &self,
        content: &str,
        delimiter: IntakeDelimiter,
    ) -> Result<IntakeSummary, IntakeError> {
        let storage = self
            .context
            .storage()
            .ok_or(IntakeError::StorageNotConfigured)?;
        if !storage.ready_for_push() {
            return Err(IntakeError::StorageNotReadyForPush);
        }

        let file = IntakeFile::parse(content, delimiter)?;
        let mut summary = IntakeSummary {
            total: file.rows().len(),
            ..IntakeSummary::default()
        };

        for row in file.rows() {
            match self.validate(row) {
                Ok(valid) => self.run_backup(row.line, valid, &mut summary).await,
                Err(invalid) => self.record_invalid(row.line, invalid, &mut summary).await,
            }
        }

        tracing::info!(
            total = summary.total,
            succeeded = summary.succeeded,
            failed = summary.failed,
            malformed = summary.malformed,
            "bulk intake finished"
        );
        Ok(summary)
    }

    fn validate(&self, row: &IntakeRow) -> Result<ValidRow, InvalidRow> {
        let course = resolve_course(row);
        let category = match row.category_id.as_deref() {
            Some(raw) => parse_category(raw),
            None => self
                .context
                .config
                .default_destination_category
                .ok_or_else(|| "missing destination category id".to_owned()),
        };

        match (course, category) {
            (Ok(course_id), Ok(category_id)) => Ok(ValidRow {
                course_id,
                category_id,
            }),
            (course, category) => {
                let message = [course.as_ref().err(), category.as_ref().err()]
                    .into_iter()
                    .flatten()
                    .cloned()
                    .collect::<Vec<_>>()
                    .join("; ");
                Err(InvalidRow {
                    course_id: course.ok(),
                    category_id: category.ok(),
                    message,
                })
            }
        }
    }

    async fn run_backup(&self, line: usize, row: ValidRow, summary: &mut IntakeSummary) {
        let request = BackupRequest::new(row.course_id, row.category_id);
        match self.backups.execute(request).await {
            Ok(outcome) => {
                summary.succeeded += 1;
                summary.migrations.push(outcome.migration_id);
            }
            Err(err) => {
                tracing::warn!(line, course_id = %row.course_id, error = %err, "intake row failed");
                summary.failed += 1;
                summary
                    .errors
                    .push(format!("Row {line}: course {}: {err}", row.course_id));
            }
        }
    }

    async fn record_invalid(&self, line: usize, row: InvalidRow, summary: &mut IntakeSummary) {
        tracing::warn!(line, error = %row.message, "intake row rejected");
        summary.malformed += 1;
        summary.errors.push(format!("Row {line}: {}", row.message));

        let record = MigrationRecord::new_invalid(
            MigrationAction::Backup,
            row.course_id,
            row.category_id,
            row.message,
            &*self.clock,
        );
        if let Err(err) = self.repository.store(&record).await {
            tracing::error!(line, error = %err, "failed to store invalid intake row");
        }
    }
}

fn resolve_course(row: &IntakeRow) -> Result<CourseId, String> {
    match (row.course_id.as_deref(), row.course_url.as_deref()) {
        (Some(raw), _) => parse_course(raw),
        (None, Some(url)) => course_from_url(url),
        (None, None) => Err("missing course id".to_owned()),
    }
}

fn parse_course(raw: &str) -> Result<CourseId, String> {
    raw.parse::<u64>()
        .ok()
        .and_then(|value| CourseId::new(value).ok())
        .ok_or_else(|| format!("invalid course id '{raw}'"))
}

fn parse_category(raw: &str) -> Result<CategoryId, String> {
    raw.parse::<u64>()
        .ok()
        .and_then(|value| CategoryId::new(value).ok())
        .ok_or_else(|| format!("invalid destination category id '{raw}'"))
}

/// Extracts the course from the `id` query parameter of a course URL.
fn course_from_url(raw: &str) -> Result<CourseId, String> {
    let url = Url::parse(raw).map_err(|_| format!("invalid course url '{raw}'"))?;
    let id = url
        .query_pairs()
        .find(|(key, _)| key == "id")
        .map(|(_, value)| value.into_owned())
        .ok_or_else(|| format!("course url '{raw}' has no id parameter"))?;
    parse_course(&id)
}
