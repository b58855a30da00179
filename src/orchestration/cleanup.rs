//! Course cleanup task: delete a course orphaned by an interrupted restore.

use crate::course::{
    domain::CourseId,
    ports::{CourseHostError, CourseRestore},
};
use crate::scheduler::domain::{CleanupPayload, PayloadError};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

/// Result of a cleanup execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupOutcome {
    /// The course was deleted.
    Deleted(CourseId),
    /// The course was already gone.
    AlreadyGone(CourseId),
}

/// Errors returned by cleanup executions.
#[derive(Debug, Error)]
pub enum CleanupTaskError {
    /// The task payload could not be decoded.
    #[error(transparent)]
    Payload(#[from] PayloadError),

    /// The host failed to delete the course.
    #[error(transparent)]
    Host(#[from] CourseHostError),
}

/// Deletes orphaned courses.
#[derive(Clone)]
pub struct CourseCleanupService<H>
where
    H: CourseRestore,
{
    host: Arc<H>,
}

impl<H> CourseCleanupService<H>
where
    H: CourseRestore,
{
    /// Creates a new cleanup service.
    #[must_use]
    pub const fn new(host: Arc<H>) -> Self {
        Self { host }
    }

    /// Deletes the course named in `data`.
    ///
    /// # Errors
    ///
    /// Returns [`CleanupTaskError::Payload`] for malformed data and
    /// [`CleanupTaskError::Host`] when deletion fails for a reason other
    /// than the course being absent.
    pub async fn execute(&self, data: &Value) -> Result<CleanupOutcome, CleanupTaskError> {
        let payload: CleanupPayload = serde_json::from_value(data.clone())
            .map_err(|err| PayloadError::Malformed(err.to_string()))?;
        let course_id = payload.course_id;
        match self.host.delete_course(course_id).await {
            Ok(()) => {
                tracing::info!(%course_id, "orphaned course deleted");
                Ok(CleanupOutcome::Deleted(course_id))
            }
            Err(CourseHostError::CourseNotFound(_)) => {
                tracing::debug!(%course_id, "orphaned course already gone");
                Ok(CleanupOutcome::AlreadyGone(course_id))
            }
            Err(err) => Err(err.into()),
        }
    }
}
