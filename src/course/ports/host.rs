//! Backup and restore capabilities exposed by the host platform.

use crate::course::domain::{ArchiveHandle, Category, CategoryId, Course, CourseId};
use crate::storage::domain::LocalArtifact;
use async_trait::async_trait;
use camino::Utf8Path;
use std::sync::Arc;
use thiserror::Error;

/// Result type for host course operations.
pub type CourseHostResult<T> = Result<T, CourseHostError>;

/// Produces portable archives of existing courses.
#[async_trait]
pub trait CourseBackup: Send + Sync {
    /// Produces an archive of the course.
    async fn backup(&self, course_id: CourseId) -> CourseHostResult<ArchiveHandle>;

    /// Discards the local copy of an archive produced by
    /// [`CourseBackup::backup`].
    async fn discard(&self, archive: &ArchiveHandle) -> CourseHostResult<()>;
}

/// Materializes archives into new courses.
///
/// A restore runs as sequential sub-steps so the caller can record the new
/// course identifier before the long-running plan executes.
#[async_trait]
pub trait CourseRestore: Send + Sync {
    /// Looks up a course category.
    async fn find_category(&self, category_id: CategoryId) -> CourseHostResult<Option<Category>>;

    /// Looks up a course.
    async fn find_course(&self, course_id: CourseId) -> CourseHostResult<Option<Course>>;

    /// Extracts archive content into a working directory.
    async fn extract_archive(
        &self,
        artifact: &LocalArtifact,
        working_dir: &Utf8Path,
    ) -> CourseHostResult<()>;

    /// Creates an empty course with autogenerated placeholder names.
    async fn create_course_shell(&self, category_id: CategoryId) -> CourseHostResult<CourseId>;

    /// Validates extracted content against the target course.
    async fn execute_precheck(&self, working_dir: &Utf8Path, course_id: CourseId)
    -> CourseHostResult<()>;

    /// Restores extracted content into the target course.
    async fn execute_plan(&self, working_dir: &Utf8Path, course_id: CourseId)
    -> CourseHostResult<()>;

    /// Hides a course from learners.
    async fn hide_course(&self, course_id: CourseId) -> CourseHostResult<()>;

    /// Deletes a course.
    async fn delete_course(&self, course_id: CourseId) -> CourseHostResult<()>;

    /// Restores extracted content into a new course in one call.
    ///
    /// # Errors
    ///
    /// Returns the first failing sub-step's error. A course created before
    /// the failure is left in place for the caller to clean up.
    async fn restore(
        &self,
        working_dir: &Utf8Path,
        category_id: CategoryId,
    ) -> CourseHostResult<CourseId> {
        let course_id = self.create_course_shell(category_id).await?;
        self.execute_precheck(working_dir, course_id).await?;
        self.execute_plan(working_dir, course_id).await?;
        Ok(course_id)
    }
}

/// Errors returned by host course adapters.
#[derive(Debug, Clone, Error)]
pub enum CourseHostError {
    /// The course does not exist.
    #[error("course {0} not found")]
    CourseNotFound(CourseId),

    /// The category does not exist.
    #[error("category {0} not found")]
    CategoryNotFound(CategoryId),

    /// Producing the archive failed.
    #[error("backup failed: {0}")]
    Backup(String),

    /// The archive could not be extracted.
    #[error("archive extraction failed: {0}")]
    Extraction(String),

    /// The restore precheck reported blocking problems.
    #[error("restore precheck failed: {0}")]
    Precheck(String),

    /// Executing the restore plan failed.
    #[error("restore failed: {0}")]
    Restore(String),

    /// Generic host failure.
    #[error("course host error: {0}")]
    Runtime(Arc<dyn std::error::Error + Send + Sync>),
}

impl CourseHostError {
    /// Wraps a runtime error from the host adapter.
    pub fn runtime(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Runtime(Arc::new(err))
    }
}
