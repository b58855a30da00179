//! In-memory host platform for orchestration tests.
//!
//! Archives are small JSON manifests describing the archived course, which
//! is enough to exercise every orchestration path without the real backup
//! engine.

use crate::course::{
    domain::{ArchiveHandle, Category, CategoryId, Course, CourseId},
    ports::{CourseBackup, CourseHostError, CourseHostResult, CourseRestore},
};
use crate::storage::domain::{ArchiveFilename, LocalArtifact};
use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tempfile::TempDir;
use uuid::Uuid;

/// Name of the manifest written into a restore working directory.
pub const ARCHIVE_MANIFEST: &str = "course.json";

const PLACEHOLDER_FULL_NAME: &str = "Course restoration in progress";
const PLACEHOLDER_SHORT_NAME: &str = "in_progress_restore";

/// Thread-safe in-memory host platform.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCourseHost {
    state: Arc<RwLock<InMemoryHostState>>,
}

#[derive(Debug, Default)]
struct InMemoryHostState {
    courses: BTreeMap<CourseId, Course>,
    categories: BTreeMap<CategoryId, Category>,
    last_course_id: u64,
    last_category_id: u64,
    archive_dir: Option<TempDir>,
    backup_failure: Option<String>,
    plan_failure: Option<String>,
    discarded: Vec<ArchiveFilename>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ArchivedCourse {
    full_name: String,
    short_name: String,
}

impl InMemoryCourseHost {
    /// Creates an empty host.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read_state(&self) -> CourseHostResult<RwLockReadGuard<'_, InMemoryHostState>> {
        self.state
            .read()
            .map_err(|err| CourseHostError::runtime(io::Error::other(err.to_string())))
    }

    fn write_state(&self) -> CourseHostResult<RwLockWriteGuard<'_, InMemoryHostState>> {
        self.state
            .write()
            .map_err(|err| CourseHostError::runtime(io::Error::other(err.to_string())))
    }

    /// Creates a category.
    ///
    /// # Errors
    ///
    /// Returns host runtime errors when lock acquisition fails.
    pub fn add_category(&self, name: impl Into<String>) -> CourseHostResult<Category> {
        let mut state = self.write_state()?;
        state.last_category_id += 1;
        let id = CategoryId::new(state.last_category_id).map_err(CourseHostError::runtime)?;
        let category = Category::new(id, name);
        state.categories.insert(id, category.clone());
        Ok(category)
    }

    /// Creates a visible course.
    ///
    /// # Errors
    ///
    /// Returns [`CourseHostError::CategoryNotFound`] when the category does
    /// not exist.
    pub fn add_course(
        &self,
        full_name: impl Into<String>,
        short_name: impl Into<String>,
        category_id: CategoryId,
    ) -> CourseHostResult<Course> {
        let mut state = self.write_state()?;
        if !state.categories.contains_key(&category_id) {
            return Err(CourseHostError::CategoryNotFound(category_id));
        }
        let id = state.next_course_id()?;
        let course = Course {
            id,
            full_name: full_name.into(),
            short_name: short_name.into(),
            category_id,
            visible: true,
        };
        state.courses.insert(id, course.clone());
        Ok(course)
    }

    /// Returns a snapshot of every course.
    ///
    /// # Errors
    ///
    /// Returns host runtime errors when lock acquisition fails.
    pub fn courses(&self) -> CourseHostResult<Vec<Course>> {
        Ok(self.read_state()?.courses.values().cloned().collect())
    }

    /// Returns archives discarded through [`CourseBackup::discard`].
    ///
    /// # Errors
    ///
    /// Returns host runtime errors when lock acquisition fails.
    pub fn discarded_archives(&self) -> CourseHostResult<Vec<ArchiveFilename>> {
        Ok(self.read_state()?.discarded.clone())
    }

    /// Makes every subsequent backup fail with the given detail.
    ///
    /// # Errors
    ///
    /// Returns host runtime errors when lock acquisition fails.
    pub fn fail_backups_with(&self, detail: impl Into<String>) -> CourseHostResult<()> {
        self.write_state()?.backup_failure = Some(detail.into());
        Ok(())
    }

    /// Makes every subsequent restore plan fail with the given detail.
    ///
    /// Passing `None` lets plans succeed again.
    ///
    /// # Errors
    ///
    /// Returns host runtime errors when lock acquisition fails.
    pub fn fail_plans_with(&self, detail: Option<String>) -> CourseHostResult<()> {
        self.write_state()?.plan_failure = detail;
        Ok(())
    }

    fn archive_root(state: &mut InMemoryHostState) -> CourseHostResult<Utf8PathBuf> {
        if state.archive_dir.is_none() {
            let dir = tempfile::Builder::new()
                .prefix("coursemigration-backups-")
                .tempdir()
                .map_err(CourseHostError::runtime)?;
            state.archive_dir = Some(dir);
        }
        let root = state
            .archive_dir
            .as_ref()
            .map(|dir| dir.path().to_path_buf())
            .ok_or_else(|| CourseHostError::runtime(io::Error::other("archive directory unavailable")))?;
        Utf8PathBuf::from_path_buf(root).map_err(|path| {
            CourseHostError::runtime(io::Error::other(format!(
                "archive directory {} is not valid UTF-8",
                path.display()
            )))
        })
    }
}

impl InMemoryHostState {
    fn next_course_id(&mut self) -> CourseHostResult<CourseId> {
        self.last_course_id += 1;
        CourseId::new(self.last_course_id).map_err(CourseHostError::runtime)
    }

    fn unique_short_name(&self, base: &str, exclude: Option<CourseId>) -> String {
        let taken = |candidate: &str| {
            self.courses
                .values()
                .any(|course| Some(course.id) != exclude && course.short_name == candidate)
        };
        if !taken(base) {
            return base.to_owned();
        }
        (1_u32..)
            .map(|suffix| format!("{base}_{suffix}"))
            .find(|candidate| !taken(candidate))
            .unwrap_or_else(|| base.to_owned())
    }

    fn course_mut(&mut self, course_id: CourseId) -> CourseHostResult<&mut Course> {
        self.courses
            .get_mut(&course_id)
            .ok_or(CourseHostError::CourseNotFound(course_id))
    }
}

fn open_working_dir(working_dir: &Utf8Path) -> CourseHostResult<Dir> {
    Dir::open_ambient_dir(working_dir, ambient_authority()).map_err(CourseHostError::runtime)
}

fn read_manifest(working_dir: &Utf8Path) -> Result<ArchivedCourse, String> {
    let dir = open_working_dir(working_dir).map_err(|err| err.to_string())?;
    let raw = dir
        .read_to_string(ARCHIVE_MANIFEST)
        .map_err(|err| format!("missing {ARCHIVE_MANIFEST}: {err}"))?;
    serde_json::from_str(&raw).map_err(|err| format!("malformed {ARCHIVE_MANIFEST}: {err}"))
}

#[async_trait]
impl CourseBackup for InMemoryCourseHost {
    async fn backup(&self, course_id: CourseId) -> CourseHostResult<ArchiveHandle> {
        let mut state = self.write_state()?;
        if let Some(detail) = &state.backup_failure {
            return Err(CourseHostError::Backup(detail.clone()));
        }
        let course = state
            .courses
            .get(&course_id)
            .cloned()
            .ok_or(CourseHostError::CourseNotFound(course_id))?;

        let manifest = serde_json::to_vec(&ArchivedCourse {
            full_name: course.full_name,
            short_name: course.short_name,
        })
        .map_err(CourseHostError::runtime)?;

        let name = format!(
            "backup-moodle2-course-{course_id}-{}.mbz",
            Uuid::new_v4().simple()
        );
        let filename = ArchiveFilename::new(name).map_err(CourseHostError::runtime)?;
        let root = Self::archive_root(&mut state)?;
        open_working_dir(&root)?
            .write(filename.as_str(), manifest)
            .map_err(CourseHostError::runtime)?;

        let artifact = LocalArtifact::new(root.join(filename.as_str()));
        Ok(ArchiveHandle::new(filename, artifact))
    }

    async fn discard(&self, archive: &ArchiveHandle) -> CourseHostResult<()> {
        archive.artifact().delete().map_err(CourseHostError::runtime)?;
        self.write_state()?.discarded.push(archive.filename().clone());
        Ok(())
    }
}

#[async_trait]
impl CourseRestore for InMemoryCourseHost {
    async fn find_category(&self, category_id: CategoryId) -> CourseHostResult<Option<Category>> {
        Ok(self.read_state()?.categories.get(&category_id).cloned())
    }

    async fn find_course(&self, course_id: CourseId) -> CourseHostResult<Option<Course>> {
        Ok(self.read_state()?.courses.get(&course_id).cloned())
    }

    async fn extract_archive(
        &self,
        artifact: &LocalArtifact,
        working_dir: &Utf8Path,
    ) -> CourseHostResult<()> {
        let content = artifact
            .read()
            .map_err(|err| CourseHostError::Extraction(err.to_string()))?;
        serde_json::from_slice::<ArchivedCourse>(&content)
            .map_err(|err| CourseHostError::Extraction(format!("not a course archive: {err}")))?;
        open_working_dir(working_dir)?
            .write(ARCHIVE_MANIFEST, content)
            .map_err(|err| CourseHostError::Extraction(err.to_string()))
    }

    async fn create_course_shell(&self, category_id: CategoryId) -> CourseHostResult<CourseId> {
        let mut state = self.write_state()?;
        if !state.categories.contains_key(&category_id) {
            return Err(CourseHostError::CategoryNotFound(category_id));
        }
        let id = state.next_course_id()?;
        let short_name = state.unique_short_name(PLACEHOLDER_SHORT_NAME, None);
        state.courses.insert(
            id,
            Course {
                id,
                full_name: PLACEHOLDER_FULL_NAME.to_owned(),
                short_name,
                category_id,
                visible: true,
            },
        );
        Ok(id)
    }

    async fn execute_precheck(
        &self,
        working_dir: &Utf8Path,
        course_id: CourseId,
    ) -> CourseHostResult<()> {
        read_manifest(working_dir).map_err(CourseHostError::Precheck)?;
        let state = self.read_state()?;
        if !state.courses.contains_key(&course_id) {
            return Err(CourseHostError::CourseNotFound(course_id));
        }
        Ok(())
    }

    async fn execute_plan(&self, working_dir: &Utf8Path, course_id: CourseId) -> CourseHostResult<()> {
        let manifest = read_manifest(working_dir).map_err(CourseHostError::Restore)?;
        let mut state = self.write_state()?;
        if let Some(detail) = &state.plan_failure {
            return Err(CourseHostError::Restore(detail.clone()));
        }
        let short_name = state.unique_short_name(&manifest.short_name, Some(course_id));
        let course = state.course_mut(course_id)?;
        course.full_name = manifest.full_name;
        course.short_name = short_name;
        Ok(())
    }

    async fn hide_course(&self, course_id: CourseId) -> CourseHostResult<()> {
        self.write_state()?.course_mut(course_id)?.visible = false;
        Ok(())
    }

    async fn delete_course(&self, course_id: CourseId) -> CourseHostResult<()> {
        self.write_state()?
            .courses
            .remove(&course_id)
            .map(|_| ())
            .ok_or(CourseHostError::CourseNotFound(course_id))
    }
}
