//! `PostgreSQL` repository implementation for migration records.

use super::{
    models::{MigrationRow, MigrationUpdate, NewMigrationRow},
    schema::course_migrations,
};
use crate::course::domain::{CategoryId, CourseId};
use crate::migration::{
    domain::{
        MigrationAction, MigrationFilter, MigrationId, MigrationRecord, MigrationStatus,
        PersistedMigrationData,
    },
    ports::{MigrationRepository, MigrationRepositoryError, MigrationRepositoryResult},
};
use crate::storage::domain::ArchiveFilename;
use async_trait::async_trait;
use diesel::pg::{Pg, PgConnection};
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// `PostgreSQL` connection pool type used by migration adapters.
pub type MigrationPgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed migration repository.
#[derive(Debug, Clone)]
pub struct PostgresMigrationRepository {
    pool: MigrationPgPool,
}

impl PostgresMigrationRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: MigrationPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> MigrationRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> MigrationRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(MigrationRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(MigrationRepositoryError::persistence)?
    }
}

#[async_trait]
impl MigrationRepository for PostgresMigrationRepository {
    async fn store(&self, record: &MigrationRecord) -> MigrationRepositoryResult<()> {
        let migration_id = record.id();
        let new_row = to_new_row(record)?;

        self.run_blocking(move |connection| {
            diesel::insert_into(course_migrations::table)
                .values(&new_row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        MigrationRepositoryError::DuplicateMigration(migration_id)
                    }
                    _ => MigrationRepositoryError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn update(&self, record: &MigrationRecord) -> MigrationRepositoryResult<()> {
        let migration_id = record.id();
        let changes = to_update(record)?;

        self.run_blocking(move |connection| {
            let updated = diesel::update(course_migrations::table.find(migration_id.into_inner()))
                .set(&changes)
                .execute(connection)
                .map_err(MigrationRepositoryError::persistence)?;
            if updated == 0 {
                return Err(MigrationRepositoryError::NotFound(migration_id));
            }
            Ok(())
        })
        .await
    }

    async fn find_by_id(&self, id: MigrationId) -> MigrationRepositoryResult<Option<MigrationRecord>> {
        self.run_blocking(move |connection| {
            let row = course_migrations::table
                .find(id.into_inner())
                .select(MigrationRow::as_select())
                .first::<MigrationRow>(connection)
                .optional()
                .map_err(MigrationRepositoryError::persistence)?;
            row.map(row_to_record).transpose()
        })
        .await
    }

    async fn list(&self, filter: &MigrationFilter) -> MigrationRepositoryResult<Vec<MigrationRecord>> {
        let criteria = filter.clone();
        self.run_blocking(move |connection| {
            let offset =
                i64::try_from(criteria.offset).map_err(MigrationRepositoryError::persistence)?;
            let mut query = filtered(&criteria)
                .order((
                    course_migrations::created_at.desc(),
                    course_migrations::id.desc(),
                ))
                .offset(offset);
            if let Some(limit) = criteria.limit {
                let limit = i64::try_from(limit).map_err(MigrationRepositoryError::persistence)?;
                query = query.limit(limit);
            }
            let rows = query
                .select(MigrationRow::as_select())
                .load::<MigrationRow>(connection)
                .map_err(MigrationRepositoryError::persistence)?;
            rows.into_iter().map(row_to_record).collect()
        })
        .await
    }

    async fn count(&self, filter: &MigrationFilter) -> MigrationRepositoryResult<u64> {
        let criteria = filter.clone();
        self.run_blocking(move |connection| {
            let total = filtered(&criteria)
                .count()
                .get_result::<i64>(connection)
                .map_err(MigrationRepositoryError::persistence)?;
            u64::try_from(total).map_err(MigrationRepositoryError::persistence)
        })
        .await
    }
}

/// Builds the `WHERE` clause shared by report listing and counting.
fn filtered(filter: &MigrationFilter) -> course_migrations::BoxedQuery<'static, Pg> {
    let mut query = course_migrations::table.into_boxed();
    if let Some(action) = filter.action {
        query = query.filter(course_migrations::action.eq(action.as_str()));
    }
    if let Some(status) = filter.status {
        query = query.filter(course_migrations::status.eq(status.as_str()));
    }
    if let Some(from) = filter.created_from {
        query = query.filter(course_migrations::created_at.ge(from));
    }
    if let Some(until) = filter.created_until {
        query = query.filter(course_migrations::created_at.lt(until));
    }
    query
}

fn to_db_id(value: u64) -> MigrationRepositoryResult<i64> {
    i64::try_from(value).map_err(MigrationRepositoryError::persistence)
}

fn to_new_row(record: &MigrationRecord) -> MigrationRepositoryResult<NewMigrationRow> {
    Ok(NewMigrationRow {
        id: record.id().into_inner(),
        action: record.action().as_str().to_owned(),
        status: record.status().as_str().to_owned(),
        course_id: record.course_id().map(|id| to_db_id(id.value())).transpose()?,
        destination_category_id: record
            .destination_category_id()
            .map(|id| to_db_id(id.value()))
            .transpose()?,
        filename: record.filename().map(|name| name.as_str().to_owned()),
        error: record.error().map(str::to_owned),
        attempts: i32::try_from(record.attempts())
            .map_err(MigrationRepositoryError::persistence)?,
        created_at: record.created_at(),
        modified_at: record.modified_at(),
        modified_by: record.modified_by().map(str::to_owned),
    })
}

fn to_update(record: &MigrationRecord) -> MigrationRepositoryResult<MigrationUpdate> {
    Ok(MigrationUpdate {
        status: record.status().as_str().to_owned(),
        course_id: record.course_id().map(|id| to_db_id(id.value())).transpose()?,
        error: record.error().map(str::to_owned),
        attempts: i32::try_from(record.attempts())
            .map_err(MigrationRepositoryError::persistence)?,
        modified_at: record.modified_at(),
        modified_by: record.modified_by().map(str::to_owned),
    })
}

fn from_db_id(value: i64) -> MigrationRepositoryResult<u64> {
    u64::try_from(value).map_err(MigrationRepositoryError::persistence)
}

fn row_to_record(row: MigrationRow) -> MigrationRepositoryResult<MigrationRecord> {
    let MigrationRow {
        id,
        action,
        status,
        course_id,
        destination_category_id,
        filename,
        error,
        attempts,
        created_at,
        modified_at,
        modified_by,
    } = row;

    let action =
        MigrationAction::try_from(action.as_str()).map_err(MigrationRepositoryError::persistence)?;
    let status =
        MigrationStatus::try_from(status.as_str()).map_err(MigrationRepositoryError::persistence)?;
    let course_id = course_id
        .map(|value| {
            CourseId::new(from_db_id(value)?).map_err(MigrationRepositoryError::persistence)
        })
        .transpose()?;
    let destination_category_id = destination_category_id
        .map(|value| {
            CategoryId::new(from_db_id(value)?).map_err(MigrationRepositoryError::persistence)
        })
        .transpose()?;
    let filename = filename
        .map(|value| ArchiveFilename::new(value).map_err(MigrationRepositoryError::persistence))
        .transpose()?;
    let attempts = u32::try_from(attempts).map_err(MigrationRepositoryError::persistence)?;

    Ok(MigrationRecord::from_persisted(PersistedMigrationData {
        id: MigrationId::from_uuid(id),
        action,
        status,
        course_id,
        destination_category_id,
        filename,
        error,
        attempts,
        created_at,
        modified_at,
        modified_by,
    }))
}
