//! Diesel row models for migration record persistence.

use super::schema::course_migrations;
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Query result row for migration records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = course_migrations)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct MigrationRow {
    pub id: uuid::Uuid,
    pub action: String,
    pub status: String,
    pub course_id: Option<i64>,
    pub destination_category_id: Option<i64>,
    pub filename: Option<String>,
    pub error: Option<String>,
    pub attempts: i32,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    pub modified_by: Option<String>,
}

/// Insert model for migration records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = course_migrations)]
pub struct NewMigrationRow {
    pub id: uuid::Uuid,
    pub action: String,
    pub status: String,
    pub course_id: Option<i64>,
    pub destination_category_id: Option<i64>,
    pub filename: Option<String>,
    pub error: Option<String>,
    pub attempts: i32,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    pub modified_by: Option<String>,
}

/// Changeset for updating a migration record.
///
/// `None` clears the column so a released course or a cleared error is
/// persisted.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = course_migrations)]
#[diesel(treat_none_as_null = true)]
pub struct MigrationUpdate {
    pub status: String,
    pub course_id: Option<i64>,
    pub error: Option<String>,
    pub attempts: i32,
    pub modified_at: DateTime<Utc>,
    pub modified_by: Option<String>,
}
